//! Property tests for media type parsing and negotiation.

use odata_server::media_type::{MediaType, ODATA_JSON};
use proptest::prelude::*;

fn token() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

fn parameters() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::btree_map(token(), "[a-z0-9]{1,6}", 0..4)
        .prop_map(|map| map.into_iter().collect())
}

fn media_type_text() -> impl Strategy<Value = String> {
    (token(), token(), proptest::option::of(token()), parameters()).prop_map(
        |(kind, subtype, suffix, parameters)| {
            let mut text = format!("{kind}/{subtype}");
            if let Some(suffix) = suffix {
                text.push('+');
                text.push_str(&suffix);
            }
            for (key, value) in parameters {
                text.push_str(&format!(";{key}={value}"));
            }
            text
        },
    )
}

fn metadata_level() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("minimal"), Just("full"), Just("none")]
}

proptest! {
    #[test]
    fn test_parse_display_round_trip(text in media_type_text()) {
        let parsed: MediaType = text.parse().unwrap();
        prop_assert_eq!(parsed.to_string(), text.clone());

        let reparsed: MediaType = parsed.to_string().parse().unwrap();
        prop_assert_eq!(reparsed.parameters(), parsed.parameters());
    }

    #[test]
    fn test_negotiation_is_idempotent(
        level in metadata_level(),
        low in 1u8..5,
        high in 5u8..10,
    ) {
        let accept = format!(
            "application/json;odata.metadata=full;q=0.{low}, application/json;odata.metadata={level};q=0.{high}, */*"
        );

        let produced: MediaType = ODATA_JSON.parse().unwrap();
        let once = produced.negotiate(&accept).unwrap();
        let twice = once.clone().negotiate(&accept).unwrap();

        prop_assert_eq!(once.parameters(), twice.parameters());
        prop_assert_eq!(once.parameter("odata.metadata"), Some(level));
    }

    #[test]
    fn test_absent_quality_never_outranks_present(level in metadata_level()) {
        let accept = format!("application/json;odata.metadata=full, application/json;odata.metadata={level};q=0.1");

        let produced: MediaType = ODATA_JSON.parse().unwrap();
        let negotiated = produced.negotiate(&accept).unwrap();

        prop_assert_eq!(negotiated.parameter("odata.metadata"), Some(level));
    }
}
