//! Media type parsing and content negotiation.
//!
//! A [`MediaType`] follows the grammar
//! `type "/" [tree "."] subtype ["+" suffix] *(";" parameter)`.
//!
//! Negotiation starts from the representation a route can produce (including
//! the parameters it supports, such as `odata.metadata`) and narrows it
//! against a client `Accept` value:
//!
//! ```rust
//! use odata_server::media_type::MediaType;
//!
//! let produced: MediaType = "application/json;odata.metadata=minimal".parse().unwrap();
//! let negotiated = produced
//!     .negotiate("application/json;odata.metadata=full;q=0.9, text/plain;q=0.5")
//!     .unwrap();
//! assert_eq!(negotiated.to_string(), "application/json;odata.metadata=full");
//! ```

mod parameter;

pub use parameter::Parameters;

use crate::error::{ODataError, ODataResult};
use log::debug;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Default representation for JSON responses
pub const ODATA_JSON: &str =
    "application/json;odata.metadata=minimal;odata.streaming=true;IEEE754Compatible=false;charset=utf-8";

/// Parameters a client may request; anything else makes a candidate unusable
pub const RECOGNISED_PARAMETERS: [&str; 5] = [
    "IEEE754Compatible",
    "odata.metadata",
    "odata.streaming",
    "charset",
    "q",
];

/// One parsed `Accept` / `Content-Type` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    original: String,
    kind: String,
    tree: Option<String>,
    subtype: String,
    suffix: Option<String>,
    parameters: Parameters,
}

impl MediaType {
    /// The JSON representation produced by default
    pub fn odata_json() -> Self {
        Self::parse_lenient(ODATA_JSON)
    }

    /// The token as it was supplied
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The top level type, e.g. `application`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn tree(&self) -> Option<&str> {
        self.tree.as_deref()
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key)
    }

    pub fn parameter_keys(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys()
    }

    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.set(key, value);
        self
    }

    #[must_use]
    pub fn without_parameter(mut self, key: &str) -> Self {
        self.parameters.remove(key);
        self
    }

    /// `type/[tree.]subtype[+suffix]` without parameters
    pub fn essence(&self) -> String {
        let mut essence = format!("{}/", self.kind);
        if let Some(tree) = &self.tree {
            essence.push_str(tree);
            essence.push('.');
        }
        essence.push_str(&self.subtype);
        if let Some(suffix) = &self.suffix {
            essence.push('+');
            essence.push_str(suffix);
        }
        essence
    }

    pub fn is_json(&self) -> bool {
        self.subtype == "json" || self.suffix.as_deref() == Some("json")
    }

    /// The `q` parameter; absent or unparseable values have no quality
    pub fn quality(&self) -> Option<f64> {
        self.parameter("q")
            .and_then(|q| q.trim().parse::<f64>().ok())
            .filter(|q| q.is_finite())
    }

    /// Narrow this media type against a comma separated list of requested
    /// types.
    ///
    /// Candidates are tried in descending `q` order (candidates without `q`
    /// rank below any that carry one, ties keep their original order). A
    /// candidate is skipped if it uses parameters outside
    /// [`RECOGNISED_PARAMETERS`] or if its subtype is neither `*` nor ours.
    /// The first survivor decides the value of each of our parameters;
    /// parameters the candidate does not carry are dropped.
    ///
    /// # Errors
    ///
    /// `NotAcceptable("unsupported_content_type")` when no candidate survives.
    pub fn negotiate(mut self, requested: &str) -> ODataResult<Self> {
        let mut candidates: Vec<MediaType> = requested
            .split(',')
            .filter(|token| !token.trim().is_empty())
            .filter_map(|token| match token.parse::<MediaType>() {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!("Skipping unparseable media type '{}': {}", token.trim(), e);
                    None
                }
            })
            .collect();

        // stable: equal qualities keep request order
        candidates.sort_by(|a, b| {
            b.quality()
                .partial_cmp(&a.quality())
                .unwrap_or(Ordering::Equal)
        });

        let chosen = candidates.into_iter().find(|candidate| {
            candidate
                .parameter_keys()
                .all(|key| RECOGNISED_PARAMETERS.contains(&key))
                && (candidate.subtype == "*" || candidate.subtype == self.subtype)
        });

        let Some(chosen) = chosen else {
            return Err(ODataError::not_acceptable(
                "unsupported_content_type",
                "This route does not support the requested content type, unsupported parameters may have been supplied",
            ));
        };

        let keys: Vec<String> = self.parameter_keys().map(str::to_string).collect();
        for key in keys {
            match chosen.parameter(&key).filter(|value| !value.is_empty()) {
                Some(value) => self.parameters.set(&key, value),
                None => self.parameters.remove(&key),
            }
        }

        debug!("Negotiated media type '{}' from '{}'", self, requested);
        Ok(self)
    }

    fn parse_lenient(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| Self {
            original: text.to_string(),
            kind: "*".to_string(),
            tree: None,
            subtype: "*".to_string(),
            suffix: None,
            parameters: Parameters::new(),
        })
    }
}

fn is_token(text: &str, extra: &[char]) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || extra.contains(&c))
}

impl FromStr for MediaType {
    type Err = ODataError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ODataError::bad_request(
                "invalid_media_type",
                format!("'{}' is not a valid media type", text.trim()),
            )
        };

        let (essence, parameters) = text.split_once(';').unwrap_or((text, ""));
        let (kind, rest) = essence.trim().split_once('/').ok_or_else(invalid)?;
        let (subtype, suffix) = match rest.split_once('+') {
            Some((subtype, suffix)) => (subtype, Some(suffix)),
            None => (rest, None),
        };

        let (tree, subtype) = match subtype.split_once('.') {
            Some((tree, remainder)) if is_token(tree, &[]) && !remainder.is_empty() => {
                (Some(tree), remainder)
            }
            _ => (None, subtype),
        };

        if !is_token(kind, &['*', '-'])
            || !is_token(subtype, &['*', '-', '.'])
            || suffix.is_some_and(|suffix| !is_token(suffix, &['-', '.']))
        {
            return Err(invalid());
        }

        Ok(Self {
            original: text.to_string(),
            kind: kind.to_string(),
            tree: tree.map(str::to_string),
            subtype: subtype.to_string(),
            suffix: suffix.map(str::to_string),
            parameters: Parameters::parse(parameters),
        })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence())?;
        if !self.parameters.is_empty() {
            write!(f, ";{}", self.parameters)?;
        }
        Ok(())
    }
}
