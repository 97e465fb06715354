//! Path composition: each segment consumes the value of the previous one.

use crate::common::{error_code, get, init_logging, post, service};
use http::StatusCode;
use odata_server::service::ResponseBody;
use serde_json::json;

#[tokio::test]
async fn test_bound_function_chain_increments_twice() {
    init_logging();
    let service = service();

    let response = get(&service, "identity(i=1)/increment/increment").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!(3));
}

#[tokio::test]
async fn test_native_value_chain() {
    let service = service();

    let response = get(&service, "ident(i=1)/incr").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json().unwrap();
    assert_eq!(body["value"], json!(2));
    assert_eq!(
        body["@odata.context"],
        json!("http://localhost/odata/$metadata#Edm.Int64")
    );
}

#[tokio::test]
async fn test_action_cannot_be_composed() {
    let service = service();

    let response = post(&service, "textv1()/$value").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "cannot_compose_action");
}

#[tokio::test]
async fn test_inline_parameter_beats_query_parameter() {
    let service = service();

    let response = get(&service, "add(a=3,b=1)?a=7").await;
    assert_eq!(response.json().unwrap()["value"], json!(4));

    let response = get(&service, "add(b=1)?a=7").await;
    assert_eq!(response.json().unwrap()["value"], json!(8));

    // @name is preferred over the bare name
    let response = get(&service, "add(b=1)?a=7&@a=2").await;
    assert_eq!(response.json().unwrap()["value"], json!(3));
}

#[tokio::test]
async fn test_parameter_aliases() {
    let service = service();

    let response = get(&service, "add(a=@x,b=@y)?@x=1&@y=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!(3));

    let response = get(&service, "add(a=@x,b=1)").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "non_null_argument_missing");
}

#[tokio::test]
async fn test_implicit_aliases_for_system_option_names() {
    let service = service();

    let response = get(&service, "fapply()?@apply='a'&@compute='b'").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!("ab"));

    // bare names that collide with system query options are not aliases
    let response = get(&service, "fapply()?@apply='a'&compute='b'").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "non_null_argument_missing");
}

#[tokio::test]
async fn test_implicit_aliases_only_apply_to_last_segment() {
    let service = service();

    let response = get(&service, "identity/increment?i=5").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "non_null_argument_missing");
}

#[tokio::test]
async fn test_bound_property_value() {
    let service = service();

    let response = get(&service, "flights(1)/origin/ffb1()").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!("LHR"));
}

#[tokio::test]
async fn test_bound_entity() {
    let service = service();

    let response = get(&service, "flights(1)/fdest()").await;
    assert_eq!(response.json().unwrap()["value"], json!("sfo"));

    let response = get(&service, "flights(id=2)/fdest").await;
    assert_eq!(response.json().unwrap()["value"], json!("rgr"));
}

#[tokio::test]
async fn test_bound_entity_set() {
    let service = service();

    let response = get(&service, "flights/fset()").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!("flights"));
}

#[tokio::test]
async fn test_entity_set_argument() {
    let service = service();

    let response = get(&service, "ffn1()").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json().unwrap();
    assert_eq!(body["value"].as_array().unwrap().len(), 3);
    assert_eq!(body["value"][0]["origin"], json!("lhr"));
    assert_eq!(
        body["@odata.context"],
        json!("http://localhost/odata/$metadata#flights")
    );
}

#[tokio::test]
async fn test_bound_argument_errors() {
    let service = service();

    let response = get(&service, "increment()").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "missing_bound_argument");

    let response = get(&service, "flights(1)/increment").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_bound_argument_type");
}

#[tokio::test]
async fn test_invalid_inline_arguments() {
    let service = service();

    let response = get(&service, "add(a=1,,b=2)").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_arguments");

    let response = get(&service, "add(a='one',b=2)").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_argument_type");
}

#[tokio::test]
async fn test_entities_and_properties() {
    let service = service();

    let response = get(&service, "flights(1)").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json().unwrap();
    assert_eq!(body["destination"], json!("sfo"));
    assert_eq!(
        body["@odata.context"],
        json!("http://localhost/odata/$metadata#flight/$entity")
    );

    let response = get(&service, "airports('lhr')/name").await;
    assert_eq!(response.json().unwrap()["value"], json!("Heathrow"));

    let response = get(&service, "flights(99)").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "entity_not_found");
}

#[tokio::test]
async fn test_raw_value() {
    let service = service();

    let response = get(&service, "flights(1)/origin/$value").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), Some("lhr"));
    assert_eq!(response.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_raw_key_value() {
    let service = service();

    let response = get(&service, "flights(1)/id/$value").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), Some("1"));
}

#[tokio::test]
async fn test_null_raw_value_has_no_content() {
    let service = service();

    let response = get(&service, "flights(3)/origin/$value").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.body(), &ResponseBody::Empty);
    assert_eq!(response.content_type(), None);
}

#[tokio::test]
async fn test_unresolvable_segments() {
    let service = service();

    let response = get(&service, "runways").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "no_handler");

    let response = get(&service, "flights(1)/runway").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "no_handler");
}
