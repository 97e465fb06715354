//! Action and function contracts.

use crate::common::{SERVICE_ROOT, catalog_builder, error_code, get, post, post_json, request, service};
use http::{Method, StatusCode};
use odata_server::operation::{CallableReturn, OperationTemplate};
use odata_server::primitive::{Primitive, PrimitiveType};
use odata_server::service::ServiceBuilder;
use serde_json::json;

#[tokio::test]
async fn test_function_returning_null_is_an_error() {
    let service = service();

    let response = get(&service, "nullfn()").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&response), "missing_function_result");
}

#[tokio::test]
async fn test_methods_are_checked_before_arguments() {
    let service = service();

    // aadd has a required argument; the method check wins
    let response = get(&service, "aadd()").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_code(&response), "invalid_method");

    let response = post(&service, "add()").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.json().unwrap()["error"]["message"],
        json!("This operation must be addressed with a GET request")
    );
}

#[tokio::test]
async fn test_non_nullable_action_returning_null() {
    let service = service();

    let response = post(&service, "aa2").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&response), "invalid_null_returned");
}

#[tokio::test]
async fn test_void_action_has_no_content() {
    let service = service();

    let response = post(&service, "aa1()").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.json().is_none());
    assert_eq!(response.header("odata-version"), Some("4.01"));
}

#[tokio::test]
async fn test_return_minimal_preference() {
    let service = service();
    let http_request = request(Method::POST, "textv1()")
        .header("prefer", "return=minimal")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.header("Preference-Applied"), Some("return=minimal"));
}

#[tokio::test]
async fn test_action_result() {
    let service = service();

    let response = post(&service, "textv1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["value"], json!("hello"));
    assert!(response.header("Preference-Applied").is_none());
}

#[tokio::test]
async fn test_action_body_must_be_json() {
    let service = service();

    let untyped = request(Method::POST, "aadd")
        .body(b"[d".to_vec())
        .unwrap();
    let response = service.handle(untyped).await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(error_code(&response), "not_json");

    let response = post_json(&service, "aadd", "[d").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_json");

    let response = post_json(&service, "aadd", "[1, 2]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_action_arguments");
}

#[tokio::test]
async fn test_action_arguments_from_body() {
    let service = service();

    let response = post_json(&service, "aadd", r#"{"a": 1, "b": 2}"#).await;
    assert_eq!(response.json().unwrap()["value"], json!(3));

    let response = post_json(&service, "aadd", r#"{"a": 1}"#).await;
    assert_eq!(response.json().unwrap()["value"], json!(1));

    let response = post_json(&service, "aadd", r#"{"a": "one"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_argument_type");

    let response = post_json(&service, "aadd", r#"{"b": 1}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "non_null_argument_missing");
}

#[tokio::test]
async fn test_action_with_entity_and_transaction() {
    let service = service();

    let response = post_json(
        &service,
        "acreate",
        r#"{"airport": {"code": "jfk", "name": "John F. Kennedy"}}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response.json().unwrap();
    assert_eq!(body["code"], json!("jfk"));
    assert_eq!(
        body["@odata.context"],
        json!("http://localhost/odata/$metadata#airport/$entity")
    );

    let response = post_json(&service, "acreate", r#"{"airport": {"runways": 4}}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "invalid_property");
}

#[tokio::test]
async fn test_entity_return_type_is_enforced() {
    let service = service();

    let response = get(&service, "fairport(code='jfk')").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().unwrap()["code"], json!("jfk"));

    let response = get(&service, "fwrongtype()").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&response), "invalid_entity_type_returned");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let service = service();
    let http_request = request(Method::GET, "identity(i=4)")
        .header("x-request-id", "trace-42")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.request_id(), "trace-42");
    let http = response.into_http().unwrap();
    assert_eq!(http.headers()["x-request-id"], "trace-42");
}

#[tokio::test]
async fn test_binding_parameter_must_name_a_callable_parameter() {
    let unbindable = OperationTemplate::function("funbound")
        .binding_parameter("x")
        .returns(CallableReturn::primitive(PrimitiveType::String))
        .callable(|_| Ok(Some(Primitive::from("unreachable").into())))
        .build()
        .unwrap();
    let service = ServiceBuilder::new()
        .with_service_root(SERVICE_ROOT)
        .with_catalog(catalog_builder().add_operation(unbindable).build().unwrap())
        .build()
        .unwrap();

    let response = get(&service, "identity(i=1)/funbound").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&response), "missing_callable_binding_parameter");
}
