//! Response media type selection.

use crate::common::{error_code, get, request, service};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_default_content_type() {
    let service = service();

    let response = get(&service, "identity(i=1)").await;

    assert_eq!(
        response.content_type(),
        Some("application/json;odata.metadata=minimal;odata.streaming=true;IEEE754Compatible=false;charset=utf-8")
    );
}

#[tokio::test]
async fn test_format_beats_accept() {
    let service = service();
    let http_request = request(Method::GET, "identity(i=1)?$format=json")
        .header("accept", "application/xml")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json"));
}

#[tokio::test]
async fn test_unsupported_accept() {
    let service = service();
    let http_request = request(Method::GET, "identity(i=1)")
        .header("accept", "application/xml")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(error_code(&response), "unsupported_content_type");
}

#[tokio::test]
async fn test_quality_ordering_and_metadata_none() {
    let service = service();
    let http_request = request(Method::GET, "identity(i=1)")
        .header(
            "accept",
            "application/json;odata.metadata=full;q=0.5, application/json;odata.metadata=none;q=0.9",
        )
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.content_type(), Some("application/json;odata.metadata=none"));
    assert_eq!(response.json().unwrap(), &json!({"value": 1}));
}

#[tokio::test]
async fn test_service_document() {
    let service = service();

    let response = get(&service, "").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json().unwrap();
    assert_eq!(body["@odata.context"], json!("http://localhost/odata/$metadata"));
    let resources = body["value"].as_array().unwrap();
    assert!(resources.contains(&json!({"name": "flights", "kind": "EntitySet", "url": "flights"})));
    assert!(resources.contains(&json!({"name": "identity", "kind": "FunctionImport", "url": "identity"})));
    // actions and bound functions are not listed
    assert!(!resources.iter().any(|resource| resource["name"] == "textv1"));
    assert!(!resources.iter().any(|resource| resource["name"] == "increment"));
}

#[tokio::test]
async fn test_raw_value_as_octets_from_accept() {
    let service = service();
    let http_request = request(Method::GET, "flights(1)/id/$value")
        .header("accept", "application/octet-stream")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/octet-stream"));
    assert_eq!(response.bytes(), Some(&b"1"[..]));
}

#[tokio::test]
async fn test_raw_value_as_octets_from_format() {
    let service = service();

    let response = get(&service, "flights(1)/origin/$value?$format=application/octet-stream").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/octet-stream"));
    assert_eq!(response.bytes(), Some(&b"lhr"[..]));
}

#[tokio::test]
async fn test_binary_raw_value_defaults_to_octets() {
    let service = service();

    let response = get(&service, "fbytes()/$value").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/octet-stream"));
    assert_eq!(response.bytes(), Some(&[0u8, 159, 255][..]));
}

#[tokio::test]
async fn test_raw_value_refuses_json() {
    let service = service();
    let http_request = request(Method::GET, "flights(1)/origin/$value")
        .header("accept", "application/json")
        .body(Vec::new())
        .unwrap();

    let response = service.handle(http_request).await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(error_code(&response), "unsupported_content_type");
}

#[tokio::test]
async fn test_version_header_on_malformed_request() {
    let service = service();

    let response = get(&service, "flights(%FF)").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.header("OData-Version"), Some("4.01"));
}
