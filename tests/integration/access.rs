//! Read-only mode and gate policies.

use crate::common::{error_code, get, post, service_with};
use http::StatusCode;
use odata_server::gate::{Access, Gate, GateResource};
use odata_server::service::ServiceBuilder;

#[tokio::test]
async fn test_readonly_blocks_execution_but_not_reads() {
    let service = service_with(ServiceBuilder::new().readonly(true));

    let response = post(&service, "aa1()").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json().unwrap()["error"]["message"],
        "This service is read-only"
    );

    let response = get(&service, "identity(i=1)").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&service, "flights(1)").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&service, "flights").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_policy_denies_named_operation() {
    let policy = |gate: &Gate<'_>| {
        gate.access() == Access::Execute
            && matches!(gate.resource(), GateResource::Operation(operation) if operation.name() == "add")
    };
    let service = service_with(ServiceBuilder::new().with_policy(policy));

    let response = get(&service, "add(a=1,b=2)").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response), "forbidden");

    let response = get(&service, "identity(i=1)").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_policy_sees_generated_arguments() {
    let policy = |gate: &Gate<'_>| {
        gate.arguments()
            .and_then(|arguments| arguments.int("i").ok())
            .is_some_and(|i| i > 10)
    };
    let service = service_with(ServiceBuilder::new().with_policy(policy));

    assert_eq!(get(&service, "identity(i=3)").await.status(), StatusCode::OK);
    assert_eq!(get(&service, "identity(i=30)").await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_authorization_disabled_skips_policy() {
    let service = service_with(
        ServiceBuilder::new()
            .authorization(false)
            .with_policy(|_: &Gate<'_>| true),
    );

    let response = get(&service, "flights").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post(&service, "aa1").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_entity_set_reads_are_gated() {
    let policy = |gate: &Gate<'_>| gate.access() == Access::Query;
    let service = service_with(ServiceBuilder::new().with_policy(policy));

    assert_eq!(get(&service, "flights").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(get(&service, "flights(1)").await.status(), StatusCode::OK);
}
