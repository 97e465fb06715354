//! Shared fixtures for the integration tests.
//!
//! The fixture service exposes two entity sets (`flights`, `airports`) and a
//! set of functions and actions covering the argument and return variants.

use http::{Method, Request, StatusCode};
use odata_server::catalog::{Catalog, CatalogBuilder};
use odata_server::model::{Entity, EntitySet, EntityType};
use odata_server::operation::{CallableReturn, OperationTemplate, Parameter, ReturnType};
use odata_server::primitive::{NativeType, NativeValue, Primitive, PrimitiveType};
use odata_server::service::{ODataService, ServiceBuilder, ServiceResponse};
use serde_json::json;
use std::sync::Arc;

pub const SERVICE_ROOT: &str = "http://localhost/odata/";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn flight_type() -> Arc<EntityType> {
    EntityType::new("flight")
        .with_key("id", PrimitiveType::Int32)
        .with_property("origin", PrimitiveType::String)
        .with_property("destination", PrimitiveType::String)
        .into_shared()
}

pub fn airport_type() -> Arc<EntityType> {
    EntityType::new("airport")
        .with_key("code", PrimitiveType::String)
        .with_property("name", PrimitiveType::String)
        .into_shared()
}

fn entities(entity_type: &Arc<EntityType>, rows: serde_json::Value) -> Vec<Entity> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|row| Entity::from_json(entity_type.clone(), row).unwrap())
        .collect()
}

/// Catalog with every fixture registered, ready for extra members
pub fn catalog_builder() -> CatalogBuilder {
    let flight = flight_type();
    let airport = airport_type();

    let flights = EntitySet::in_memory(
        "flights",
        flight.clone(),
        entities(
            &flight,
            json!([
                {"id": 1, "origin": "lhr", "destination": "sfo"},
                {"id": 2, "origin": "sam", "destination": "rgr"},
                {"id": 3, "origin": null, "destination": "lhr"},
            ]),
        ),
    )
    .unwrap();

    let airports = EntitySet::in_memory(
        "airports",
        airport.clone(),
        entities(
            &airport,
            json!([
                {"code": "lhr", "name": "Heathrow"},
                {"code": "sfo", "name": "San Francisco"},
            ]),
        ),
    )
    .unwrap();

    let mut builder = Catalog::builder()
        .add_entity_set(flights)
        .add_entity_set(airports);
    for operation in operations() {
        builder = builder.add_operation(operation);
    }
    builder
}

fn operations() -> Vec<OperationTemplate> {
    vec![
        OperationTemplate::function("identity")
            .parameter(Parameter::primitive("i", PrimitiveType::Int32))
            .returns(CallableReturn::primitive(PrimitiveType::Int32))
            .callable(|arguments| Ok(Some(arguments.primitive("i")?.clone().into())))
            .build()
            .unwrap(),
        OperationTemplate::function("increment")
            .parameter(Parameter::primitive("i", PrimitiveType::Int32))
            .binding_parameter("i")
            .returns(CallableReturn::primitive(PrimitiveType::Int32))
            .callable(|arguments| {
                let i = arguments.int("i")?;
                Ok(Some(Primitive::Int32(i as i32 + 1).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("ident")
            .parameter(Parameter::value("i", NativeType::Int))
            .returns(CallableReturn::value(NativeType::Int))
            .callable(|arguments| Ok(Some(NativeValue::Int(arguments.int("i")?).into())))
            .build()
            .unwrap(),
        OperationTemplate::function("incr")
            .parameter(Parameter::value("i", NativeType::Int))
            .binding_parameter("i")
            .returns(CallableReturn::value(NativeType::Int))
            .callable(|arguments| Ok(Some(NativeValue::Int(arguments.int("i")? + 1).into())))
            .build()
            .unwrap(),
        OperationTemplate::function("add")
            .parameter(Parameter::primitive("a", PrimitiveType::Int32))
            .parameter(Parameter::primitive("b", PrimitiveType::Int32))
            .returns(CallableReturn::primitive(PrimitiveType::Int32))
            .callable(|arguments| {
                let sum = arguments.int("a")? + arguments.int("b")?;
                Ok(Some(Primitive::Int32(sum as i32).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("fapply")
            .parameter(Parameter::primitive("apply", PrimitiveType::String))
            .parameter(Parameter::primitive("compute", PrimitiveType::String))
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|arguments| {
                let joined = format!("{}{}", arguments.string("apply")?, arguments.string("compute")?);
                Ok(Some(Primitive::from(joined).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("nullfn")
            .returns(CallableReturn::primitive(PrimitiveType::String).nullable())
            .callable(|_| Ok(None))
            .build()
            .unwrap(),
        OperationTemplate::function("fbytes")
            .returns(CallableReturn::primitive(PrimitiveType::Binary))
            .callable(|_| Ok(Some(Primitive::Binary(vec![0, 159, 255]).into())))
            .build()
            .unwrap(),
        OperationTemplate::function("ffb1")
            .parameter(Parameter::primitive("code", PrimitiveType::String))
            .binding_parameter("code")
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|arguments| {
                Ok(Some(Primitive::from(arguments.string("code")?.to_uppercase()).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("fdest")
            .parameter(Parameter::entity("flight"))
            .binding_parameter("flight")
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|arguments| {
                let flight = arguments.entity("flight")?;
                Ok(flight.get("destination").cloned().map(Into::into))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("fset")
            .parameter(Parameter::entity_set("flights"))
            .binding_parameter("flights")
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|arguments| {
                let flights = arguments.entity_set("flights")?;
                Ok(Some(Primitive::from(flights.name()).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("ffn1")
            .parameter(Parameter::entity_set("flights"))
            .returns(CallableReturn::entity_set())
            .callable(|arguments| Ok(Some(arguments.entity_set("flights")?.clone().into())))
            .build()
            .unwrap(),
        OperationTemplate::function("fairport")
            .parameter(Parameter::primitive("code", PrimitiveType::String))
            .returns(CallableReturn::entity())
            .return_type(ReturnType::Entity(airport_type()))
            .callable(|arguments| {
                let airport = Entity::new(airport_type()).with("code", arguments.string("code")?)?;
                Ok(Some(airport.into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::function("fwrongtype")
            .returns(CallableReturn::entity())
            .return_type(ReturnType::Entity(airport_type()))
            .callable(|_| Ok(Some(Entity::new(flight_type()).into())))
            .build()
            .unwrap(),
        OperationTemplate::action("textv1")
            .returns(CallableReturn::primitive(PrimitiveType::String))
            .callable(|_| Ok(Some(Primitive::from("hello").into())))
            .build()
            .unwrap(),
        OperationTemplate::action("aa1")
            .returns(CallableReturn::Void)
            .callable(|_| Ok(None))
            .build()
            .unwrap(),
        OperationTemplate::action("aa2")
            .returns(CallableReturn::primitive(PrimitiveType::Int32))
            .callable(|_| Ok(None))
            .build()
            .unwrap(),
        OperationTemplate::action("aadd")
            .parameter(Parameter::primitive("a", PrimitiveType::Int32))
            .parameter(Parameter::primitive("b", PrimitiveType::Int32).nullable())
            .returns(CallableReturn::primitive(PrimitiveType::Int32))
            .callable(|arguments| {
                let b = arguments.primitive("b")?.as_i64().unwrap_or(0);
                Ok(Some(Primitive::Int32((arguments.int("a")? + b) as i32).into()))
            })
            .build()
            .unwrap(),
        OperationTemplate::action("acreate")
            .parameter(Parameter::transaction("transaction"))
            .parameter(Parameter::entity("airport"))
            .returns(CallableReturn::entity())
            .callable(|arguments| {
                arguments
                    .transaction("transaction")?
                    .set_response_status(StatusCode::CREATED);
                Ok(Some(arguments.entity("airport")?.clone().into()))
            })
            .build()
            .unwrap(),
    ]
}

pub fn service_with(builder: ServiceBuilder) -> ODataService {
    builder
        .with_service_root(SERVICE_ROOT)
        .with_catalog(catalog_builder().build().unwrap())
        .build()
        .unwrap()
}

pub fn service() -> ODataService {
    service_with(ServiceBuilder::new())
}

pub fn request(method: Method, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(format!("/odata/{}", uri.trim_start_matches('/')))
}

pub async fn get(service: &ODataService, uri: &str) -> ServiceResponse {
    service
        .handle(request(Method::GET, uri).body(Vec::new()).unwrap())
        .await
}

pub async fn post(service: &ODataService, uri: &str) -> ServiceResponse {
    service
        .handle(request(Method::POST, uri).body(Vec::new()).unwrap())
        .await
}

pub async fn post_json(service: &ODataService, uri: &str, body: &str) -> ServiceResponse {
    service
        .handle(
            request(Method::POST, uri)
                .header("content-type", "application/json")
                .body(body.as_bytes().to_vec())
                .unwrap(),
        )
        .await
}

/// The error code of a failed response
pub fn error_code(response: &ServiceResponse) -> &str {
    response.json().unwrap()["error"]["code"].as_str().unwrap()
}
