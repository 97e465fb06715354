//! Request handling facade.
//!
//! [`ODataService`] ties the catalog, access control and resolver chain
//! together: it turns an `http::Request` into a [`ServiceResponse`].
//! Routing, TLS and the HTTP server itself belong to the host application.
//!
//! ```rust
//! use odata_server::catalog::Catalog;
//! use odata_server::operation::{CallableReturn, OperationTemplate};
//! use odata_server::primitive::{Primitive, PrimitiveType};
//! use odata_server::service::ServiceBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hello = OperationTemplate::function("hello")
//!     .returns(CallableReturn::primitive(PrimitiveType::String))
//!     .callable(|_| Ok(Some(Primitive::from("world").into())))
//!     .build()?;
//!
//! let service = ServiceBuilder::new()
//!     .with_service_root("http://localhost/odata")
//!     .with_catalog(Catalog::builder().add_operation(hello).build()?)
//!     .build()?;
//!
//! let request = http::Request::get("/odata/hello()").body(Vec::new())?;
//! let response = service.handle(request).await;
//! assert_eq!(response.json().unwrap()["value"], "world");
//! # Ok(())
//! # }
//! ```

mod response;

pub use response::{ResponseBody, ServiceResponse};

use crate::catalog::Catalog;
use crate::error::{ODataError, ODataResult};
use crate::gate::{AccessControl, AllowAll, GatePolicy};
use crate::media_type::{self, MediaType};
use crate::operation::OperationKind;
use crate::pipe::{PathResolver, PipeContext, PipeValue};
use crate::primitive::{Primitive, PrimitiveType};
use crate::transaction::{REQUEST_ID_HEADER, Transaction};
use http::{Request, StatusCode};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Protocol version advertised on every response
pub const ODATA_VERSION: &str = "4.01";

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL the service is mounted at, e.g. `https://example.com/odata/`
    pub service_root: String,
    /// Block everything except read and query access
    pub readonly: bool,
    /// Consult the gate policy; when false every request is permitted
    pub authorization: bool,
    /// Representation used for JSON responses before negotiation
    pub default_content_type: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_root: "http://localhost/odata/".to_string(),
            readonly: false,
            authorization: true,
            default_content_type: media_type::ODATA_JSON.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ODataResult<()> {
        if self.service_root.is_empty() {
            return Err(ODataError::internal(
                "invalid_configuration",
                "Service root cannot be empty",
            ));
        }

        if !self.service_root.starts_with("http://") && !self.service_root.starts_with("https://") {
            return Err(ODataError::internal(
                "invalid_configuration",
                "Service root must start with http:// or https://",
            ));
        }

        self.default_content_type.parse::<MediaType>().map_err(|_| {
            ODataError::internal(
                "invalid_configuration",
                format!("Default content type '{}' is not a media type", self.default_content_type),
            )
        })?;

        Ok(())
    }

    /// Service root ending in `/`
    pub fn normalised_service_root(&self) -> String {
        if self.service_root.ends_with('/') {
            self.service_root.clone()
        } else {
            format!("{}/", self.service_root)
        }
    }
}

/// Builder for [`ODataService`].
pub struct ServiceBuilder {
    config: ServiceConfig,
    policy: Arc<dyn GatePolicy>,
    catalog: Catalog,
    resolver: PathResolver,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            policy: Arc::new(AllowAll),
            catalog: Catalog::default(),
            resolver: PathResolver::default(),
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_service_root(mut self, service_root: impl Into<String>) -> Self {
        self.config.service_root = service_root.into();
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.config.readonly = readonly;
        self
    }

    pub fn authorization(mut self, authorization: bool) -> Self {
        self.config.authorization = authorization;
        self
    }

    pub fn with_policy(mut self, policy: impl GatePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the default resolver chain
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn build(self) -> ODataResult<ODataService> {
        self.config.validate()?;

        let default_content_type = self.config.default_content_type.parse::<MediaType>()?;
        let service_root = self.config.normalised_service_root();
        let access = AccessControl::new(self.config.readonly, self.config.authorization, self.policy);

        info!(
            "OData service ready at '{}' (readonly: {}, authorization: {})",
            service_root, self.config.readonly, self.config.authorization
        );

        Ok(ODataService {
            service_root,
            default_content_type,
            catalog: Arc::new(self.catalog),
            access: Arc::new(access),
            resolver: self.resolver,
        })
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles requests against one catalog.
#[derive(Debug)]
pub struct ODataService {
    service_root: String,
    default_content_type: MediaType,
    catalog: Arc<Catalog>,
    access: Arc<AccessControl>,
    resolver: PathResolver,
}

impl ODataService {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Handle one request; failures become protocol error responses
    pub async fn handle(&self, request: Request<Vec<u8>>) -> ServiceResponse {
        let fallback_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let response = match Transaction::new(request, &self.service_root) {
            Ok(transaction) => self.handle_transaction(Arc::new(transaction)).await,
            Err(error) => {
                warn!("Rejected request: {} (request: '{}')", error, fallback_id);
                ServiceResponse::from_error(&error, fallback_id)
            }
        };
        response.with_header("OData-Version", ODATA_VERSION)
    }

    async fn handle_transaction(&self, transaction: Arc<Transaction>) -> ServiceResponse {
        let request_id = transaction.request_id().to_string();

        info!(
            "Handling {} '{}' (request: '{}')",
            transaction.method(),
            transaction.path(),
            request_id
        );

        let response = match self.process(&transaction).await {
            Ok(response) => response,
            Err(error) => {
                if error.is_client_error() {
                    warn!("Request failed: {} (request: '{}')", error, request_id);
                } else {
                    warn!("Request failed with internal error: {} (request: '{}')", error, request_id);
                }
                ServiceResponse::from_error(&error, request_id.as_str())
            }
        };

        info!(
            "Completed with status {} (request: '{}')",
            response.status().as_u16(),
            request_id
        );
        response
    }

    async fn process(&self, transaction: &Arc<Transaction>) -> ODataResult<ServiceResponse> {
        let request_id = transaction.request_id();

        if transaction.segments().is_empty() {
            let content_type = self.negotiate(transaction, self.default_content_type.clone())?;
            let document = self.service_document(&content_type);
            return Ok(ServiceResponse::new(StatusCode::OK, ResponseBody::Json(document), request_id)
                .with_content_type(content_type.to_string()));
        }

        let context = PipeContext::new(self.catalog.clone(), self.access.clone(), transaction.clone());
        let result = self.resolver.resolve(&context).await?;

        let mut response = match result {
            None => ServiceResponse::no_content(request_id),
            Some(PipeValue::Raw(primitive)) if primitive.is_null() => {
                ServiceResponse::no_content(request_id)
            }
            Some(PipeValue::Raw(primitive)) => {
                let content_type = self.negotiate_raw(transaction, &primitive)?;
                let body = if content_type.subtype() == "octet-stream" {
                    ResponseBody::Binary(raw_bytes(primitive))
                } else {
                    ResponseBody::Text(raw_text(&primitive))
                };
                ServiceResponse::new(StatusCode::OK, body, request_id)
                    .with_content_type(content_type.to_string())
            }
            Some(value) => {
                let content_type = self.negotiate(transaction, self.default_content_type.clone())?;
                let body = self.render(&value, &content_type).await?;
                ServiceResponse::new(StatusCode::OK, ResponseBody::Json(body), request_id)
                    .with_content_type(content_type.to_string())
            }
        };

        if let Some(status) = transaction.response_status() {
            response = response.with_status(status);
        }
        if let Some(applied) = transaction.preference_applied_header() {
            response = response.with_header("Preference-Applied", applied);
        }
        Ok(response)
    }

    /// `$format` beats `Accept`; with neither the produced type is used
    fn negotiate(&self, transaction: &Transaction, produced: MediaType) -> ODataResult<MediaType> {
        match transaction.requested_media_type() {
            Some(requested) => {
                let negotiated = produced.negotiate(&requested)?;
                debug!(
                    "Negotiated '{}' from '{}' (request: '{}')",
                    negotiated,
                    requested,
                    transaction.request_id()
                );
                Ok(negotiated)
            }
            None => Ok(produced),
        }
    }

    /// Raw values are offered as text and as octets, binary values prefer
    /// octets
    fn negotiate_raw(&self, transaction: &Transaction, primitive: &Primitive) -> ODataResult<MediaType> {
        let mut produced = [media_type::TEXT_PLAIN, media_type::APPLICATION_OCTET_STREAM];
        if primitive.primitive_type() == PrimitiveType::Binary {
            produced.reverse();
        }

        let mut failure = None;
        for candidate in produced {
            match self.negotiate(transaction, candidate.parse::<MediaType>()?) {
                Ok(content_type) => return Ok(content_type),
                Err(error) => failure = Some(error),
            }
        }
        Err(failure.unwrap_or_else(|| {
            ODataError::not_acceptable("unsupported_content_type", "No raw representation is available")
        }))
    }

    async fn render(&self, value: &PipeValue, content_type: &MediaType) -> ODataResult<Value> {
        let (fragment, mut body) = match value {
            PipeValue::Primitive(primitive) | PipeValue::Raw(primitive) => (
                primitive.primitive_type().identifier().to_string(),
                value_object(primitive.to_json()),
            ),
            PipeValue::PropertyValue(property) => (
                property.value().primitive_type().identifier().to_string(),
                value_object(property.value().to_json()),
            ),
            PipeValue::Entity(entity) => match entity.to_json() {
                Value::Object(object) => (format!("{}/$entity", entity.type_name()), object),
                other => (entity.type_name().to_string(), value_object(other)),
            },
            PipeValue::EntitySet(entity_set) => {
                let entities = entity_set.query().await?;
                let values = entities.iter().map(|entity| entity.to_json()).collect();
                (entity_set.name().to_string(), value_object(Value::Array(values)))
            }
            PipeValue::Collection(values) => {
                let item_type = values
                    .first()
                    .map_or("Edm.String", |value| value.primitive_type().identifier());
                let values = values.iter().map(Primitive::to_json).collect();
                (format!("Collection({item_type})"), value_object(Value::Array(values)))
            }
        };

        if content_type.parameter("odata.metadata") != Some("none") {
            body.insert(
                "@odata.context".to_string(),
                Value::String(format!("{}$metadata#{}", self.service_root, fragment)),
            );
        }
        Ok(Value::Object(body))
    }

    /// Entity sets and unbound functions available at the service root
    fn service_document(&self, content_type: &MediaType) -> Value {
        let mut resources: Vec<Value> = self
            .catalog
            .entity_sets()
            .map(|entity_set| {
                json!({"name": entity_set.name(), "kind": "EntitySet", "url": entity_set.name()})
            })
            .collect();

        resources.extend(
            self.catalog
                .operations()
                .filter(|operation| operation.kind() == OperationKind::Function && !operation.is_bound())
                .map(|operation| {
                    json!({"name": operation.name(), "kind": "FunctionImport", "url": operation.name()})
                }),
        );

        let mut document = value_object(Value::Array(resources));
        if content_type.parameter("odata.metadata") != Some("none") {
            document.insert(
                "@odata.context".to_string(),
                Value::String(format!("{}$metadata", self.service_root)),
            );
        }
        Value::Object(document)
    }
}

fn value_object(value: Value) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("value".to_string(), value);
    object
}

/// Raw text of a primitive: strings unquoted, null empty
fn raw_text(primitive: &Primitive) -> String {
    match primitive.to_json() {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Raw octets of a primitive: binary values as stored, others as their text
fn raw_bytes(primitive: Primitive) -> Vec<u8> {
    match primitive {
        Primitive::Binary(bytes) => bytes,
        other => raw_text(&other).into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(ServiceConfig::default().validate().is_ok());

        let config = ServiceConfig {
            service_root: "ftp://localhost".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().code(), "invalid_configuration");

        let config = ServiceConfig {
            service_root: "http://localhost/odata".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(config.normalised_service_root(), "http://localhost/odata/");
    }

    #[test]
    fn test_config_deserialises_with_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"service_root": "https://example.com/odata", "readonly": true}"#)
                .unwrap();
        assert!(config.readonly);
        assert!(config.authorization);
        assert_eq!(config.default_content_type, media_type::ODATA_JSON);
    }

    #[test]
    fn test_raw_text() {
        assert_eq!(raw_text(&Primitive::from("O'Neil")), "O'Neil");
        assert_eq!(raw_text(&Primitive::Int32(4)), "4");
        assert_eq!(raw_text(&Primitive::Null(PrimitiveType::String)), "");
    }

    #[test]
    fn test_raw_bytes() {
        assert_eq!(raw_bytes(Primitive::Binary(vec![0, 159, 255])), vec![0, 159, 255]);
        assert_eq!(raw_bytes(Primitive::Int32(42)), b"42".to_vec());
    }
}
