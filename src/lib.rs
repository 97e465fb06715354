//! OData v4 request pipeline for Rust.
//!
//! Resolves OData resource paths segment by segment, dispatches bound and
//! unbound actions and functions with typed arguments, checks access through
//! a pluggable gate and negotiates the response media type.
//!
//! # Core Components
//!
//! - [`ODataService`] - Turns an `http::Request` into a [`ServiceResponse`]
//! - [`Catalog`] - Immutable registry of entity types, entity sets and operations
//! - [`OperationTemplate`] - An action or function with its declared signature
//! - [`PathResolver`] - Resolver chain that composes path segments
//! - [`MediaType`] - Media type parsing and `Accept` negotiation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use odata_server::{Catalog, OperationTemplate, ServiceBuilder};
//! use odata_server::operation::{CallableReturn, Parameter};
//! use odata_server::primitive::{Primitive, PrimitiveType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let add = OperationTemplate::function("add")
//!     .parameter(Parameter::primitive("a", PrimitiveType::Int32))
//!     .parameter(Parameter::primitive("b", PrimitiveType::Int32))
//!     .returns(CallableReturn::primitive(PrimitiveType::Int32))
//!     .callable(|arguments| {
//!         let sum = arguments.int("a")? + arguments.int("b")?;
//!         Ok(Some(Primitive::Int32(sum as i32).into()))
//!     })
//!     .build()?;
//!
//! let service = ServiceBuilder::new()
//!     .with_service_root("https://example.com/odata/")
//!     .with_catalog(Catalog::builder().add_operation(add).build()?)
//!     .build()?;
//!
//! let request = http::Request::get("/odata/add(a=1,b=@b)?@b=2").body(Vec::new())?;
//! let response = service.handle(request).await;
//! println!("{} {:?}", response.status(), response.json());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod gate;
pub mod lexer;
pub mod media_type;
pub mod model;
pub mod operation;
pub mod pipe;
pub mod primitive;
pub mod service;
pub mod storage;
pub mod transaction;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, CatalogBuilder};
pub use error::{ErrorResponse, ODataError, ODataResult};
pub use gate::{Access, AccessControl, Gate, GatePolicy, GateResource};
pub use media_type::MediaType;
pub use model::{Entity, EntitySet, EntityType, Property, PropertyValue};
pub use operation::{
    Arguments, CallableReturn, OperationInvocation, OperationKind, OperationTemplate, Parameter,
    ReturnValue,
};
pub use pipe::{PathResolver, PipeContext, PipeValue, Resolution, SegmentResolver};
pub use primitive::{NativeType, NativeValue, Primitive, PrimitiveType};
pub use service::{ODataService, ServiceBuilder, ServiceConfig, ServiceResponse};
pub use storage::{EntitySetProvider, InMemoryEntitySet};
pub use transaction::Transaction;
