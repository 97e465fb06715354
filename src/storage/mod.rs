//! Persistence interface for entity sets.
//!
//! The pipeline never talks to a database directly. Each [`EntitySet`] holds
//! an [`EntitySetProvider`] and asks it for entities by key or for the whole
//! collection. Query options such as `$filter` are interpreted by the
//! provider, not by the core.
//!
//! [`EntitySet`]: crate::model::EntitySet
//!
//! # Example
//!
//! ```rust
//! use odata_server::model::{Entity, EntityType};
//! use odata_server::primitive::{Primitive, PrimitiveType};
//! use odata_server::storage::{EntitySetProvider, InMemoryEntitySet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let airport = EntityType::new("airport")
//!     .with_key("id", PrimitiveType::Int32)
//!     .with_property("code", PrimitiveType::String)
//!     .into_shared();
//!
//! let storage = InMemoryEntitySet::new();
//! let lhr = Entity::new(airport.clone()).with("id", 1)?.with("code", "lhr")?;
//! storage.insert(lhr).await?;
//!
//! let found = storage.read(&Primitive::Int32(1)).await?;
//! assert_eq!(found.and_then(|e| e.get("code").cloned()), Some(Primitive::from("lhr")));
//! # Ok(())
//! # }
//! ```

pub mod in_memory;

pub use in_memory::InMemoryEntitySet;

use crate::error::ODataResult;
use crate::model::Entity;
use crate::primitive::Primitive;
use async_trait::async_trait;

/// Narrow read interface consumed by entity sets.
///
/// Implementations must be shareable across requests; the pipeline holds
/// them behind `Arc` and only ever takes `&self`.
#[async_trait]
pub trait EntitySetProvider: Send + Sync {
    /// Fetch one entity by key.
    ///
    /// Returns `Ok(None)` if no entity has that key.
    async fn read(&self, key: &Primitive) -> ODataResult<Option<Entity>>;

    /// Fetch all entities in a stable order
    async fn query(&self) -> ODataResult<Vec<Entity>>;

    /// Number of entities in the set
    async fn count(&self) -> ODataResult<usize> {
        Ok(self.query().await?.len())
    }
}
