//! Collaborator traits
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific Inventory Service client or tag store.

use crate::error::{Error, Result, ServiceError};
use crate::types::{Page, Query, ResourceId};
use serde_json::Value;

/// Result of a single Inventory Service call
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Request/response interface to the Inventory Service
///
/// Endpoints name a collection (e.g. "ipam/ip-ranges"). Payloads and
/// responses are JSON objects in the service's write and read shapes.
/// A missing entity must be reported as a 404 [`ServiceError`].
pub trait InventoryService: Send + Sync {
    /// List entities matching a query
    fn list(&self, endpoint: &str, query: &Query) -> ServiceResult<Page>;

    /// Create an entity; returns the created entity
    fn create(&self, endpoint: &str, payload: &Value) -> ServiceResult<Value>;

    /// Fetch one entity by identifier
    fn read(&self, endpoint: &str, id: ResourceId) -> ServiceResult<Value>;

    /// Replace an entity (PUT)
    fn update(&self, endpoint: &str, id: ResourceId, payload: &Value) -> ServiceResult<Value>;

    /// Partially update an entity (PATCH)
    fn partial_update(
        &self,
        endpoint: &str,
        id: ResourceId,
        payload: &Value,
    ) -> ServiceResult<Value>;

    /// Delete an entity
    fn delete(&self, endpoint: &str, id: ResourceId) -> ServiceResult<()>;
}

/// Name → identifier resolution for tag sets
pub trait TagResolver: Send + Sync {
    /// Resolve tag names to identifiers, preserving order
    ///
    /// Fails with `UnknownReference` for a name that does not exist
    /// (unless the implementation creates it).
    fn resolve(&self, names: &[String]) -> Result<Vec<ResourceId>>;
}

/// Resolver for callers that never use tags
///
/// Resolves the empty set; any name is an unknown reference.
pub struct NoTags;

impl TagResolver for NoTags {
    fn resolve(&self, names: &[String]) -> Result<Vec<ResourceId>> {
        match names.first() {
            Some(name) => Err(Error::UnknownReference {
                kind: "tag".to_string(),
                name: name.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
