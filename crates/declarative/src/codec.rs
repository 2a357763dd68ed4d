//! Field codec traits
//!
//! A codec maps one resource kind between its typed declarative record and
//! the Inventory Service's write (payload) and read (remote) shapes.

use crate::context::TagResolver;
use crate::error::Result;
use crate::schema::Schema;
use crate::types::{Decoded, Query, UpdateMode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Bidirectional mapping for a managed resource kind
///
/// Implementations carry their per-kind configuration (defaults, enum sets)
/// from construction; nothing is read from global tables.
pub trait FieldCodec: Send + Sync {
    /// Typed declarative record
    type Record: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync;
    /// Write shape sent on create/update
    type Payload: Serialize;
    /// Read shape returned by the service
    type Remote: DeserializeOwned;

    /// Declared fields of this kind
    fn schema(&self) -> &Schema;

    /// Inventory Service collection
    fn endpoint(&self) -> &'static str;

    /// Update discipline for this kind
    fn update_mode(&self) -> UpdateMode;

    /// Check required fields and value constraints
    ///
    /// Runs before any network call.
    fn validate(&self, record: &Self::Record) -> Result<()>;

    /// Build the write payload, applying defaults and resolving references
    fn encode(&self, record: &Self::Record, tags: &dyn TagResolver) -> Result<Self::Payload>;

    /// Build the record from the read shape
    fn decode(&self, remote: Self::Remote) -> Decoded<Self::Record>;
}

/// Mapping for a read-only lookup kind
pub trait LookupCodec: Send + Sync {
    /// Typed filter specification
    type Filter: fmt::Debug;
    /// Typed record returned by a lookup
    type Record: Clone + fmt::Debug + PartialEq;
    /// Read shape returned by the service
    type Remote: DeserializeOwned;

    /// Declared fields of this kind
    fn schema(&self) -> &Schema;

    /// Inventory Service collection
    fn endpoint(&self) -> &'static str;

    /// Validate the filter and build the list query (without limit)
    fn query(&self, filter: &Self::Filter) -> Result<Query>;

    /// Build the record from the read shape
    fn decode(&self, remote: Self::Remote) -> Decoded<Self::Record>;
}
