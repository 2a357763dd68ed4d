//! # Declarative
//!
//! A framework for reconciling declared records against a remote inventory.
//!
//! This crate provides the core abstractions for mapping a typed declarative
//! record onto an Inventory Service entity, detecting drift, and converging
//! the entity to match the record.
//!
//! ## Core Concepts
//!
//! - **FieldCodec**: Per-kind mapping between record, write payload and read shape
//! - **ResourceAdapter**: Create/Read/Update/Delete for any codec
//! - **LookupAdapter**: Resolves a filter to exactly one entity
//! - **Schema**: Declared fields with presence, defaults and diff suppression
//! - **ResourceData**: Identifier, last known record and lifecycle
//! - **StateStore**: Keeps `ResourceData` between reconciliation cycles
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ResourceAdapter, ResourceData, ReadOutcome};
//!
//! let adapter = ResourceAdapter::new(codec, service.clone(), tags.clone());
//! let mut data = ResourceData::new();
//!
//! adapter.create(&mut data, &record)?;
//!
//! // Later: drift detection
//! match adapter.read(&mut data)? {
//!     ReadOutcome::Present(current) => {
//!         let diff = adapter.plan(&data, &record)?;
//!         if diff.has_changes() {
//!             adapter.update(&mut data, &record)?;
//!         }
//!     }
//!     ReadOutcome::Absent => { /* gone remotely, recreate */ }
//! }
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`InventoryService`]: Request/response access to the remote collections
//! - [`TagResolver`]: Resolves tag names to identifiers
//! - [`StateStore`]: Persists tracked records
//!
//! This allows the crate to be used without hard dependencies on
//! a specific HTTP client, tag policy or storage format.

pub mod adapter;
pub mod codec;
pub mod context;
pub mod diff;
pub mod error;
pub mod field;
pub mod lookup;
pub mod schema;
pub mod state;
pub mod types;

// Re-export main types at crate root
pub use adapter::ResourceAdapter;
pub use codec::{FieldCodec, LookupCodec};
pub use context::{InventoryService, NoTags, ServiceResult, TagResolver};
pub use diff::{ChangeAction, FieldChange, ResourceDiff, compute_diff, field_changes, refresh};
pub use error::{Error, ErrorCategory, Result, ServiceError};
pub use field::{EnumSet, Field, require_non_empty, trimmed_eq, valid_values_description};
pub use lookup::{LookupAdapter, MIN_LOOKUP_LIMIT};
pub use schema::{DiffSuppress, FieldSchema, FieldType, Presence, Schema};
pub use state::{MemoryStateStore, ResourceData, StateEntry, StateStore, StateStoreExt};
pub use types::{
    Decoded, Lifecycle, Page, Query, ReadOutcome, ResourceId, UpdateMode,
};
