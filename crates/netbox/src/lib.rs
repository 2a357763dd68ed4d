//! # netbox
//!
//! NetBox catalog for declarative reconciliation.
//!
//! This crate provides:
//! - [`Endpoint`]: the REST collections the provider talks to, with the
//!   server-side rules of each (required fields, defaults, choices)
//! - [`wire`]: read-shape fragments shared by entity decoders
//!   (nested references, choice values, nested tags)
//! - [`MockNetbox`]: an in-memory [`InventoryService`](declarative::InventoryService)
//!   that behaves like NetBox, for tests and offline runs
//!
//! No HTTP client is included; callers bring their own
//! `InventoryService` implementation for a live NetBox.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod endpoint;
pub mod mock;
pub mod wire;

pub use endpoint::Endpoint;
pub use mock::{Call, DEFAULT_PAGE_SIZE, MockNetbox, Operation};
pub use wire::{ChoiceValue, NestedRef, NestedTag, ref_id, tag_names};
