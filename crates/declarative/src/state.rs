//! Tracked state of managed resources
//!
//! [`ResourceData`] is the per-record slice of state an adapter works on:
//! the identifier, the last known record, and the lifecycle position.
//! A [`StateStore`] keeps those slices between reconciliation cycles.

use crate::error::{Error, Result};
use crate::types::{Lifecycle, ResourceId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier, last known record and lifecycle of one managed resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData<R> {
    id: Option<ResourceId>,
    record: Option<R>,
    lifecycle: Lifecycle,
}

impl<R> Default for ResourceData<R> {
    fn default() -> Self {
        Self {
            id: None,
            record: None,
            lifecycle: Lifecycle::Absent,
        }
    }
}

impl<R> ResourceData<R> {
    /// Untracked data for a record that does not exist yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Data seeded only with an identifier (import path)
    ///
    /// A read populates the rest.
    pub fn imported(id: ResourceId) -> Self {
        Self {
            id: Some(id),
            record: None,
            lifecycle: Lifecycle::Created,
        }
    }

    /// Data restored from a store
    pub fn tracked(id: ResourceId, record: R) -> Self {
        Self {
            id: Some(id),
            record: Some(record),
            lifecycle: Lifecycle::ReadVerified,
        }
    }

    pub fn id(&self) -> Option<ResourceId> {
        self.id
    }

    /// Last record read from the Inventory Service
    pub fn record(&self) -> Option<&R> {
        self.record.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the entity is believed to exist remotely
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Identifier, or a validation error for untracked data
    pub fn require_id(&self) -> Result<ResourceId> {
        self.id
            .ok_or_else(|| Error::validation("id", "resource has no identifier"))
    }

    /// Record the identifier assigned by the service
    ///
    /// Identifiers are never mutated once assigned.
    pub(crate) fn assign_id(&mut self, id: ResourceId) -> Result<()> {
        match self.id {
            Some(existing) if existing != id => Err(Error::validation(
                "id",
                format!("identifier {existing} already assigned, refusing {id}"),
            )),
            _ => {
                self.id = Some(id);
                self.lifecycle = Lifecycle::Created;
                Ok(())
            }
        }
    }

    pub(crate) fn record_read(&mut self, record: R) {
        self.record = Some(record);
        self.lifecycle = Lifecycle::ReadVerified;
    }

    pub(crate) fn mark_updated(&mut self) {
        self.lifecycle = Lifecycle::Updated;
    }

    /// Drop identifier and record: the entity no longer exists
    pub(crate) fn clear(&mut self, lifecycle: Lifecycle) {
        self.id = None;
        self.record = None;
        self.lifecycle = lifecycle;
    }
}

/// Stored form of one managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Resource kind, e.g. "netbox_ip_range"
    pub kind: String,
    pub id: ResourceId,
    /// Last known record
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    pub updated_at: DateTime<Utc>,
}

/// Keeps the last known record and identifier per managed resource
///
/// Keyed by an address chosen by the caller (e.g. "netbox_ip_range.lab").
pub trait StateStore {
    /// Look up an entry
    fn get(&self, address: &str) -> Option<StateEntry>;

    /// Insert or replace an entry
    fn put(&mut self, address: &str, entry: StateEntry);

    /// Remove an entry, returning it
    fn remove(&mut self, address: &str) -> Option<StateEntry>;

    /// All tracked addresses
    fn addresses(&self) -> Vec<String>;
}

/// Typed access to a [`StateStore`]
pub trait StateStoreExt {
    /// Load the tracked data for an address (untracked if missing)
    fn checkout<R: DeserializeOwned>(&self, address: &str) -> Result<ResourceData<R>>;

    /// Store tracked data; data without an identifier removes the entry
    fn commit<R: Serialize>(&mut self, address: &str, kind: &str, data: &ResourceData<R>)
    -> Result<()>;

    /// Seed an entry from an identifier alone (import path)
    fn seed(&mut self, address: &str, kind: &str, id: ResourceId);
}

impl<S: StateStore + ?Sized> StateStoreExt for S {
    fn checkout<R: DeserializeOwned>(&self, address: &str) -> Result<ResourceData<R>> {
        let Some(entry) = self.get(address) else {
            return Ok(ResourceData::new());
        };
        let record = if entry.attributes.is_null() {
            None
        } else {
            let record = serde_json::from_value(entry.attributes).map_err(|e| {
                Error::validation(address, format!("stored attributes do not decode: {e}"))
            })?;
            Some(record)
        };
        Ok(ResourceData {
            id: Some(entry.id),
            record,
            lifecycle: entry.lifecycle,
        })
    }

    fn commit<R: Serialize>(
        &mut self,
        address: &str,
        kind: &str,
        data: &ResourceData<R>,
    ) -> Result<()> {
        let Some(id) = data.id() else {
            if self.remove(address).is_some() {
                log::debug!("Dropped {address} from state");
            }
            return Ok(());
        };
        let attributes = match data.record() {
            Some(record) => serde_json::to_value(record)
                .map_err(|e| Error::validation(address, e.to_string()))?,
            None => Value::Null,
        };
        self.put(
            address,
            StateEntry {
                kind: kind.to_string(),
                id,
                attributes,
                lifecycle: data.lifecycle(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn seed(&mut self, address: &str, kind: &str, id: ResourceId) {
        self.put(
            address,
            StateEntry {
                kind: kind.to_string(),
                id,
                attributes: Value::Null,
                lifecycle: Lifecycle::Created,
                updated_at: Utc::now(),
            },
        );
    }
}

/// In-memory state store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStateStore {
    #[serde(default)]
    entries: BTreeMap<String, StateEntry>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind
    pub fn by_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a StateEntry)> {
        self.entries.iter().filter(move |(_, e)| e.kind == kind)
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, address: &str) -> Option<StateEntry> {
        self.entries.get(address).cloned()
    }

    fn put(&mut self, address: &str, entry: StateEntry) {
        self.entries.insert(address.to_string(), entry);
    }

    fn remove(&mut self, address: &str) -> Option<StateEntry> {
        self.entries.remove(address)
    }

    fn addresses(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
