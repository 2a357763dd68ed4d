//! Core types for declarative resource reconciliation

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier assigned by the Inventory Service on create
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::validation("id", format!("{s:?} is not a numeric identifier")))
    }
}

/// Where a managed record is in its lifecycle
///
/// `Absent → Created → ReadVerified → (Updated)* → Deleted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Not known to exist remotely
    #[default]
    Absent,
    /// Identifier assigned, computed fields not read back yet
    Created,
    /// Remote state has been read into the record
    ReadVerified,
    /// Updated and read back
    Updated,
    /// Removed remotely
    Deleted,
}

impl Lifecycle {
    /// Whether the record is believed to exist remotely
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Created | Self::ReadVerified | Self::Updated)
    }
}

/// Outcome of reading remote state
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<R> {
    /// The entity exists; its decoded record
    Present(R),
    /// The entity no longer exists; the identifier was cleared
    Absent,
}

impl<R> ReadOutcome<R> {
    /// Check if the entity exists
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Check if the entity is gone
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The record, if present
    pub fn into_record(self) -> Option<R> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent => None,
        }
    }
}

/// A record decoded from a remote entity, with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R> {
    pub id: ResourceId,
    pub record: R,
}

/// How an update reaches the Inventory Service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Full replace (PUT): required fields and defaulted scalars are always sent
    Replace,
    /// Partial update (PATCH): only fields present in the payload change
    Patch,
}

/// List query against an Inventory Service collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Attribute filters, in insertion order
    pub filters: Vec<(String, String)>,
    /// Maximum number of results to return
    pub limit: Option<u32>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute filter
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    /// Add an attribute filter only when a value is given
    pub fn filter_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(key, v),
            None => self,
        }
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if the query has no filters
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    /// Look up a filter value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            return write!(f, "(no filter)");
        }
        let parts: Vec<String> = self
            .filters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// One page of list results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Total number of matching entities, not just those returned
    pub count: u64,
    /// Returned entities, at most the query limit
    pub results: Vec<serde_json::Value>,
}

impl Page {
    /// Number of matches, trusting whichever of count/results is larger
    pub fn matches(&self) -> u64 {
        self.count.max(self.results.len() as u64)
    }
}
