//! Read-shape fragments shared by NetBox entities.
//!
//! NetBox writes references as bare identifiers but reads them back as
//! nested objects; choice fields read back as `{value, label}` pairs.

use declarative::ResourceId;
use serde::{Deserialize, Serialize};

/// Nested reference to another entity, as returned on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRef {
    /// Referenced entity identifier.
    pub id: ResourceId,
    /// Human-readable name of the referenced entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Identifier of an optional nested reference.
#[must_use]
pub fn ref_id(reference: Option<&NestedRef>) -> Option<ResourceId> {
    reference.map(|r| r.id)
}

/// Choice field value, as returned on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceValue {
    /// Machine value, e.g. `active`.
    pub value: String,
    /// Display label, e.g. `Active`.
    #[serde(default)]
    pub label: String,
}

impl ChoiceValue {
    /// Build a choice with a label derived from the value.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label_for(value),
        }
    }
}

/// Derive the display label NetBox uses for a choice value.
#[must_use]
pub fn label_for(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tag attached to an entity, as returned on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTag {
    /// Tag identifier.
    pub id: ResourceId,
    /// Tag name.
    pub name: String,
    /// Tag slug.
    #[serde(default)]
    pub slug: String,
}

/// Names of a nested tag list, in server order.
#[must_use]
pub fn tag_names(tags: &[NestedTag]) -> Vec<String> {
    tags.iter().map(|t| t.name.clone()).collect()
}
