//! Field-level diff computation for records

use crate::error::{Error, Result};
use crate::field::trimmed_eq;
use crate::schema::{DiffSuppress, FieldSchema, FieldType, Schema};
use crate::types::ResourceId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What reconciling a record would do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// No identifier yet; the entity will be created
    Create,
    /// Tracked entity differs from the desired record
    Update,
    /// Nothing to do
    NoOp,
}

/// One field that differs between prior and desired state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// Prior value (`None` when never known)
    pub from: Option<Value>,
    /// Desired value (`null` for an explicit clear)
    pub to: Value,
}

/// A diff between tracked and desired state of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Kind of the resource
    pub kind: String,
    /// Identifier, when tracked
    pub id: Option<ResourceId>,
    pub action: ChangeAction,
    pub changes: Vec<FieldChange>,
}

impl ResourceDiff {
    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        self.action == ChangeAction::Create
    }

    /// Check if this diff represents a modification
    pub fn is_modification(&self) -> bool {
        self.action == ChangeAction::Update
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.action != ChangeAction::NoOp
    }

    /// Find the change for a field
    pub fn change(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }
}

fn to_object<R: Serialize>(record: &R) -> Result<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::validation(
            "record",
            format!("expected an object, got {other}"),
        )),
        Err(e) => Err(Error::validation("record", e.to_string())),
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

fn values_equal(field: &FieldSchema, prior: Option<&Value>, desired: &Value) -> bool {
    if desired.is_null() {
        return is_empty(prior);
    }
    let Some(prior) = prior else {
        return false;
    };
    match (prior, desired) {
        (Value::String(a), Value::String(b))
            if field.diff_suppress == DiffSuppress::TrimmedEquality =>
        {
            trimmed_eq(a, b)
        }
        (Value::Array(a), Value::Array(b)) if field.field_type == FieldType::TagSet => {
            same_members(a, b)
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

/// Set equality: order and repeats don't matter
fn same_members(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|v| b.contains(v)) && b.iter().all(|v| a.contains(v))
}

/// Fields whose desired value differs from the prior record
///
/// Fields the caller left unset are not managed and never show up, unless
/// the schema declares a default for them. Computed-only fields are ignored.
pub fn field_changes<R: Serialize>(
    schema: &Schema,
    prior: Option<&R>,
    desired: &R,
) -> Result<Vec<FieldChange>> {
    let prior = match prior {
        Some(p) => to_object(p)?,
        None => Map::new(),
    };
    let desired = to_object(desired)?;

    let mut changes = Vec::new();
    for field in schema.fields.iter().filter(|f| f.is_input()) {
        let Some(want) = desired.get(field.name).or(field.default.as_ref()) else {
            continue;
        };
        let have = prior.get(field.name);
        if values_equal(field, have, want) {
            continue;
        }
        changes.push(FieldChange {
            field: field.name.to_string(),
            from: have.cloned(),
            to: want.clone(),
        });
    }
    Ok(changes)
}

/// Compute the diff for a tracked resource
pub fn compute_diff<R: Serialize>(
    schema: &Schema,
    id: Option<ResourceId>,
    prior: Option<&R>,
    desired: &R,
) -> Result<ResourceDiff> {
    let (action, changes) = match id {
        None => (ChangeAction::Create, field_changes(schema, None, desired)?),
        Some(_) => {
            let changes = field_changes(schema, prior, desired)?;
            if changes.is_empty() {
                (ChangeAction::NoOp, changes)
            } else {
                (ChangeAction::Update, changes)
            }
        }
    };
    Ok(ResourceDiff {
        kind: schema.kind.to_string(),
        id,
        action,
        changes,
    })
}

/// Keep prior free text when freshly read text differs only in whitespace
///
/// Applies to fields declared with trimmed-equality suppression, so a
/// refresh does not report a change the diff would suppress anyway.
pub fn refresh<R: Serialize + DeserializeOwned>(schema: &Schema, prior: &R, fresh: R) -> R {
    let (Ok(prior_map), Ok(mut fresh_map)) = (to_object(prior), to_object(&fresh)) else {
        return fresh;
    };

    let mut kept = 0;
    for field in &schema.fields {
        if field.diff_suppress != DiffSuppress::TrimmedEquality {
            continue;
        }
        if let (Some(Value::String(old)), Some(Value::String(new))) =
            (prior_map.get(field.name), fresh_map.get(field.name))
            && old != new
            && trimmed_eq(old, new)
        {
            fresh_map.insert(field.name.to_string(), Value::String(old.clone()));
            kept += 1;
        }
    }

    if kept == 0 {
        return fresh;
    }
    match serde_json::from_value(Value::Object(fresh_map)) {
        Ok(record) => record,
        Err(e) => {
            log::debug!("Keeping refreshed {} record as read: {}", schema.kind, e);
            fresh
        }
    }
}
