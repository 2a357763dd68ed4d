//! Declared field schemas
//!
//! Every resource kind declares its input/output fields once. The schema is
//! the data-driven table the generic diff and refresh logic work from.

use crate::field::{EnumSet, valid_values_description};
use serde::Serialize;
use serde_json::Value;

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    TagSet,
}

/// Whether a field is supplied by the caller, the service, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Must be present in every record
    Required,
    /// May be omitted by the caller
    Optional,
    /// Set by the service only
    Computed,
    /// May be given by the caller; filled in by the service otherwise
    OptionalComputed,
}

/// How differences between prior and desired values are judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSuppress {
    /// Raw equality
    #[default]
    None,
    /// Equal when equal after trimming surrounding whitespace
    TrimmedEquality,
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub presence: Presence,
    pub description: String,
    /// Value used when the caller omits the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values for enum-valued fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    pub diff_suppress: DiffSuppress,
}

impl FieldSchema {
    fn new(name: &'static str, field_type: FieldType, presence: Presence) -> Self {
        Self {
            name,
            field_type,
            presence,
            description: String::new(),
            default: None,
            allowed: None,
            diff_suppress: DiffSuppress::None,
        }
    }

    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        Self::new(name, field_type, Presence::Required)
    }

    pub fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self::new(name, field_type, Presence::Optional)
    }

    pub fn computed(name: &'static str, field_type: FieldType) -> Self {
        Self::new(name, field_type, Presence::Computed)
    }

    pub fn optional_computed(name: &'static str, field_type: FieldType) -> Self {
        Self::new(name, field_type, Presence::OptionalComputed)
    }

    /// Set the human-readable description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default applied when the caller omits the field
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict to an enum set; the description lists the allowed values
    pub fn one_of(mut self, set: &EnumSet) -> Self {
        self.allowed = Some(set.allowed().to_vec());
        if self.description.is_empty() {
            self.description = set.describe();
        }
        self
    }

    /// Compare free text by trimmed equality
    pub fn trimmed(mut self) -> Self {
        self.diff_suppress = DiffSuppress::TrimmedEquality;
        self
    }

    /// Whether the caller may set this field
    pub fn is_input(&self) -> bool {
        !matches!(self.presence, Presence::Computed)
    }

    /// Full description including allowed values, if any
    pub fn documentation(&self) -> String {
        match &self.allowed {
            Some(allowed) if !self.description.contains("Valid values") => {
                format!(
                    "{} {}",
                    self.description,
                    valid_values_description(allowed)
                )
                .trim()
                .to_string()
            }
            _ => self.description.clone(),
        }
    }
}

/// Declared schema of one resource kind or data source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// Kind name, e.g. "netbox_ip_range"
    pub kind: &'static str,
    pub description: String,
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Set the kind description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a field declaration
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a field by name
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of required fields
    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.presence == Presence::Required)
            .map(|f| f.name)
            .collect()
    }

    /// Names of fields the service fills in
    pub fn computed_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.presence, Presence::Computed | Presence::OptionalComputed))
            .map(|f| f.name)
            .collect()
    }

    /// Whether a field uses trimmed-equality comparison
    pub fn suppresses_whitespace(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|f| f.diff_suppress == DiffSuppress::TrimmedEquality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        let status = EnumSet::new("status", ["active", "reserved"]);
        Schema::new("sample")
            .describe("A sample kind")
            .field(FieldSchema::required("name", FieldType::String).describe("Name."))
            .field(
                FieldSchema::optional("status", FieldType::String)
                    .default_value("active")
                    .one_of(&status),
            )
            .field(FieldSchema::optional("comments", FieldType::String).trimmed())
            .field(FieldSchema::optional_computed("slug", FieldType::String))
            .field(FieldSchema::computed("size", FieldType::Int))
    }

    #[test]
    fn test_schema_queries() {
        let schema = sample();
        assert_eq!(schema.required_fields(), vec!["name"]);
        assert_eq!(schema.computed_fields(), vec!["slug", "size"]);
        assert!(schema.suppresses_whitespace("comments"));
        assert!(!schema.suppresses_whitespace("name"));
        assert!(!schema.suppresses_whitespace("missing"));
        assert!(!schema.get("size").unwrap().is_input());
    }

    #[test]
    fn test_enum_field_description() {
        let schema = sample();
        let status = schema.get("status").unwrap();
        assert_eq!(
            status.description,
            "Valid values are `active` and `reserved`."
        );
        assert_eq!(status.documentation(), status.description);
        assert_eq!(status.default, Some(Value::from("active")));
    }

    #[test]
    fn test_documentation_appends_allowed_values() {
        let set = EnumSet::new("scope_type", ["dcim.site"]);
        let field = FieldSchema::optional("scope_type", FieldType::String)
            .describe("Scope of the group.")
            .one_of(&set);
        assert_eq!(
            field.documentation(),
            "Scope of the group. Valid values are `dcim.site`."
        );
    }

    #[test]
    fn test_schema_serializes() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["kind"], "sample");
        assert_eq!(json["fields"][1]["allowed"][0], "active");
        assert_eq!(json["fields"][2]["diff_suppress"], "trimmed_equality");
    }
}
