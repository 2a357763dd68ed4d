//! Field-level building blocks shared by codecs
//!
//! [`Field`] separates "not set" from "set to empty" so that updates never
//! clear a remote value the caller did not mention.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An optional field with three states
///
/// Use with `#[serde(default, skip_serializing_if = "Field::is_unset")]`
/// so that `Unset` never reaches a payload, while `Clear` is sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// Not mentioned by the caller; never sent
    #[default]
    Unset,
    /// Explicitly emptied; sent as `null`
    Clear,
    /// Set to a value
    Value(T),
}

impl<T> Field<T> {
    /// Check if the field was not mentioned
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Check if the field was mentioned (set or cleared)
    pub fn is_present(&self) -> bool {
        !self.is_unset()
    }

    /// Borrow the value, if set
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Take the value, if set
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` becomes `Unset`
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Value)
    }

    /// Map the value, keeping `Unset`/`Clear`
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Unset => Field::Unset,
            Self::Clear => Field::Clear,
            Self::Value(v) => Field::Value(f(v)),
        }
    }

    /// Fallible map, keeping `Unset`/`Clear`
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Field<U>> {
        Ok(match self {
            Self::Unset => Field::Unset,
            Self::Clear => Field::Clear,
            Self::Value(v) => Field::Value(f(v)?),
        })
    }

    /// Borrowing view
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Unset => Field::Unset,
            Self::Clear => Field::Clear,
            Self::Value(v) => Field::Value(v),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unset | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    // Absent keys come from `#[serde(default)]`; an explicit null is a clear.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|v| v.map_or(Self::Clear, Self::Value))
    }
}

/// A fixed set of allowed values for an enum-valued string field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSet {
    field: &'static str,
    allowed: Vec<String>,
}

impl EnumSet {
    pub fn new<I, S>(field: &'static str, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Field this set applies to
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Allowed values, in declaration order
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Check membership (case-sensitive)
    pub fn contains(&self, value: &str) -> bool {
        self.allowed.iter().any(|a| a == value)
    }

    /// Fail with `InvalidValue` unless `value` is allowed
    pub fn check(&self, value: &str) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(Error::InvalidValue {
                field: self.field.to_string(),
                value: value.to_string(),
                allowed: self.allowed.clone(),
            })
        }
    }

    /// Schema description listing the allowed values
    pub fn describe(&self) -> String {
        valid_values_description(&self.allowed)
    }
}

/// "Valid values are `a`, `b` and `c`."
pub fn valid_values_description<S: AsRef<str>>(values: &[S]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("`{}`", v.as_ref())).collect();
    let joined = match quoted.as_slice() {
        [] => return "No values are valid.".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    };
    format!("Valid values are {joined}.")
}

/// Equality ignoring surrounding whitespace
pub fn trimmed_eq(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Fail unless a required string field has content
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::required(field))
    } else {
        Ok(())
    }
}
