//! Managed NetBox resource kinds
//!
//! Each kind is a typed record plus a [`FieldCodec`](declarative::FieldCodec);
//! CRUD itself is the generic [`ResourceAdapter`](declarative::ResourceAdapter).

pub mod device_type;
pub mod ip_range;

pub use device_type::{DeviceType, DeviceTypeCodec};
pub use ip_range::{IpRange, IpRangeCodec};

use declarative::{Error, Field, ResourceId, Result, TagResolver};

/// Free-text fields cannot be null in NetBox; clearing sends ""
pub(crate) fn clear_as_empty(field: &Field<String>) -> Field<String> {
    match field {
        Field::Clear => Field::Value(String::new()),
        other => other.clone(),
    }
}

/// Resolve a managed tag set; `None` leaves remote tags alone
pub(crate) fn resolve_tags(
    tags: Option<&Vec<String>>,
    resolver: &dyn TagResolver,
) -> Result<Option<Vec<ResourceId>>> {
    tags.map(|names| resolver.resolve(names)).transpose()
}

pub(crate) fn check_tag_names(tags: Option<&Vec<String>>) -> Result<()> {
    for name in tags.into_iter().flatten() {
        if name.trim().is_empty() {
            return Err(Error::validation("tags", "tag names cannot be empty"));
        }
    }
    Ok(())
}

/// Reference identifiers start at 1
pub(crate) fn check_reference(field: &str, id: Field<&ResourceId>) -> Result<()> {
    match id {
        Field::Value(ResourceId(0)) => Err(Error::validation(field, "identifier must be positive")),
        _ => Ok(()),
    }
}
