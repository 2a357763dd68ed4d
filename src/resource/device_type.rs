//! `netbox_device_type` resource
//!
//! A particular make and model of hardware. Updates are partial (PATCH);
//! the slug and rack height are sent on every write.

use super::{check_tag_names, clear_as_empty, resolve_tags};
use crate::config::DeviceTypeConfig;
use crate::slug::{self, slugify};
use declarative::{
    Decoded, Error, Field, FieldCodec, FieldSchema, FieldType, ResourceId, Result, Schema,
    TagResolver, UpdateMode, require_non_empty,
};
use netbox::{Endpoint, NestedRef, NestedTag, tag_names};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Kind name
pub const KIND: &str = "netbox_device_type";

static SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Declarative record for a device type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceType {
    /// Model name, e.g. "Catalyst 9300"
    pub model: String,
    /// Generated from the model when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub manufacturer_id: ResourceId,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub part_number: Field<String>,
    /// Rack units, in steps of 0.5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_full_depth: Option<bool>,
    /// Tag names; `None` leaves remote tags unmanaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl DeviceType {
    pub fn new(model: impl Into<String>, manufacturer_id: ResourceId) -> Self {
        Self {
            model: model.into(),
            manufacturer_id,
            ..Self::default()
        }
    }

    /// Slug that will be sent: the given one, or one derived from the model
    pub fn effective_slug(&self) -> String {
        match &self.slug {
            Some(slug) => slug.clone(),
            None => slugify(&self.model),
        }
    }
}

/// Write shape
#[derive(Debug, Serialize)]
pub struct DeviceTypePayload {
    model: String,
    slug: String,
    manufacturer: ResourceId,
    #[serde(skip_serializing_if = "Field::is_unset")]
    part_number: Field<String>,
    u_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_full_depth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<ResourceId>>,
}

/// Read shape
#[derive(Debug, Deserialize)]
pub struct RemoteDeviceType {
    id: ResourceId,
    model: String,
    slug: String,
    manufacturer: NestedRef,
    #[serde(default)]
    part_number: String,
    #[serde(default)]
    u_height: Option<f64>,
    #[serde(default)]
    is_full_depth: Option<bool>,
    #[serde(default)]
    tags: Vec<NestedTag>,
}

/// Check a rack height: finite, non-negative, a multiple of 0.5
pub fn check_u_height(value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 || (value * 2.0).fract() != 0.0 {
        return Err(Error::validation(
            "u_height",
            format!("{value} is not a non-negative multiple of 0.5"),
        ));
    }
    Ok(())
}

/// Codec for `netbox_device_type`
pub struct DeviceTypeCodec {
    schema: Schema,
    default_u_height: f64,
}

impl DeviceTypeCodec {
    pub fn new(config: &DeviceTypeConfig) -> Self {
        let schema = Schema::new(KIND)
            .describe(
                "A particular make and model of hardware. Device types define the physical \
                 attributes of a device (rack height and depth).",
            )
            .field(
                FieldSchema::required("model", FieldType::String)
                    .describe("Model of the device type (e.g. 'Catalyst 9300')."),
            )
            .field(FieldSchema::optional_computed("slug", FieldType::String).describe(
                "Unique slug used in URLs for the device type. If not provided, it will be \
                 generated from the model.",
            ))
            .field(
                FieldSchema::required("manufacturer_id", FieldType::Int)
                    .describe(
                        "ID of the manufacturer of the device type. \
                         Must already exist in NetBox.",
                    ),
            )
            .field(
                FieldSchema::optional("part_number", FieldType::String)
                    .describe("Part number for the device type (e.g. 'C9300-24P')."),
            )
            .field(
                FieldSchema::optional("u_height", FieldType::Float)
                    .describe(
                        "Height of the device in rack units (u), in increments of 0.5 \
                         (e.g. 0, 0.5, 2, 2.5, ...).",
                    )
                    .default_value(config.default_u_height),
            )
            .field(
                FieldSchema::optional("is_full_depth", FieldType::Bool)
                    .describe("Indicates if the device is full rack depth."),
            )
            .field(FieldSchema::optional("tags", FieldType::TagSet));

        Self {
            schema,
            default_u_height: config.default_u_height,
        }
    }
}

impl FieldCodec for DeviceTypeCodec {
    type Record = DeviceType;
    type Payload = DeviceTypePayload;
    type Remote = RemoteDeviceType;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn endpoint(&self) -> &'static str {
        Endpoint::DeviceTypes.path()
    }

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Patch
    }

    fn validate(&self, record: &DeviceType) -> Result<()> {
        require_non_empty("model", &record.model)?;
        if record.manufacturer_id.get() == 0 {
            return Err(Error::required("manufacturer_id"));
        }

        let candidate = record.effective_slug();
        if !slug::valid_length(&candidate) {
            return Err(Error::validation(
                "slug",
                format!("must be between 1 and {} characters", slug::MAX_SLUG_LEN),
            ));
        }
        if !SLUG_CHARS.is_match(&candidate) {
            return Err(Error::validation(
                "slug",
                "may only contain letters, numbers, underscores or hyphens",
            ));
        }

        if let Some(u_height) = record.u_height {
            check_u_height(u_height)?;
        }
        check_tag_names(record.tags.as_ref())
    }

    fn encode(&self, record: &DeviceType, tags: &dyn TagResolver) -> Result<DeviceTypePayload> {
        Ok(DeviceTypePayload {
            model: record.model.clone(),
            slug: record.effective_slug(),
            manufacturer: record.manufacturer_id,
            part_number: clear_as_empty(&record.part_number),
            u_height: record.u_height.unwrap_or(self.default_u_height),
            is_full_depth: record.is_full_depth,
            tags: resolve_tags(record.tags.as_ref(), tags)?,
        })
    }

    fn decode(&self, remote: RemoteDeviceType) -> Decoded<DeviceType> {
        Decoded {
            id: remote.id,
            record: DeviceType {
                model: remote.model,
                slug: Some(remote.slug),
                manufacturer_id: remote.manufacturer.id,
                part_number: Field::Value(remote.part_number),
                u_height: remote.u_height,
                is_full_depth: remote.is_full_depth,
                tags: Some(tag_names(&remote.tags)),
            },
        }
    }
}
