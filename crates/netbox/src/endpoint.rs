//! NetBox REST collections.

use serde_json::{Value, json};
use std::fmt;

/// A NetBox REST collection.
///
/// Carries the server-side rules [`MockNetbox`](crate::MockNetbox) enforces
/// for that collection: required fields, defaults, choice fields, nested
/// references and uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
    /// `ipam/ip-ranges`
    IpRanges,
    /// `dcim/device-types`
    DeviceTypes,
    /// `ipam/vlan-groups`
    VlanGroups,
    /// `extras/tags`
    Tags,
    /// `dcim/manufacturers`
    Manufacturers,
    /// `tenancy/tenants`
    Tenants,
    /// `ipam/roles`
    Roles,
    /// `ipam/vrfs`
    Vrfs,
}

impl Endpoint {
    /// Get the collection path relative to `/api/`.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::IpRanges => "ipam/ip-ranges",
            Self::DeviceTypes => "dcim/device-types",
            Self::VlanGroups => "ipam/vlan-groups",
            Self::Tags => "extras/tags",
            Self::Manufacturers => "dcim/manufacturers",
            Self::Tenants => "tenancy/tenants",
            Self::Roles => "ipam/roles",
            Self::Vrfs => "ipam/vrfs",
        }
    }

    /// Get all known collections.
    #[must_use]
    pub fn all() -> &'static [Endpoint] {
        &[
            Self::IpRanges,
            Self::DeviceTypes,
            Self::VlanGroups,
            Self::Tags,
            Self::Manufacturers,
            Self::Tenants,
            Self::Roles,
            Self::Vrfs,
        ]
    }

    /// Look up a collection by path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_matches('/');
        Self::all().iter().copied().find(|e| e.path() == path)
    }

    /// Fields the server rejects a create or full update without.
    #[must_use]
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::IpRanges => &["start_address", "end_address"],
            Self::DeviceTypes => &["model", "slug", "manufacturer"],
            Self::VlanGroups | Self::Tags | Self::Manufacturers | Self::Tenants | Self::Roles => {
                &["name", "slug"]
            }
            Self::Vrfs => &["name"],
        }
    }

    /// Values the server fills in for fields a create omits.
    #[must_use]
    pub fn defaults(&self) -> Value {
        match self {
            Self::IpRanges => json!({
                "status": "active",
                "tenant": null,
                "role": null,
                "vrf": null,
                "description": "",
                "comments": "",
                "tags": [],
            }),
            Self::DeviceTypes => json!({
                "part_number": "",
                "u_height": 1.0,
                "is_full_depth": true,
                "comments": "",
                "tags": [],
            }),
            Self::VlanGroups => json!({
                "scope_type": null,
                "scope_id": null,
                "min_vid": 1,
                "max_vid": 4094,
                "vlan_count": 0,
                "description": "",
                "tags": [],
            }),
            Self::Tags => json!({ "color": "9e9e9e", "description": "" }),
            Self::Manufacturers | Self::Tenants | Self::Roles => json!({ "description": "" }),
            Self::Vrfs => json!({ "rd": null, "description": "" }),
        }
    }

    /// Choice fields and the values the server accepts for them.
    #[must_use]
    pub fn choices(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Self::IpRanges => &[("status", &["active", "reserved", "deprecated"])],
            _ => &[],
        }
    }

    /// Fields holding a nested reference to another collection.
    #[must_use]
    pub fn references(&self) -> &'static [(&'static str, Endpoint)] {
        match self {
            Self::IpRanges => &[
                ("tenant", Self::Tenants),
                ("role", Self::Roles),
                ("vrf", Self::Vrfs),
            ],
            Self::DeviceTypes => &[("manufacturer", Self::Manufacturers)],
            _ => &[],
        }
    }

    /// Fields whose values must be unique within the collection.
    #[must_use]
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Self::DeviceTypes => &["slug"],
            Self::Tags | Self::Manufacturers | Self::Tenants | Self::Roles => &["name", "slug"],
            _ => &[],
        }
    }

    /// Whether entities carry a tag set.
    #[must_use]
    pub fn has_tags(&self) -> bool {
        matches!(self, Self::IpRanges | Self::DeviceTypes | Self::VlanGroups)
    }

    /// Field rendered as `display` in nested references.
    #[must_use]
    pub fn display_field(&self) -> &'static str {
        match self {
            Self::IpRanges => "start_address",
            Self::DeviceTypes => "model",
            _ => "name",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
