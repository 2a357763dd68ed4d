//! `netbox_vlan_group` data source
//!
//! Finds exactly one VLAN group by name, slug and/or scope.

use crate::config::VlanGroupConfig;
use declarative::{
    Decoded, EnumSet, Error, FieldSchema, FieldType, LookupCodec, Query, ResourceId, Result,
    Schema,
};
use netbox::Endpoint;
use serde::{Deserialize, Serialize};

/// Kind name
pub const KIND: &str = "netbox_vlan_group";

/// Lookup filter; at least one of `name`, `slug` or `scope_type` is required
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanGroupFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,
    /// Only valid together with `scope_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<ResourceId>,
}

impl VlanGroupFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn by_scope(scope_type: impl Into<String>, scope_id: Option<ResourceId>) -> Self {
        Self {
            scope_type: Some(scope_type.into()),
            scope_id,
            ..Self::default()
        }
    }
}

/// A VLAN group as found by a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanGroup {
    pub name: String,
    pub slug: String,
    pub scope_type: Option<String>,
    pub scope_id: Option<ResourceId>,
    pub min_vid: u16,
    pub max_vid: u16,
    pub vlan_count: u64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoteVlanGroup {
    id: ResourceId,
    name: String,
    slug: String,
    #[serde(default)]
    scope_type: Option<String>,
    #[serde(default)]
    scope_id: Option<ResourceId>,
    #[serde(default = "default_min_vid")]
    min_vid: u16,
    #[serde(default = "default_max_vid")]
    max_vid: u16,
    #[serde(default)]
    vlan_count: u64,
    #[serde(default)]
    description: String,
}

fn default_min_vid() -> u16 {
    1
}

fn default_max_vid() -> u16 {
    4094
}

/// Codec for `netbox_vlan_group`
pub struct VlanGroupCodec {
    schema: Schema,
    scope_types: EnumSet,
}

impl VlanGroupCodec {
    pub fn new(config: &VlanGroupConfig) -> Self {
        let scope_types = config.scope_type_set();
        let schema = Schema::new(KIND)
            .describe(
                "VLAN groups organize VLANs within NetBox. Each group can be scoped to a \
                 region, site group, site, location, rack, cluster group or cluster.",
            )
            .field(
                FieldSchema::optional_computed("name", FieldType::String)
                    .describe("Name of the VLAN group."),
            )
            .field(
                FieldSchema::optional_computed("slug", FieldType::String)
                    .describe("Unique slug used in URLs for the VLAN group."),
            )
            .field(FieldSchema::optional("scope_type", FieldType::String).one_of(&scope_types))
            .field(
                FieldSchema::optional("scope_id", FieldType::Int)
                    .describe("ID of the scope object."),
            )
            .field(
                FieldSchema::computed("min_vid", FieldType::Int)
                    .describe("Minimum VLAN ID in the group."),
            )
            .field(
                FieldSchema::computed("max_vid", FieldType::Int)
                    .describe("Maximum VLAN ID in the group."),
            )
            .field(
                FieldSchema::computed("vlan_count", FieldType::Int)
                    .describe("Number of VLANs in the group."),
            )
            .field(
                FieldSchema::computed("description", FieldType::String)
                    .describe("Description of the VLAN group."),
            );
        Self {
            schema,
            scope_types,
        }
    }
}

fn non_blank<'a>(field: &str, value: Option<&'a String>) -> Result<Option<&'a str>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(Error::validation(field, "cannot be empty")),
        Some(v) => Ok(Some(v.as_str())),
        None => Ok(None),
    }
}

impl LookupCodec for VlanGroupCodec {
    type Filter = VlanGroupFilter;
    type Record = VlanGroup;
    type Remote = RemoteVlanGroup;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn endpoint(&self) -> &'static str {
        Endpoint::VlanGroups.path()
    }

    fn query(&self, filter: &VlanGroupFilter) -> Result<Query> {
        let name = non_blank("name", filter.name.as_ref())?;
        let slug = non_blank("slug", filter.slug.as_ref())?;
        let scope_type = non_blank("scope_type", filter.scope_type.as_ref())?;

        if name.is_none() && slug.is_none() && scope_type.is_none() {
            return Err(Error::validation(
                "filter",
                "at least one of name, slug or scope_type is required",
            ));
        }
        if let Some(scope_type) = scope_type {
            self.scope_types.check(scope_type)?;
        }
        if filter.scope_id.is_some() && scope_type.is_none() {
            return Err(Error::validation("scope_id", "requires scope_type"));
        }

        Ok(Query::new()
            .filter_opt("name", name)
            .filter_opt("slug", slug)
            .filter_opt("scope_type", scope_type)
            .filter_opt("scope_id", filter.scope_id))
    }

    fn decode(&self, remote: RemoteVlanGroup) -> Decoded<VlanGroup> {
        Decoded {
            id: remote.id,
            record: VlanGroup {
                name: remote.name,
                slug: remote.slug,
                scope_type: remote.scope_type,
                scope_id: remote.scope_id,
                min_vid: remote.min_vid,
                max_vid: remote.max_vid,
                vlan_count: remote.vlan_count,
                description: remote.description,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{LookupAdapter, ServiceError};
    use netbox::{MockNetbox, Operation};
    use serde_json::json;
    use std::sync::Arc;

    fn lookup(netbox: &MockNetbox) -> LookupAdapter<VlanGroupCodec> {
        let config = VlanGroupConfig::default();
        LookupAdapter::new(VlanGroupCodec::new(&config), Arc::new(netbox.clone()))
            .with_limit(config.lookup_limit)
    }

    fn seeded() -> MockNetbox {
        let netbox = MockNetbox::new();
        netbox.seed(
            Endpoint::VlanGroups,
            json!({
                "name": "Core", "slug": "core",
                "scope_type": "dcim.site", "scope_id": 1,
                "min_vid": 100, "max_vid": 199, "vlan_count": 12,
                "description": "core switching",
            }),
        );
        netbox.seed(
            Endpoint::VlanGroups,
            json!({"name": "Edge", "slug": "edge", "scope_type": "dcim.region", "scope_id": 7}),
        );
        netbox
    }

    #[test]
    fn test_find_by_name() {
        let netbox = seeded();
        let found = lookup(&netbox).find(&VlanGroupFilter::by_name("Core")).unwrap();

        assert_eq!(found.id, ResourceId(1));
        assert_eq!(
            found.record,
            VlanGroup {
                name: "Core".into(),
                slug: "core".into(),
                scope_type: Some("dcim.site".into()),
                scope_id: Some(ResourceId(1)),
                min_vid: 100,
                max_vid: 199,
                vlan_count: 12,
                description: "core switching".into(),
            }
        );
    }

    #[test]
    fn test_find_by_scope() {
        let netbox = seeded();
        let found = lookup(&netbox)
            .find(&VlanGroupFilter::by_scope("dcim.region", Some(ResourceId(7))))
            .unwrap();
        assert_eq!(found.record.slug, "edge");
        assert_eq!(found.record.max_vid, 4094);
    }

    #[test]
    fn test_no_match_is_not_found() {
        let netbox = seeded();
        let err = lookup(&netbox).find(&VlanGroupFilter::by_slug("dmz")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_duplicate_slug_is_ambiguous() {
        let netbox = seeded();
        netbox.seed(
            Endpoint::VlanGroups,
            json!({"name": "Core", "slug": "core", "scope_type": "dcim.site", "scope_id": 2}),
        );

        let err = lookup(&netbox).find(&VlanGroupFilter::by_slug("core")).unwrap_err();

        assert!(matches!(err, Error::AmbiguousFilter { count: 2, .. }));
        assert!(err.to_string().contains("specify a more narrow filter"));
        let call = &netbox.calls()[0];
        assert_eq!(call.operation, Operation::List);
    }

    #[test]
    fn test_filter_validation_makes_no_call() {
        let netbox = seeded();
        let lookup = lookup(&netbox);

        let err = lookup.find(&VlanGroupFilter::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "filter"));

        let scope_without_type = VlanGroupFilter {
            name: Some("Core".into()),
            scope_id: Some(ResourceId(1)),
            ..VlanGroupFilter::default()
        };
        let err = lookup.find(&scope_without_type).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "scope_id"));

        let err = lookup
            .find(&VlanGroupFilter::by_scope("dcim.planet", None))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "scope_type"));

        let err = lookup.find(&VlanGroupFilter::by_name("  ")).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));

        assert!(netbox.calls().is_empty());
    }

    #[test]
    fn test_query_carries_all_filters() {
        let codec = VlanGroupCodec::new(&VlanGroupConfig::default());
        let filter = VlanGroupFilter {
            name: Some("Core".into()),
            slug: Some("core".into()),
            scope_type: Some("dcim.site".into()),
            scope_id: Some(ResourceId(1)),
        };
        let query = codec.query(&filter).unwrap();
        assert_eq!(
            query.to_string(),
            "name=Core, slug=core, scope_type=dcim.site, scope_id=1"
        );
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_wider_limit_still_finds_single_match() {
        let netbox = seeded();
        let lookup = LookupAdapter::new(
            VlanGroupCodec::new(&VlanGroupConfig::default()),
            Arc::new(netbox.clone()),
        )
        .with_limit(5);
        lookup.find(&VlanGroupFilter::by_slug("core")).unwrap();
        assert_eq!(lookup.limit(), 5);
    }

    #[test]
    fn test_service_error_passes_through() {
        let netbox = seeded();
        netbox.fail_next(
            Operation::List,
            Endpoint::VlanGroups,
            ServiceError::status(Endpoint::VlanGroups.path(), 403, "forbidden"),
        );
        let err = lookup(&netbox).find(&VlanGroupFilter::by_slug("core")).unwrap_err();
        assert_eq!(err.service_error().and_then(ServiceError::status_code), Some(403));
    }

    #[test]
    fn test_scope_type_description() {
        let codec = VlanGroupCodec::new(&VlanGroupConfig::default());
        let scope = codec.schema().get("scope_type").unwrap();
        assert!(scope.description.starts_with("Valid values are `dcim.location`"));
        assert!(scope.description.ends_with("and `virtualization.clustergroup`."));
    }
}
