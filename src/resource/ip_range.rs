//! `netbox_ip_range` resource
//!
//! An arbitrary range of IPv4 or IPv6 addresses, inclusive of its start and
//! end address, optionally assigned to a VRF, tenant and role.
//!
//! Updates are full replacements (PUT). Required fields and the status are
//! always sent; optional references and free text are sent only when the
//! record mentions them, so an omitted reference never clears the remote
//! value.

use super::{check_reference, check_tag_names, clear_as_empty, resolve_tags};
use crate::config::IpRangeConfig;
use declarative::{
    Decoded, EnumSet, Error, Field, FieldCodec, FieldSchema, FieldType, ResourceId, Result,
    Schema, TagResolver, UpdateMode, require_non_empty,
};
use netbox::{ChoiceValue, Endpoint, NestedRef, NestedTag, ref_id, tag_names};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Kind name
pub const KIND: &str = "netbox_ip_range";

/// Declarative record for an IP range
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpRange {
    /// First address, in CIDR notation or as a bare host address
    pub start_address: String,
    /// Last address, in CIDR notation or as a bare host address
    pub end_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tenant_id: Field<ResourceId>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub role_id: Field<ResourceId>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub vrf_id: Field<ResourceId>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub comments: Field<String>,
    /// Tag names; `None` leaves remote tags unmanaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl IpRange {
    pub fn new(start_address: impl Into<String>, end_address: impl Into<String>) -> Self {
        Self {
            start_address: start_address.into(),
            end_address: end_address.into(),
            ..Self::default()
        }
    }
}

/// Write shape
#[derive(Debug, Serialize)]
pub struct IpRangePayload {
    start_address: String,
    end_address: String,
    status: String,
    #[serde(skip_serializing_if = "Field::is_unset")]
    tenant: Field<ResourceId>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    role: Field<ResourceId>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    vrf: Field<ResourceId>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    description: Field<String>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    comments: Field<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<ResourceId>>,
}

/// Read shape
#[derive(Debug, Deserialize)]
pub struct RemoteIpRange {
    id: ResourceId,
    start_address: String,
    end_address: String,
    #[serde(default)]
    status: Option<ChoiceValue>,
    #[serde(default)]
    tenant: Option<NestedRef>,
    #[serde(default)]
    role: Option<NestedRef>,
    #[serde(default)]
    vrf: Option<NestedRef>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    comments: String,
    #[serde(default)]
    tags: Vec<NestedTag>,
}

/// Codec for `netbox_ip_range`
pub struct IpRangeCodec {
    schema: Schema,
    status: EnumSet,
    default_status: String,
}

impl IpRangeCodec {
    pub fn new(config: &IpRangeConfig) -> Self {
        let status = config.status_set();
        let schema = Schema::new(KIND)
            .describe(
                "An arbitrary range of individual IPv4 or IPv6 addresses, inclusive of its \
                 starting and ending addresses.",
            )
            .field(
                FieldSchema::required("start_address", FieldType::String)
                    .describe("The first address of the IP range. Needs CIDR notation."),
            )
            .field(
                FieldSchema::required("end_address", FieldType::String)
                    .describe("The last address of the IP range. Needs CIDR notation."),
            )
            .field(
                FieldSchema::optional("status", FieldType::String)
                    .default_value(config.default_status.as_str())
                    .one_of(&status),
            )
            .field(
                FieldSchema::optional("tenant_id", FieldType::Int)
                    .describe("The ID of the tenant which this range belongs to."),
            )
            .field(
                FieldSchema::optional("role_id", FieldType::Int)
                    .describe("The ID of the role attached to this range."),
            )
            .field(
                FieldSchema::optional("vrf_id", FieldType::Int)
                    .describe("The ID of the VRF which this range belongs to."),
            )
            .field(
                FieldSchema::optional("description", FieldType::String)
                    .describe("Brief description of the IP range.")
                    .trimmed(),
            )
            .field(
                FieldSchema::optional("comments", FieldType::String)
                    .describe("Comments about the IP range. Multi-line comments are supported.")
                    .trimmed(),
            )
            .field(FieldSchema::optional("tags", FieldType::TagSet));

        Self {
            schema,
            status,
            default_status: config.default_status.clone(),
        }
    }

    /// Status sent when a record omits it
    pub fn default_status(&self) -> &str {
        &self.default_status
    }
}

/// Parse `address/prefix`; a bare address is a host address (/32 or /128)
fn check_address(field: &str, value: &str) -> Result<IpAddr> {
    require_non_empty(field, value)?;
    let invalid =
        || Error::validation(field, format!("{value:?} is not an IP address or CIDR prefix"));

    let (addr, prefix) = match value.trim().split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value.trim(), None),
    };
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    if let Some(prefix) = prefix {
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(invalid());
        }
    }
    Ok(addr)
}

impl FieldCodec for IpRangeCodec {
    type Record = IpRange;
    type Payload = IpRangePayload;
    type Remote = RemoteIpRange;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn endpoint(&self) -> &'static str {
        Endpoint::IpRanges.path()
    }

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Replace
    }

    fn validate(&self, record: &IpRange) -> Result<()> {
        let start = check_address("start_address", &record.start_address)?;
        let end = check_address("end_address", &record.end_address)?;
        if start.is_ipv4() != end.is_ipv4() {
            return Err(Error::validation(
                "end_address",
                "start and end address must be of the same family",
            ));
        }
        if start > end {
            return Err(Error::validation(
                "end_address",
                "end address must not precede start address",
            ));
        }

        if let Some(status) = &record.status {
            self.status.check(status)?;
        }
        check_reference("tenant_id", record.tenant_id.as_ref())?;
        check_reference("role_id", record.role_id.as_ref())?;
        check_reference("vrf_id", record.vrf_id.as_ref())?;
        check_tag_names(record.tags.as_ref())
    }

    fn encode(&self, record: &IpRange, tags: &dyn TagResolver) -> Result<IpRangePayload> {
        let status = record
            .status
            .clone()
            .unwrap_or_else(|| self.default_status.clone());
        self.status.check(&status)?;

        Ok(IpRangePayload {
            start_address: record.start_address.trim().to_string(),
            end_address: record.end_address.trim().to_string(),
            status,
            tenant: record.tenant_id.clone(),
            role: record.role_id.clone(),
            vrf: record.vrf_id.clone(),
            description: clear_as_empty(&record.description),
            comments: clear_as_empty(&record.comments),
            tags: resolve_tags(record.tags.as_ref(), tags)?,
        })
    }

    fn decode(&self, remote: RemoteIpRange) -> Decoded<IpRange> {
        Decoded {
            id: remote.id,
            record: IpRange {
                start_address: remote.start_address,
                end_address: remote.end_address,
                status: remote.status.map(|s| s.value),
                tenant_id: Field::from_option(ref_id(remote.tenant.as_ref())),
                role_id: Field::from_option(ref_id(remote.role.as_ref())),
                vrf_id: Field::from_option(ref_id(remote.vrf.as_ref())),
                description: Field::Value(remote.description),
                comments: Field::Value(remote.comments),
                tags: Some(tag_names(&remote.tags)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TagPolicy;
    use crate::tags::ServiceTagResolver;
    use declarative::{
        ChangeAction, InventoryService, Lifecycle, ReadOutcome, ResourceAdapter, ResourceData,
        field_changes,
    };
    use netbox::{MockNetbox, Operation};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        netbox: MockNetbox,
        adapter: ResourceAdapter<IpRangeCodec>,
        tenant: ResourceId,
        vrf: ResourceId,
    }

    fn fixture() -> Fixture {
        let _ = env_logger::builder().is_test(true).try_init();
        let netbox = MockNetbox::new();
        let tenant = netbox.seed_named(Endpoint::Tenants, "Acme");
        let vrf = netbox.seed_named(Endpoint::Vrfs, "blue");
        netbox.seed_named(Endpoint::Tags, "prod");

        let service: Arc<dyn InventoryService> = Arc::new(netbox.clone());
        let tags = Arc::new(ServiceTagResolver::new(service.clone(), TagPolicy::Strict));
        let adapter =
            ResourceAdapter::new(IpRangeCodec::new(&IpRangeConfig::default()), service, tags);
        Fixture {
            netbox,
            adapter,
            tenant,
            vrf,
        }
    }

    fn lab_range() -> IpRange {
        IpRange::new("10.0.0.1/24", "10.0.0.50/24")
    }

    #[test]
    fn test_schema_describes_status_values() {
        let codec = IpRangeCodec::new(&IpRangeConfig::default());
        let status = codec.schema().get("status").unwrap();
        assert_eq!(
            status.description,
            "Valid values are `active`, `reserved` and `deprecated`."
        );
        assert_eq!(status.default, Some(json!("active")));
        assert!(codec.schema().suppresses_whitespace("comments"));
        assert_eq!(codec.schema().required_fields(), vec!["start_address", "end_address"]);
    }

    #[test]
    fn test_status_defaults_to_active() {
        let f = fixture();
        let mut data = ResourceData::new();

        let record = f
            .adapter
            .create(&mut data, &lab_range())
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(record.status.as_deref(), Some("active"));
        let stored = f.netbox.get(Endpoint::IpRanges, data.id().unwrap()).unwrap();
        assert_eq!(stored["status"], "active");
    }

    #[test]
    fn test_create_read_round_trip() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            status: Some("reserved".into()),
            tenant_id: Field::Value(f.tenant),
            vrf_id: Field::Value(f.vrf),
            description: Field::Value("lab pool".into()),
            comments: Field::Value("first line\nsecond line\n".into()),
            tags: Some(vec!["prod".into()]),
            ..lab_range()
        };

        let read = f
            .adapter
            .create(&mut data, &input)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(read.start_address, input.start_address);
        assert_eq!(read.tenant_id, Field::Value(f.tenant));
        assert_eq!(read.role_id, Field::Unset);
        assert_eq!(read.tags, Some(vec!["prod".to_string()]));
        assert!(field_changes(f.adapter.schema(), Some(&read), &input).unwrap().is_empty());
        assert_eq!(
            f.netbox.operations(),
            vec![Operation::List, Operation::Create, Operation::Read]
        );
    }

    #[test]
    fn test_invalid_status_rejected_before_calls() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            status: Some("retired".into()),
            ..lab_range()
        };

        let err = f.adapter.create(&mut data, &input).unwrap_err();

        assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "status"));
        assert!(f.netbox.calls().is_empty());
    }

    #[test]
    fn test_missing_or_malformed_addresses() {
        let codec = IpRangeCodec::new(&IpRangeConfig::default());
        assert!(matches!(
            codec.validate(&IpRange::new("", "10.0.0.2/24")),
            Err(Error::Validation { ref field, .. }) if field == "start_address"
        ));
        assert!(codec.validate(&IpRange::new("10.0.0.one", "10.0.0.2/24")).is_err());
        assert!(codec.validate(&IpRange::new("10.0.0.1/", "10.0.0.2/24")).is_err());
        assert!(codec.validate(&IpRange::new("10.0.0.1/33", "10.0.0.2/24")).is_err());
        assert!(codec.validate(&IpRange::new("10.0.0.1/24", "2001:db8::1/64")).is_err());
        assert!(codec.validate(&IpRange::new("10.0.0.9/24", "10.0.0.2/24")).is_err());
        assert!(codec.validate(&IpRange::new("2001:db8::1/64", "2001:db8::ff/64")).is_ok());
    }

    #[test]
    fn test_bare_addresses_are_host_addresses() {
        let codec = IpRangeCodec::new(&IpRangeConfig::default());
        assert!(codec.validate(&IpRange::new("10.0.0.1", "10.0.0.10")).is_ok());
        assert!(codec.validate(&IpRange::new("10.0.0.1", "10.0.0.10/24")).is_ok());
        assert!(codec.validate(&IpRange::new("2001:db8::1", "2001:db8::ff")).is_ok());
        assert!(codec.validate(&IpRange::new("10.0.0.10", "10.0.0.1")).is_err());
        assert!(codec.validate(&IpRange::new("10.0.0.1", "2001:db8::ff")).is_err());
    }

    #[test]
    fn test_create_bare_range_without_status() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange::new("10.0.0.1", "10.0.0.10");

        let created = f
            .adapter
            .create(&mut data, &input)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(created.start_address, "10.0.0.1");
        assert_eq!(created.end_address, "10.0.0.10");
        assert_eq!(created.status.as_deref(), Some("active"));

        let stored = f.netbox.get(Endpoint::IpRanges, data.id().unwrap()).unwrap();
        assert_eq!(stored["start_address"], "10.0.0.1");
        assert_eq!(stored["status"], "active");

        let read = f.adapter.read(&mut data).unwrap().into_record().unwrap();
        assert_eq!(read.status.as_deref(), Some("active"));
        assert_eq!(data.lifecycle(), Lifecycle::ReadVerified);
    }

    #[test]
    fn test_repeated_or_reordered_tags_are_not_drift() {
        let f = fixture();
        f.netbox.seed_named(Endpoint::Tags, "edge");
        let mut data = ResourceData::new();
        let input = IpRange {
            tags: Some(vec!["prod".into(), "prod".into()]),
            ..lab_range()
        };
        f.adapter.create(&mut data, &input).unwrap();
        assert_eq!(data.record().unwrap().tags, Some(vec!["prod".to_string()]));

        let diff = f.adapter.plan(&data, &input).unwrap();
        assert_eq!(diff.action, ChangeAction::NoOp);

        let tagged = IpRange {
            tags: Some(vec!["edge".into(), "prod".into()]),
            ..lab_range()
        };
        f.adapter.update(&mut data, &tagged).unwrap();
        let reordered = IpRange {
            tags: Some(vec!["prod".into(), "edge".into()]),
            ..lab_range()
        };
        assert_eq!(f.adapter.plan(&data, &reordered).unwrap().action, ChangeAction::NoOp);
    }

    #[test]
    fn test_unknown_tag_rejected_before_create() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            tags: Some(vec!["staging".into()]),
            ..lab_range()
        };

        let err = f.adapter.create(&mut data, &input).unwrap_err();

        assert!(matches!(err, Error::UnknownReference { .. }));
        assert_eq!(f.netbox.count(Endpoint::IpRanges), 0);
    }

    #[test]
    fn test_update_without_reference_keeps_remote_value() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            tenant_id: Field::Value(f.tenant),
            ..lab_range()
        };
        f.adapter.create(&mut data, &input).unwrap();

        let changed = IpRange {
            description: Field::Value("renamed".into()),
            ..lab_range()
        };
        let read = f
            .adapter
            .update(&mut data, &changed)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(read.tenant_id, Field::Value(f.tenant));
        assert_eq!(read.description, Field::Value("renamed".into()));
        assert_eq!(data.lifecycle(), Lifecycle::Updated);
        let last = f.netbox.calls().into_iter().rev().nth(1).unwrap();
        assert_eq!(last.operation, Operation::Update);
        assert!(last.payload.unwrap().get("tenant").is_none());
    }

    #[test]
    fn test_update_with_explicit_clear_removes_reference() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            tenant_id: Field::Value(f.tenant),
            description: Field::Value("pool".into()),
            ..lab_range()
        };
        f.adapter.create(&mut data, &input).unwrap();

        let cleared = IpRange {
            tenant_id: Field::Clear,
            description: Field::Clear,
            ..lab_range()
        };
        let read = f
            .adapter
            .update(&mut data, &cleared)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(read.tenant_id, Field::Unset);
        assert_eq!(read.description, Field::Value(String::new()));
        let stored = f.netbox.get(Endpoint::IpRanges, data.id().unwrap()).unwrap();
        assert_eq!(stored["tenant"], serde_json::Value::Null);
        assert!(field_changes(f.adapter.schema(), Some(&read), &cleared).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_only_comment_change_is_not_drift() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            comments: Field::Value("managed by netbox-provider".into()),
            ..lab_range()
        };
        f.adapter.create(&mut data, &input).unwrap();

        let id = data.id().unwrap();
        f.netbox.set_field(
            Endpoint::IpRanges,
            id,
            "comments",
            json!("managed by netbox-provider\r\n"),
        );
        let read = f.adapter.read(&mut data).unwrap().into_record().unwrap();

        assert_eq!(read.comments, input.comments);
        assert_eq!(f.adapter.plan(&data, &input).unwrap().action, ChangeAction::NoOp);
    }

    #[test]
    fn test_out_of_band_delete_clears_identifier() {
        let f = fixture();
        let mut data = ResourceData::new();
        f.adapter.create(&mut data, &lab_range()).unwrap();
        f.netbox.remove(Endpoint::IpRanges, data.id().unwrap());

        assert_eq!(f.adapter.read(&mut data).unwrap(), ReadOutcome::Absent);
        assert_eq!(data.id(), None);
    }

    #[test]
    fn test_delete_twice_succeeds() {
        let f = fixture();
        let mut data = ResourceData::new();
        f.adapter.create(&mut data, &lab_range()).unwrap();
        let id = data.id().unwrap();

        f.adapter.delete(&mut data).unwrap();
        let mut again = ResourceData::imported(id);
        f.adapter.delete(&mut again).unwrap();

        assert_eq!(f.netbox.count(Endpoint::IpRanges), 0);
    }

    #[test]
    fn test_import_existing_range() {
        let f = fixture();
        let id = f.netbox.seed(
            Endpoint::IpRanges,
            json!({
                "start_address": "192.0.2.10/24",
                "end_address": "192.0.2.20/24",
                "status": "deprecated",
            }),
        );

        let data = f.adapter.import(&id.to_string()).unwrap();

        let record = data.record().unwrap();
        assert_eq!(record.status.as_deref(), Some("deprecated"));
        assert_eq!(record.tags, Some(vec![]));
    }

    #[test]
    fn test_custom_default_status() {
        let config = IpRangeConfig {
            status_options: vec!["active".into(), "reserved".into()],
            default_status: "reserved".into(),
        };
        let codec = IpRangeCodec::new(&config);
        let payload = codec.encode(&lab_range(), &declarative::NoTags).unwrap();
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(value["status"], "reserved");
        assert!(value.get("tags").is_none());
        assert!(value.get("vrf").is_none());
    }

    #[test]
    fn test_service_rejection_is_surfaced() {
        let f = fixture();
        let mut data = ResourceData::new();
        let input = IpRange {
            role_id: Field::Value(ResourceId(42)),
            ..lab_range()
        };

        let err = f.adapter.create(&mut data, &input).unwrap_err();

        assert_eq!(
            err.service_error().and_then(declarative::ServiceError::status_code),
            Some(400)
        );
        assert!(!data.exists());
    }
}
