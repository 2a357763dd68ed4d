//! In-memory NetBox.
//!
//! [`MockNetbox`] implements [`InventoryService`] the way NetBox's REST API
//! behaves for the collections in [`Endpoint`]: it assigns identifiers,
//! fills server defaults, rejects writes missing required fields, expands
//! references into nested objects on read, answers 404 for unknown
//! identifiers and keeps omitted fields on PUT and PATCH alike.
//!
//! ```
//! use declarative::{InventoryService, Query};
//! use netbox::{Endpoint, MockNetbox};
//! use serde_json::json;
//!
//! let netbox = MockNetbox::new();
//! netbox.seed(Endpoint::VlanGroups, json!({"name": "Core", "slug": "core"}));
//!
//! let page = netbox
//!     .list("ipam/vlan-groups", &Query::new().filter("slug", "core"))
//!     .unwrap();
//! assert_eq!(page.count, 1);
//! assert_eq!(page.results[0]["max_vid"], 4094);
//! ```

use crate::endpoint::Endpoint;
use crate::wire::label_for;
use declarative::{InventoryService, Page, Query, ResourceId, ServiceError, ServiceResult};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Page size used when a list query sets no limit.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Fields the server owns; ignored when present in a write payload.
const SERVER_FIELDS: &[&str] = &["id", "url", "display", "created", "last_updated"];

/// Kind of call received by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// GET on a collection.
    List,
    /// POST on a collection.
    Create,
    /// GET on an entity.
    Read,
    /// PUT on an entity.
    Update,
    /// PATCH on an entity.
    PartialUpdate,
    /// DELETE on an entity.
    Delete,
}

/// A call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Kind of call.
    pub operation: Operation,
    /// Collection path as requested.
    pub endpoint: String,
    /// Target entity, for entity calls.
    pub id: Option<ResourceId>,
    /// Write payload, for create and updates.
    pub payload: Option<Value>,
}

#[derive(Debug)]
struct Failure {
    operation: Operation,
    endpoint: Endpoint,
    error: ServiceError,
}

type Entity = Map<String, Value>;

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<Endpoint, BTreeMap<u64, Entity>>,
    next_id: BTreeMap<Endpoint, u64>,
    calls: Vec<Call>,
    failures: VecDeque<Failure>,
}

/// In-memory NetBox for tests and offline use.
///
/// Clones share the same data, so a test can keep a handle while an
/// adapter owns another.
#[derive(Debug, Clone, Default)]
pub struct MockNetbox {
    inner: Arc<Mutex<Inner>>,
}

impl MockNetbox {
    /// Create an empty NetBox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an entity directly, bypassing validation.
    ///
    /// Server defaults are applied. The call is not recorded.
    pub fn seed(&self, endpoint: Endpoint, fields: Value) -> ResourceId {
        let mut inner = self.lock();
        let mut entity = defaults_for(endpoint);
        if let Value::Object(fields) = fields {
            merge(&mut entity, &fields);
        }
        let id = inner.allocate(endpoint);
        inner
            .collections
            .entry(endpoint)
            .or_default()
            .insert(id, entity);
        log::debug!("Seeded {endpoint} {id}");
        ResourceId(id)
    }

    /// Insert an entity that only needs a name, deriving its slug.
    pub fn seed_named(&self, endpoint: Endpoint, name: &str) -> ResourceId {
        let slug = name.trim().to_lowercase().replace(char::is_whitespace, "-");
        self.seed(endpoint, json!({ "name": name, "slug": slug }))
    }

    /// Stored (write-shape) fields of an entity.
    #[must_use]
    pub fn get(&self, endpoint: Endpoint, id: ResourceId) -> Option<Value> {
        self.lock()
            .collections
            .get(&endpoint)
            .and_then(|c| c.get(&id.get()))
            .map(|e| Value::Object(e.clone()))
    }

    /// Change one stored field out of band.
    ///
    /// Returns `false` if the entity does not exist.
    pub fn set_field(&self, endpoint: Endpoint, id: ResourceId, field: &str, value: Value) -> bool {
        let mut inner = self.lock();
        match inner
            .collections
            .get_mut(&endpoint)
            .and_then(|c| c.get_mut(&id.get()))
        {
            Some(entity) => {
                entity.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Delete an entity out of band.
    pub fn remove(&self, endpoint: Endpoint, id: ResourceId) -> bool {
        self.lock()
            .collections
            .get_mut(&endpoint)
            .and_then(|c| c.remove(&id.get()))
            .is_some()
    }

    /// Number of entities in a collection.
    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock().collections.get(&endpoint).map_or(0, BTreeMap::len)
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Operations received so far, without payloads.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().calls.iter().map(|c| c.operation).collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next matching call fail with `error`.
    ///
    /// Injected failures are consumed in order.
    pub fn fail_next(&self, operation: Operation, endpoint: Endpoint, error: ServiceError) {
        self.lock().failures.push_back(Failure {
            operation,
            endpoint,
            error,
        });
    }
}

fn defaults_for(endpoint: Endpoint) -> Entity {
    match endpoint.defaults() {
        Value::Object(map) => map,
        _ => Entity::new(),
    }
}

fn merge(entity: &mut Entity, fields: &Entity) {
    for (key, value) in fields {
        if !SERVER_FIELDS.contains(&key.as_str()) {
            entity.insert(key.clone(), value.clone());
        }
    }
}

fn bad_request(endpoint: Endpoint, field: &str, message: impl AsRef<str>) -> ServiceError {
    ServiceError::status(
        endpoint.path(),
        400,
        format!("{field}: {}", message.as_ref()),
    )
}

fn as_object(endpoint: Endpoint, payload: &Value) -> ServiceResult<&Entity> {
    payload.as_object().ok_or_else(|| {
        bad_request(
            endpoint,
            "non_field_errors",
            "Invalid data. Expected a dictionary.",
        )
    })
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn filter_matches(id: u64, entity: &Entity, key: &str, wanted: &str) -> bool {
    if key == "id" {
        return id.to_string() == wanted;
    }
    match entity.get(key) {
        // Unknown filters are ignored, as NetBox does
        None => true,
        Some(Value::Null) => wanted == "null",
        Some(Value::String(s)) => s == wanted,
        Some(Value::Number(n)) => matches!(
            (wanted.parse::<f64>(), n.as_f64()),
            (Ok(a), Some(b)) if (a - b).abs() < f64::EPSILON
        ),
        Some(Value::Bool(b)) => wanted.parse::<bool>().ok() == Some(*b),
        Some(_) => false,
    }
}

impl Inner {
    fn allocate(&mut self, endpoint: Endpoint) -> u64 {
        let next = self.next_id.entry(endpoint).or_insert(0);
        *next += 1;
        *next
    }

    /// Record a call, resolve its collection and apply injected failures.
    fn begin(
        &mut self,
        operation: Operation,
        path: &str,
        id: Option<ResourceId>,
        payload: Option<&Value>,
    ) -> ServiceResult<Endpoint> {
        self.calls.push(Call {
            operation,
            endpoint: path.to_string(),
            id,
            payload: payload.cloned(),
        });
        log::debug!("NetBox {operation:?} {path}");

        let endpoint = Endpoint::from_path(path)
            .ok_or_else(|| ServiceError::status(path, 404, "Page not found."))?;

        if self
            .failures
            .front()
            .is_some_and(|f| f.operation == operation && f.endpoint == endpoint)
            && let Some(failure) = self.failures.pop_front()
        {
            return Err(failure.error);
        }
        Ok(endpoint)
    }

    fn entity(&self, endpoint: Endpoint, id: ResourceId) -> ServiceResult<&Entity> {
        self.collections
            .get(&endpoint)
            .and_then(|c| c.get(&id.get()))
            .ok_or_else(|| ServiceError::not_found(endpoint.path()))
    }

    fn exists(&self, endpoint: Endpoint, id: u64) -> bool {
        self.collections
            .get(&endpoint)
            .is_some_and(|c| c.contains_key(&id))
    }

    /// Field-level checks on a write payload.
    ///
    /// `full` writes (create, PUT) must carry every required field.
    fn validate(&self, endpoint: Endpoint, fields: &Entity, full: bool) -> ServiceResult<()> {
        for required in endpoint.required_fields() {
            let present = fields.contains_key(*required);
            if (full || present) && is_blank(fields.get(*required)) {
                return Err(bad_request(endpoint, required, "This field is required."));
            }
        }

        for (field, allowed) in endpoint.choices() {
            match fields.get(*field) {
                None => {}
                Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
                Some(other) => {
                    return Err(bad_request(
                        endpoint,
                        field,
                        format!("{other} is not a valid choice."),
                    ));
                }
            }
        }

        for (field, target) in endpoint.references() {
            match fields.get(*field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    let found = value.as_u64().is_some_and(|id| self.exists(*target, id));
                    if !found {
                        return Err(bad_request(
                            endpoint,
                            field,
                            format!(
                                "Related object not found using the provided numeric ID: {value}"
                            ),
                        ));
                    }
                }
            }
        }

        if endpoint.has_tags()
            && let Some(tags) = fields.get("tags")
        {
            let Some(items) = tags.as_array() else {
                return Err(bad_request(endpoint, "tags", "Expected a list of items."));
            };
            for item in items {
                if !item.as_u64().is_some_and(|id| self.exists(Endpoint::Tags, id)) {
                    return Err(bad_request(
                        endpoint,
                        "tags",
                        format!("Related object not found using the provided numeric ID: {item}"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_unique(
        &self,
        endpoint: Endpoint,
        id: Option<u64>,
        entity: &Entity,
    ) -> ServiceResult<()> {
        let Some(collection) = self.collections.get(&endpoint) else {
            return Ok(());
        };
        for field in endpoint.unique_fields() {
            let Some(value) = entity.get(*field) else {
                continue;
            };
            let taken = collection
                .iter()
                .any(|(other, e)| Some(*other) != id && e.get(*field) == Some(value));
            if taken {
                return Err(bad_request(
                    endpoint,
                    field,
                    format!("{endpoint} with this {field} already exists."),
                ));
            }
        }
        Ok(())
    }

    fn display(&self, endpoint: Endpoint, id: u64) -> Option<String> {
        self.collections
            .get(&endpoint)
            .and_then(|c| c.get(&id))
            .and_then(|e| e.get(endpoint.display_field()))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Render the read shape of a stored entity.
    fn expand(&self, endpoint: Endpoint, id: u64, entity: &Entity) -> Value {
        let mut out = entity.clone();
        out.insert("id".into(), json!(id));
        out.insert("url".into(), json!(format!("/api/{}/{id}/", endpoint.path())));
        if let Some(display) = entity.get(endpoint.display_field()).and_then(Value::as_str) {
            out.insert("display".into(), json!(display));
        }

        for (field, target) in endpoint.references() {
            if let Some(ref_id) = entity.get(*field).and_then(Value::as_u64) {
                let mut nested = json!({
                    "id": ref_id,
                    "url": format!("/api/{}/{ref_id}/", target.path()),
                });
                if let Some(display) = self.display(*target, ref_id) {
                    nested["display"] = json!(display);
                }
                out.insert((*field).to_string(), nested);
            }
        }

        for (field, _) in endpoint.choices() {
            if let Some(value) = entity.get(*field).and_then(Value::as_str) {
                out.insert(
                    (*field).to_string(),
                    json!({ "value": value, "label": label_for(value) }),
                );
            }
        }

        if endpoint.has_tags() {
            let tags: Vec<Value> = entity
                .get("tags")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_u64)
                .filter_map(|tag_id| {
                    let tag = self.collections.get(&Endpoint::Tags)?.get(&tag_id)?;
                    Some(json!({
                        "id": tag_id,
                        "name": tag.get("name").cloned().unwrap_or(Value::Null),
                        "slug": tag.get("slug").cloned().unwrap_or(Value::Null),
                    }))
                })
                .collect();
            out.insert("tags".into(), Value::Array(tags));
        }

        Value::Object(out)
    }

    /// Apply a PUT or PATCH to a stored entity.
    fn write(
        &mut self,
        endpoint: Endpoint,
        id: ResourceId,
        payload: &Value,
        full: bool,
    ) -> ServiceResult<Value> {
        let mut entity = self.entity(endpoint, id)?.clone();
        let fields = as_object(endpoint, payload)?;
        self.validate(endpoint, fields, full)?;
        merge(&mut entity, fields);
        self.check_unique(endpoint, Some(id.get()), &entity)?;

        let response = self.expand(endpoint, id.get(), &entity);
        self.collections
            .entry(endpoint)
            .or_default()
            .insert(id.get(), entity);
        Ok(response)
    }
}

impl InventoryService for MockNetbox {
    fn list(&self, endpoint: &str, query: &Query) -> ServiceResult<Page> {
        let mut guard = self.lock();
        let target = guard.begin(Operation::List, endpoint, None, None)?;
        let inner = &*guard;

        let matching: Vec<(u64, &Entity)> = inner
            .collections
            .get(&target)
            .into_iter()
            .flatten()
            .filter(|(id, e)| {
                query
                    .filters
                    .iter()
                    .all(|(k, v)| filter_matches(**id, e, k, v))
            })
            .map(|(id, e)| (*id, e))
            .collect();

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        Ok(Page {
            count: matching.len() as u64,
            results: matching
                .into_iter()
                .take(limit)
                .map(|(id, e)| inner.expand(target, id, e))
                .collect(),
        })
    }

    fn create(&self, endpoint: &str, payload: &Value) -> ServiceResult<Value> {
        let mut inner = self.lock();
        let target = inner.begin(Operation::Create, endpoint, None, Some(payload))?;
        let fields = as_object(target, payload)?;
        inner.validate(target, fields, true)?;

        let mut entity = defaults_for(target);
        merge(&mut entity, fields);
        inner.check_unique(target, None, &entity)?;

        let id = inner.allocate(target);
        let response = inner.expand(target, id, &entity);
        inner.collections.entry(target).or_default().insert(id, entity);
        Ok(response)
    }

    fn read(&self, endpoint: &str, id: ResourceId) -> ServiceResult<Value> {
        let mut inner = self.lock();
        let target = inner.begin(Operation::Read, endpoint, Some(id), None)?;
        let entity = inner.entity(target, id)?;
        Ok(inner.expand(target, id.get(), entity))
    }

    fn update(&self, endpoint: &str, id: ResourceId, payload: &Value) -> ServiceResult<Value> {
        let mut inner = self.lock();
        let target = inner.begin(Operation::Update, endpoint, Some(id), Some(payload))?;
        inner.write(target, id, payload, true)
    }

    fn partial_update(
        &self,
        endpoint: &str,
        id: ResourceId,
        payload: &Value,
    ) -> ServiceResult<Value> {
        let mut inner = self.lock();
        let target = inner.begin(Operation::PartialUpdate, endpoint, Some(id), Some(payload))?;
        inner.write(target, id, payload, false)
    }

    fn delete(&self, endpoint: &str, id: ResourceId) -> ServiceResult<()> {
        let mut inner = self.lock();
        let target = inner.begin(Operation::Delete, endpoint, Some(id), None)?;
        inner
            .collections
            .get_mut(&target)
            .and_then(|c| c.remove(&id.get()))
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found(target.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn netbox_with_refs() -> (MockNetbox, ResourceId, ResourceId) {
        let netbox = MockNetbox::new();
        let tenant = netbox.seed_named(Endpoint::Tenants, "Acme");
        let tag = netbox.seed_named(Endpoint::Tags, "prod");
        (netbox, tenant, tag)
    }

    fn status_of(err: &ServiceError) -> Option<u16> {
        err.status_code()
    }

    #[test]
    fn test_create_applies_defaults_and_expands() {
        let (netbox, tenant, tag) = netbox_with_refs();

        let created = netbox
            .create(
                "ipam/ip-ranges",
                &json!({
                    "start_address": "10.0.0.1/24",
                    "end_address": "10.0.0.50/24",
                    "tenant": tenant.get(),
                    "tags": [tag.get()],
                }),
            )
            .unwrap();

        assert_eq!(created["id"], 1);
        assert_eq!(created["status"], json!({"value": "active", "label": "Active"}));
        assert_eq!(created["tenant"]["id"], tenant.get());
        assert_eq!(created["tenant"]["display"], "Acme");
        assert_eq!(created["role"], Value::Null);
        assert_eq!(created["tags"][0]["name"], "prod");
        assert_eq!(created["comments"], "");
    }

    #[test]
    fn test_create_requires_fields() {
        let netbox = MockNetbox::new();
        let err = netbox
            .create("ipam/ip-ranges", &json!({"start_address": "10.0.0.1/24"}))
            .unwrap_err();
        assert_eq!(status_of(&err), Some(400));
        assert!(err.to_string().contains("end_address"));
        assert_eq!(netbox.count(Endpoint::IpRanges), 0);
    }

    #[test]
    fn test_create_rejects_bad_choice_and_reference() {
        let netbox = MockNetbox::new();
        let err = netbox
            .create(
                "ipam/ip-ranges",
                &json!({"start_address": "a", "end_address": "b", "status": "bogus"}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("not a valid choice"));

        let err = netbox
            .create(
                "ipam/ip-ranges",
                &json!({"start_address": "a", "end_address": "b", "vrf": 9}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("Related object not found"));

        let err = netbox
            .create(
                "ipam/ip-ranges",
                &json!({"start_address": "a", "end_address": "b", "tags": [3]}),
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("ipam/ip-ranges returned HTTP 400: tags"));
    }

    #[test]
    fn test_read_and_delete_missing_are_404() {
        let netbox = MockNetbox::new();
        let err = netbox.read("dcim/device-types", ResourceId(4)).unwrap_err();
        assert!(err.is_not_found());
        let err = netbox.delete("dcim/device-types", ResourceId(4)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_endpoint() {
        let netbox = MockNetbox::new();
        let err = netbox.read("dcim/sites", ResourceId(1)).unwrap_err();
        assert_eq!(status_of(&err), Some(404));
    }

    #[test]
    fn test_put_requires_fields_and_keeps_omitted() {
        let (netbox, tenant, _) = netbox_with_refs();
        let id = netbox.seed(
            Endpoint::IpRanges,
            json!({"start_address": "a", "end_address": "b", "tenant": tenant.get()}),
        );

        let err = netbox
            .update("ipam/ip-ranges", id, &json!({"start_address": "c"}))
            .unwrap_err();
        assert_eq!(status_of(&err), Some(400));

        let updated = netbox
            .update(
                "ipam/ip-ranges",
                id,
                &json!({"start_address": "c", "end_address": "d", "status": "reserved"}),
            )
            .unwrap();
        assert_eq!(updated["start_address"], "c");
        assert_eq!(updated["status"]["value"], "reserved");
        assert_eq!(updated["tenant"]["id"], tenant.get());

        // Explicit null clears
        let updated = netbox
            .update(
                "ipam/ip-ranges",
                id,
                &json!({"start_address": "c", "end_address": "d", "tenant": null}),
            )
            .unwrap();
        assert_eq!(updated["tenant"], Value::Null);
    }

    #[test]
    fn test_patch_merges() {
        let netbox = MockNetbox::new();
        let maker = netbox.seed_named(Endpoint::Manufacturers, "Juniper");
        let id = netbox.seed(
            Endpoint::DeviceTypes,
            json!({"model": "MX204", "slug": "mx204", "manufacturer": maker.get()}),
        );

        let patched = netbox
            .partial_update("dcim/device-types", id, &json!({"part_number": "MX204-HW"}))
            .unwrap();
        assert_eq!(patched["model"], "MX204");
        assert_eq!(patched["part_number"], "MX204-HW");
        assert_eq!(patched["u_height"], 1.0);

        let err = netbox
            .partial_update("dcim/device-types", id, &json!({"model": ""}))
            .unwrap_err();
        assert_eq!(status_of(&err), Some(400));
    }

    #[test]
    fn test_unique_slug() {
        let netbox = MockNetbox::new();
        let maker = netbox.seed_named(Endpoint::Manufacturers, "Cisco");
        let payload = json!({"model": "A", "slug": "a", "manufacturer": maker.get()});
        netbox.create("dcim/device-types", &payload).unwrap();
        let err = netbox.create("dcim/device-types", &payload).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_list_counts_beyond_limit() {
        let netbox = MockNetbox::new();
        for scope in [1, 2, 3] {
            netbox.seed(
                Endpoint::VlanGroups,
                json!({
                    "name": "Core",
                    "slug": "core",
                    "scope_type": "dcim.site",
                    "scope_id": scope,
                }),
            );
        }
        netbox.seed(Endpoint::VlanGroups, json!({"name": "Edge", "slug": "edge"}));

        let page = netbox
            .list("ipam/vlan-groups", &Query::new().filter("slug", "core").limit(2))
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 2);

        let page = netbox
            .list(
                "ipam/vlan-groups",
                &Query::new().filter("scope_type", "dcim.site").filter("scope_id", 2),
            )
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0]["id"], 2);

        let page = netbox
            .list("ipam/vlan-groups", &Query::new().filter("scope_type", "null"))
            .unwrap();
        assert_eq!(page.results[0]["slug"], "edge");
    }

    #[test]
    fn test_injected_failure_is_consumed_once() {
        let netbox = MockNetbox::new();
        let id = netbox.seed_named(Endpoint::Tags, "prod");
        netbox.fail_next(
            Operation::Read,
            Endpoint::Tags,
            ServiceError::Transport("connection reset".into()),
        );

        assert!(netbox.read("extras/tags", id).is_err());
        assert!(netbox.read("extras/tags", id).is_ok());
        assert_eq!(netbox.operations(), vec![Operation::Read, Operation::Read]);
    }

    #[test]
    fn test_out_of_band_changes() {
        let netbox = MockNetbox::new();
        let id = netbox.seed_named(Endpoint::Tenants, "Acme");
        assert!(netbox.set_field(Endpoint::Tenants, id, "description", json!("moved")));
        assert_eq!(netbox.get(Endpoint::Tenants, id).unwrap()["description"], "moved");
        assert!(netbox.remove(Endpoint::Tenants, id));
        assert!(!netbox.remove(Endpoint::Tenants, id));
        assert!(netbox.calls().is_empty());
    }
}
