//! Generic resource adapter
//!
//! One adapter implementation serves every managed resource kind; the
//! per-kind behaviour lives in the [`FieldCodec`] it is built with.

use crate::codec::FieldCodec;
use crate::context::{InventoryService, TagResolver};
use crate::diff::{ResourceDiff, compute_diff, refresh};
use crate::error::{Error, Result, ServiceError};
use crate::schema::Schema;
use crate::state::ResourceData;
use crate::types::{Lifecycle, ReadOutcome, ResourceId, UpdateMode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Only the identifier is needed from a create response
#[derive(Deserialize)]
struct CreatedEntity {
    id: ResourceId,
}

/// Create/Read/Update/Delete for one resource kind
///
/// Each operation issues at most two sequential calls (create→read,
/// update→read) and never retries; failures surface immediately.
///
/// # Example
///
/// ```ignore
/// let adapter = ResourceAdapter::new(codec, service, tags);
/// let mut data = ResourceData::new();
/// adapter.create(&mut data, &record)?;
/// adapter.update(&mut data, &changed)?;
/// adapter.delete(&mut data)?;
/// ```
pub struct ResourceAdapter<C: FieldCodec> {
    codec: C,
    service: Arc<dyn InventoryService>,
    tags: Arc<dyn TagResolver>,
}

impl<C: FieldCodec> ResourceAdapter<C> {
    pub fn new(codec: C, service: Arc<dyn InventoryService>, tags: Arc<dyn TagResolver>) -> Self {
        Self {
            codec,
            service,
            tags,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn schema(&self) -> &Schema {
        self.codec.schema()
    }

    /// Kind name, e.g. "netbox_ip_range"
    pub fn kind(&self) -> &'static str {
        self.codec.schema().kind
    }

    fn payload(&self, record: &C::Record) -> Result<Value> {
        self.codec.validate(record)?;
        let payload = self.codec.encode(record, self.tags.as_ref())?;
        let value = serde_json::to_value(&payload)
            .map_err(|e| Error::validation(self.kind(), e.to_string()))?;
        log::debug!("{} payload: {}", self.kind(), value);
        Ok(value)
    }

    /// Create the remote entity, then read it back
    ///
    /// If the follow-up read fails, the identifier stays assigned in `data`
    /// and the caller has to retry [`read`](Self::read).
    pub fn create(
        &self,
        data: &mut ResourceData<C::Record>,
        desired: &C::Record,
    ) -> Result<ReadOutcome<C::Record>> {
        if let Some(id) = data.id() {
            return Err(Error::validation(
                "id",
                format!("{} {id} already exists", self.kind()),
            ));
        }

        let payload = self.payload(desired)?;
        let response = self.service.create(self.codec.endpoint(), &payload)?;
        let created: CreatedEntity =
            serde_json::from_value(response).map_err(ServiceError::from)?;

        data.assign_id(created.id)?;
        log::info!("Created {} {}", self.kind(), created.id);

        self.read(data)
    }

    /// Read remote state into `data`
    ///
    /// A 404 is not an error: the identifier is cleared and
    /// [`ReadOutcome::Absent`] tells the caller to drop the record.
    pub fn read(&self, data: &mut ResourceData<C::Record>) -> Result<ReadOutcome<C::Record>> {
        let id = data.require_id()?;

        let response = match self.service.read(self.codec.endpoint(), id) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                log::warn!(
                    "{} {} no longer exists, dropping it from state",
                    self.kind(),
                    id
                );
                data.clear(Lifecycle::Absent);
                return Ok(ReadOutcome::Absent);
            }
            Err(e) => return Err(e.into()),
        };

        let remote: C::Remote = serde_json::from_value(response).map_err(ServiceError::from)?;
        let decoded = self.codec.decode(remote);
        if decoded.id != id {
            return Err(ServiceError::InvalidResponse(format!(
                "requested {} {id}, received {}",
                self.kind(),
                decoded.id
            ))
            .into());
        }

        let record = match data.record() {
            Some(prior) => refresh(self.schema(), prior, decoded.record),
            None => decoded.record,
        };
        data.record_read(record.clone());
        Ok(ReadOutcome::Present(record))
    }

    /// Send the desired record, then read it back
    ///
    /// Uses PUT or PATCH according to the codec's [`UpdateMode`].
    pub fn update(
        &self,
        data: &mut ResourceData<C::Record>,
        desired: &C::Record,
    ) -> Result<ReadOutcome<C::Record>> {
        let id = data.require_id()?;
        let payload = self.payload(desired)?;
        let endpoint = self.codec.endpoint();

        match self.codec.update_mode() {
            UpdateMode::Replace => self.service.update(endpoint, id, &payload)?,
            UpdateMode::Patch => self.service.partial_update(endpoint, id, &payload)?,
        };
        log::info!("Updated {} {}", self.kind(), id);

        let outcome = self.read(data)?;
        if outcome.is_present() {
            data.mark_updated();
        }
        Ok(outcome)
    }

    /// Delete the remote entity
    ///
    /// Idempotent: an entity that is already gone counts as deleted.
    pub fn delete(&self, data: &mut ResourceData<C::Record>) -> Result<()> {
        let Some(id) = data.id() else {
            log::debug!("{} is not tracked, nothing to delete", self.kind());
            return Ok(());
        };

        match self.service.delete(self.codec.endpoint(), id) {
            Ok(()) => log::info!("Deleted {} {}", self.kind(), id),
            Err(e) if e.is_not_found() => {
                log::debug!("{} {} was already gone", self.kind(), id);
            }
            Err(e) => return Err(e.into()),
        }

        data.clear(Lifecycle::Deleted);
        Ok(())
    }

    /// Start tracking an existing entity by identifier
    pub fn import(&self, id: &str) -> Result<ResourceData<C::Record>> {
        let id: ResourceId = id.parse()?;
        let mut data = ResourceData::imported(id);
        match self.read(&mut data)? {
            ReadOutcome::Present(_) => Ok(data),
            ReadOutcome::Absent => Err(Error::NotFound {
                kind: self.kind().to_string(),
                what: format!("id {id}"),
            }),
        }
    }

    /// Compare tracked state with a desired record without calling the service
    pub fn plan(
        &self,
        data: &ResourceData<C::Record>,
        desired: &C::Record,
    ) -> Result<ResourceDiff> {
        self.codec.validate(desired)?;
        compute_diff(self.schema(), data.id(), data.record(), desired)
    }
}
