//! Single-match lookups against a collection

use crate::codec::LookupCodec;
use crate::context::InventoryService;
use crate::error::{Error, Result, ServiceError};
use crate::schema::Schema;
use crate::types::Decoded;
use std::sync::Arc;

/// Smallest limit that still tells "one match" apart from "several"
pub const MIN_LOOKUP_LIMIT: u32 = 2;

/// Resolves a filter to exactly one entity
///
/// Zero matches is [`Error::NotFound`]; more than one is
/// [`Error::AmbiguousFilter`]. Entities are never modified.
pub struct LookupAdapter<L: LookupCodec> {
    codec: L,
    service: Arc<dyn InventoryService>,
    limit: u32,
}

impl<L: LookupCodec> LookupAdapter<L> {
    pub fn new(codec: L, service: Arc<dyn InventoryService>) -> Self {
        Self {
            codec,
            service,
            limit: MIN_LOOKUP_LIMIT,
        }
    }

    /// Set the result limit; values below 2 are raised to 2
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(MIN_LOOKUP_LIMIT);
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn codec(&self) -> &L {
        &self.codec
    }

    pub fn schema(&self) -> &Schema {
        self.codec.schema()
    }

    /// Find the single entity matching `filter`
    pub fn find(&self, filter: &L::Filter) -> Result<Decoded<L::Record>> {
        let kind = self.codec.schema().kind;
        let query = self.codec.query(filter)?.limit(self.limit);
        log::debug!("Looking up {kind} with {query}");

        let page = self.service.list(self.codec.endpoint(), &query)?;
        match page.matches() {
            0 => Err(Error::NotFound {
                kind: kind.to_string(),
                what: query.to_string(),
            }),
            1 => {
                let Some(entity) = page.results.into_iter().next() else {
                    return Err(ServiceError::InvalidResponse(format!(
                        "{kind} lookup reported a match but returned no results"
                    ))
                    .into());
                };
                let remote: L::Remote =
                    serde_json::from_value(entity).map_err(ServiceError::from)?;
                let decoded = self.codec.decode(remote);
                log::debug!("Found {kind} {}", decoded.id);
                Ok(decoded)
            }
            count => Err(Error::AmbiguousFilter {
                kind: kind.to_string(),
                count,
            }),
        }
    }
}
