//! Tag name resolution against NetBox

use crate::config::TagPolicy;
use crate::slug::slugify;
use declarative::{
    Error, InventoryService, Query, ResourceId, Result, ServiceError, TagResolver,
};
use netbox::{Endpoint, NestedTag};
use serde_json::json;
use std::sync::Arc;

/// Resolves tag names through the `extras/tags` collection
///
/// With [`TagPolicy::AutoCreate`] a missing tag is created with a slug
/// derived from its name; otherwise it is an unknown reference.
pub struct ServiceTagResolver {
    service: Arc<dyn InventoryService>,
    policy: TagPolicy,
}

impl ServiceTagResolver {
    pub fn new(service: Arc<dyn InventoryService>, policy: TagPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> TagPolicy {
        self.policy
    }

    fn lookup(&self, name: &str) -> Result<Option<ResourceId>> {
        let query = Query::new().filter("name", name).limit(2);
        let page = self.service.list(Endpoint::Tags.path(), &query)?;
        match page.matches() {
            0 => Ok(None),
            1 => {
                let Some(entity) = page.results.into_iter().next() else {
                    return Ok(None);
                };
                let tag: NestedTag = serde_json::from_value(entity).map_err(ServiceError::from)?;
                Ok(Some(tag.id))
            }
            count => Err(Error::AmbiguousFilter {
                kind: "tag".to_string(),
                count,
            }),
        }
    }

    fn create(&self, name: &str) -> Result<ResourceId> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::validation(
                "tags",
                format!("cannot derive a slug for tag {name:?}"),
            ));
        }
        let created = self
            .service
            .create(Endpoint::Tags.path(), &json!({ "name": name, "slug": slug }))?;
        let tag: NestedTag = serde_json::from_value(created).map_err(ServiceError::from)?;
        log::info!("Created tag {} ({})", tag.name, tag.id);
        Ok(tag.id)
    }
}

impl TagResolver for ServiceTagResolver {
    fn resolve(&self, names: &[String]) -> Result<Vec<ResourceId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = match self.lookup(name)? {
                Some(id) => id,
                None => match self.policy {
                    TagPolicy::AutoCreate => self.create(name)?,
                    TagPolicy::Strict => {
                        return Err(Error::UnknownReference {
                            kind: "tag".to_string(),
                            name: name.clone(),
                        });
                    }
                },
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        log::debug!("Resolved tags {names:?} to {ids:?}");
        Ok(ids)
    }
}
