//! Provider registry
//!
//! Wires every resource kind and data source to one Inventory Service, one
//! tag resolver and the loaded [`ProviderConfig`].

use crate::config::ProviderConfig;
use crate::data_source::VlanGroupCodec;
use crate::resource::{DeviceTypeCodec, IpRangeCodec};
use crate::tags::ServiceTagResolver;
use declarative::{InventoryService, LookupAdapter, ResourceAdapter, Schema, TagResolver};
use std::sync::Arc;

pub struct Provider {
    config: ProviderConfig,
    ip_ranges: ResourceAdapter<IpRangeCodec>,
    device_types: ResourceAdapter<DeviceTypeCodec>,
    vlan_groups: LookupAdapter<VlanGroupCodec>,
}

impl Provider {
    /// Build all adapters; enum sets and defaults are fixed from here on
    pub fn new(config: ProviderConfig, service: Arc<dyn InventoryService>) -> Self {
        let tags: Arc<dyn TagResolver> =
            Arc::new(ServiceTagResolver::new(service.clone(), config.tags.policy));

        let ip_ranges = ResourceAdapter::new(
            IpRangeCodec::new(&config.ip_range),
            service.clone(),
            tags.clone(),
        );
        let device_types =
            ResourceAdapter::new(DeviceTypeCodec::new(&config.device_type), service.clone(), tags);
        let vlan_groups = LookupAdapter::new(VlanGroupCodec::new(&config.vlan_group), service)
            .with_limit(config.vlan_group.lookup_limit);

        log::debug!(
            "Provider ready (tag policy {:?}, lookup limit {})",
            config.tags.policy,
            vlan_groups.limit()
        );

        Self {
            config,
            ip_ranges,
            device_types,
            vlan_groups,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn ip_ranges(&self) -> &ResourceAdapter<IpRangeCodec> {
        &self.ip_ranges
    }

    pub fn device_types(&self) -> &ResourceAdapter<DeviceTypeCodec> {
        &self.device_types
    }

    pub fn vlan_groups(&self) -> &LookupAdapter<VlanGroupCodec> {
        &self.vlan_groups
    }

    /// Schemas of all managed kinds followed by data sources
    pub fn schemas(&self) -> Vec<&Schema> {
        vec![
            self.ip_ranges.schema(),
            self.device_types.schema(),
            self.vlan_groups.schema(),
        ]
    }

    /// Look up a schema by kind name
    pub fn schema(&self, kind: &str) -> Option<&Schema> {
        self.schemas().into_iter().find(|s| s.kind == kind)
    }
}
