//! # netbox-provider
//!
//! Declarative NetBox resources on top of the [`declarative`] core.
//!
//! ## Kinds
//!
//! - `netbox_ip_range`: managed IP ranges ([`resource::ip_range`])
//! - `netbox_device_type`: managed device types ([`resource::device_type`])
//! - `netbox_vlan_group`: VLAN group lookup ([`data_source::vlan_group`])
//!
//! ## Example
//!
//! ```
//! use netbox_provider::{Provider, ProviderConfig, resource::IpRange};
//! use declarative::ResourceData;
//! use netbox::MockNetbox;
//! use std::sync::Arc;
//!
//! let provider = Provider::new(ProviderConfig::default(), Arc::new(MockNetbox::new()));
//!
//! let mut data = ResourceData::new();
//! let range = IpRange::new("10.0.0.1/24", "10.0.0.20/24");
//! provider.ip_ranges().create(&mut data, &range).unwrap();
//!
//! let stored = data.record().unwrap();
//! assert_eq!(stored.status.as_deref(), Some("active"));
//! ```
//!
//! The Inventory Service is any [`declarative::InventoryService`];
//! [`netbox::MockNetbox`] stands in for a live NetBox.

pub mod config;
pub mod data_source;
pub mod paths;
pub mod provider;
pub mod resource;
pub mod slug;
pub mod state;
pub mod tags;

pub use config::{ProviderConfig, TagPolicy};
pub use provider::Provider;
pub use state::StateFile;
pub use tags::ServiceTagResolver;
