//! Read-only NetBox lookups
//!
//! Each data source is a filter type plus a [`LookupCodec`](declarative::LookupCodec)
//! driven by the generic [`LookupAdapter`](declarative::LookupAdapter).

pub mod vlan_group;

pub use vlan_group::{VlanGroup, VlanGroupCodec, VlanGroupFilter};
