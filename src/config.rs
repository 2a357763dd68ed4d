//! Provider configuration
//!
//! Defaults and enum sets are configuration, handed to the codecs when the
//! provider is built. Everything has a default, so an absent file is a
//! valid (default) configuration.
//!
//! ```toml
//! [tags]
//! policy = "auto_create"
//!
//! [ip_range]
//! status_options = ["active", "reserved", "deprecated"]
//! default_status = "active"
//!
//! [device_type]
//! default_u_height = 1.0
//!
//! [vlan_group]
//! scope_type_options = ["dcim.site", "dcim.region"]
//! lookup_limit = 2
//! ```

use anyhow::{Context, Result};
use declarative::{EnumSet, MIN_LOOKUP_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Main Config Schema
// ============================================================================

/// The provider configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// Tag resolution
    #[serde(default)]
    pub tags: TagsConfig,

    /// `netbox_ip_range` settings
    #[serde(default)]
    pub ip_range: IpRangeConfig,

    /// `netbox_device_type` settings
    #[serde(default)]
    pub device_type: DeviceTypeConfig,

    /// `netbox_vlan_group` settings
    #[serde(default)]
    pub vlan_group: VlanGroupConfig,
}

impl ProviderConfig {
    /// Load from the default location, or defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = crate::paths::config_file()?;
        if !path.exists() {
            log::debug!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<PathBuf> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path.to_path_buf())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.ip_range.validate().context("Invalid [ip_range] section")?;
        self.device_type
            .validate()
            .context("Invalid [device_type] section")?;
        self.vlan_group
            .validate()
            .context("Invalid [vlan_group] section")?;
        Ok(())
    }
}

// ============================================================================
// Tags
// ============================================================================

/// What to do with a tag name that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// Fail with an unknown-reference error
    #[default]
    Strict,
    /// Create the tag with a generated slug
    AutoCreate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TagsConfig {
    #[serde(default)]
    pub policy: TagPolicy,
}

// ============================================================================
// IP Range
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRangeConfig {
    /// Allowed `status` values
    #[serde(default = "default_status_options")]
    pub status_options: Vec<String>,

    /// Status sent when a record omits it
    #[serde(default = "default_status")]
    pub default_status: String,
}

impl Default for IpRangeConfig {
    fn default() -> Self {
        Self {
            status_options: default_status_options(),
            default_status: default_status(),
        }
    }
}

impl IpRangeConfig {
    /// The status enum set
    pub fn status_set(&self) -> EnumSet {
        EnumSet::new("status", self.status_options.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.status_options.is_empty() {
            anyhow::bail!("status_options cannot be empty");
        }
        self.status_set()
            .check(&self.default_status)
            .context("default_status must be one of status_options")?;
        Ok(())
    }
}

fn default_status_options() -> Vec<String> {
    ["active", "reserved", "deprecated"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_status() -> String {
    "active".to_string()
}

// ============================================================================
// Device Type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTypeConfig {
    /// Rack units sent when a record omits `u_height`
    #[serde(default = "default_u_height")]
    pub default_u_height: f64,
}

impl Default for DeviceTypeConfig {
    fn default() -> Self {
        Self {
            default_u_height: default_u_height(),
        }
    }
}

impl DeviceTypeConfig {
    pub fn validate(&self) -> Result<()> {
        crate::resource::device_type::check_u_height(self.default_u_height)
            .context("default_u_height is not a valid rack height")?;
        Ok(())
    }
}

fn default_u_height() -> f64 {
    1.0
}

// ============================================================================
// VLAN Group
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanGroupConfig {
    /// Allowed `scope_type` filter values
    #[serde(default = "default_scope_type_options")]
    pub scope_type_options: Vec<String>,

    /// Result limit for lookups (never below 2)
    #[serde(default = "default_lookup_limit")]
    pub lookup_limit: u32,
}

impl Default for VlanGroupConfig {
    fn default() -> Self {
        Self {
            scope_type_options: default_scope_type_options(),
            lookup_limit: default_lookup_limit(),
        }
    }
}

impl VlanGroupConfig {
    /// The scope type enum set
    pub fn scope_type_set(&self) -> EnumSet {
        EnumSet::new("scope_type", self.scope_type_options.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scope_type_options.is_empty() {
            anyhow::bail!("scope_type_options cannot be empty");
        }
        if self.lookup_limit < MIN_LOOKUP_LIMIT {
            anyhow::bail!(
                "lookup_limit must be at least {MIN_LOOKUP_LIMIT}, got {}",
                self.lookup_limit
            );
        }
        Ok(())
    }
}

fn default_scope_type_options() -> Vec<String> {
    [
        "dcim.location",
        "dcim.site",
        "dcim.sitegroup",
        "dcim.region",
        "dcim.rack",
        "virtualization.cluster",
        "virtualization.clustergroup",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_lookup_limit() -> u32 {
    MIN_LOOKUP_LIMIT
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ProviderConfig::from_toml("").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.tags.policy, TagPolicy::Strict);
        assert_eq!(config.ip_range.default_status, "active");
        assert!((config.device_type.default_u_height - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.vlan_group.scope_type_options.len(), 7);
        assert_eq!(config.vlan_group.lookup_limit, 2);
    }

    #[test]
    fn test_parse_example_config() {
        let toml = r#"
[tags]
policy = "auto_create"

[ip_range]
status_options = ["active", "reserved"]
default_status = "reserved"

[device_type]
default_u_height = 2.5

[vlan_group]
scope_type_options = ["dcim.site"]
lookup_limit = 5
"#;
        let config = ProviderConfig::from_toml(toml).expect("Failed to parse config");
        assert_eq!(config.tags.policy, TagPolicy::AutoCreate);
        assert!(!config.ip_range.status_set().contains("deprecated"));
        assert_eq!(config.ip_range.default_status, "reserved");
        assert!((config.device_type.default_u_height - 2.5).abs() < f64::EPSILON);
        assert!(config.vlan_group.scope_type_set().contains("dcim.site"));
        assert_eq!(config.vlan_group.lookup_limit, 5);
    }

    #[test]
    fn test_default_status_must_be_allowed() {
        let toml = r#"
[ip_range]
status_options = ["active"]
default_status = "reserved"
"#;
        let err = ProviderConfig::from_toml(toml).unwrap_err();
        assert!(format!("{err:#}").contains("default_status"));
    }

    #[test]
    fn test_lookup_limit_below_two_rejected() {
        let err = ProviderConfig::from_toml("[vlan_group]\nlookup_limit = 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("lookup_limit"));
    }

    #[test]
    fn test_invalid_u_height_rejected() {
        assert!(ProviderConfig::from_toml("[device_type]\ndefault_u_height = 0.3\n").is_err());
        assert!(ProviderConfig::from_toml("[device_type]\ndefault_u_height = -1.0\n").is_err());
    }

    #[test]
    fn test_unknown_tag_policy_rejected() {
        assert!(ProviderConfig::from_toml("[tags]\npolicy = \"sometimes\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ProviderConfig::default();
        config.tags.policy = TagPolicy::AutoCreate;
        config.vlan_group.lookup_limit = 3;
        config.save_to(&path).unwrap();

        let loaded = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = ProviderConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read config file"));
    }
}
