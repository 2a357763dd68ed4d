//! Persistent state file
//!
//! Holds a [`MemoryStateStore`] on disk as JSON. TOML would lose the `null`
//! that marks a cleared optional field, so state is not kept in TOML like
//! the configuration is.

use crate::paths;
use anyhow::{Context, Result};
use declarative::{MemoryStateStore, StateStore};
use std::fs;
use std::path::{Path, PathBuf};

pub struct StateFile {
    path: PathBuf,
    store: MemoryStateStore,
}

impl StateFile {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::state_file()?)
    }

    /// Load state from `path`, or start empty if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                store: MemoryStateStore::new(),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let store: MemoryStateStore = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded {} entries from {}", store.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    /// Write the state back to where it was loaded from
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_json::to_string_pretty(&self.store).context("Failed to serialize state")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        log::debug!("Saved {} entries to {}", self.store.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &MemoryStateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MemoryStateStore {
        &mut self.store
    }

    /// Tracked addresses
    pub fn addresses(&self) -> Vec<String> {
        self.store.addresses()
    }
}
