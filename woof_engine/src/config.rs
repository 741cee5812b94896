use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Slots available for preloaded WADs and patches.
pub const MAX_PRELOAD_FILES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigValues {
    pub preload_wads: Vec<String>,
    pub preload_patches: Vec<String>,
    /// Melt between screens; when false state changes cut straight over.
    pub screen_melt: bool,
}

impl Default for ConfigValues {
    fn default() -> Self {
        ConfigValues {
            preload_wads: Vec::new(),
            preload_patches: Vec::new(),
            screen_melt: true,
        }
    }
}

/// Persisted engine settings backed by a JSON file.
#[derive(Debug, Default, Clone)]
pub struct EngineConfig {
    values: ConfigValues,
    dirty: bool,
    backing_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Loads `path` when it exists; a missing file yields the defaults.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let mut config = EngineConfig {
            values: ConfigValues::default(),
            dirty: false,
            backing_path: path.map(|p| p.to_path_buf()),
        };
        if let Some(p) = path {
            if p.exists() {
                let raw = fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file: {}", p.display()))?;
                config.values = serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse config json: {}", p.display()))?;
            }
        }
        Ok(config)
    }

    pub fn with_values(values: ConfigValues) -> Self {
        EngineConfig {
            values,
            dirty: false,
            backing_path: None,
        }
    }

    pub fn values(&self) -> &ConfigValues {
        &self.values
    }

    /// Non-blank preloaded WAD names, leading whitespace removed.
    pub fn preloaded_wads(&self) -> Vec<&str> {
        preload_slots(&self.values.preload_wads)
    }

    pub fn preloaded_patches(&self) -> Vec<&str> {
        preload_slots(&self.values.preload_patches)
    }

    pub fn set_preloaded_wad(&mut self, slot: usize, name: impl Into<String>) {
        set_slot(&mut self.values.preload_wads, slot, name.into());
        self.dirty = true;
    }

    pub fn set_preloaded_patch(&mut self, slot: usize, name: impl Into<String>) {
        set_slot(&mut self.values.preload_patches, slot, name.into());
        self.dirty = true;
    }

    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.backing_path.as_ref() else {
            self.dirty = false;
            return Ok(());
        };

        if !self.dirty {
            return Ok(());
        }

        let json =
            serde_json::to_string_pretty(&self.values).context("serializing config to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }
}

fn preload_slots(slots: &[String]) -> Vec<&str> {
    slots
        .iter()
        .take(MAX_PRELOAD_FILES)
        .map(|name| name.trim_start())
        .filter(|name| !name.is_empty())
        .collect()
}

fn set_slot(slots: &mut Vec<String>, slot: usize, name: String) {
    if slot >= MAX_PRELOAD_FILES {
        log::warn!("ignoring preload slot {slot}; only {MAX_PRELOAD_FILES} are available");
        return;
    }
    if slots.len() <= slot {
        slots.resize(slot + 1, String::new());
    }
    slots[slot] = name;
}
