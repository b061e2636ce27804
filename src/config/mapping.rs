//! Sensor id -> friendly name mapping
//!
//! The mapping file is YAML or JSON, picked by extension:
//!
//! ```yaml
//! id_to_names:
//!   1a2b: Kitchen
//!   00c142: Garage door
//! ```
//!
//! ```json
//! { "id_to_names": { "1a2b": "Kitchen", "00c142": "Garage door" } }
//! ```

use anyhow::{Context, Result};
use log::{info, warn};
use rflink_prom_core::NameLookup;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::AppConfig;

/// File name looked up in the config directory when no path is given
pub const DEFAULT_MAPPING_FILE: &str = "mapping.json";

/// File name looked up in the working directory first
pub const LEGACY_MAPPING_FILE: &str = "mapping.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMap {
    #[serde(default)]
    pub id_to_names: HashMap<String, String>,
}

impl NameMap {
    /// Load a mapping file; ids are lowercased to match parsed sensor ids
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read mapping file {}", path.display()))?;
        let raw: NameMap = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Cannot parse mapping file {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Cannot parse mapping file {}", path.display()))?
        };

        Ok(Self {
            id_to_names: raw
                .id_to_names
                .into_iter()
                .map(|(id, name)| (id.to_lowercase(), name))
                .collect(),
        })
    }

    /// Load the mapping at `path` (or the default location), or an empty
    /// mapping if it can't be read
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(e) => {
                    warn!("No mapping file: {}. Skipping", e);
                    return Self::default();
                }
            },
        };

        match Self::load_from_path(&path) {
            Ok(names) => {
                info!("Using id to name mapping: {:?}", names.id_to_names);
                names
            }
            Err(e) => {
                warn!("Cannot load mapping file {}: {:#}. Skipping", path.display(), e);
                Self::default()
            }
        }
    }

    /// `mapping.yaml` in the working directory if present, else `mapping.json`
    /// in the config directory
    pub fn default_path() -> Result<PathBuf> {
        let legacy = PathBuf::from(LEGACY_MAPPING_FILE);
        if legacy.is_file() {
            return Ok(legacy);
        }
        Ok(AppConfig::config_dir()?.join(DEFAULT_MAPPING_FILE))
    }

    pub fn len(&self) -> usize {
        self.id_to_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_names.is_empty()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl NameLookup for NameMap {
    fn lookup(&self, id: &str) -> Option<String> {
        self.id_to_names.get(id).cloned()
    }
}
