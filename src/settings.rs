use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::config::QUALIFIER;

/// Values the dialog writes back between sessions.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSettings {
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub show_program_list: Option<bool>,
}

/// JSON-backed settings; a store without a path lives in memory only.
#[derive(Debug, Default)]
pub struct SettingsFile {
    path: Option<PathBuf>,
    pub data: StoredSettings,
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER.0, QUALIFIER.1, QUALIFIER.2)
        .map(|dirs| dirs.data_dir().join("state.json"))
}

impl SettingsFile {
    pub fn in_memory(data: StoredSettings) -> Self {
        Self { path: None, data }
    }

    /// Reads `path`; missing or corrupt files start from defaults.
    pub fn open(path: PathBuf) -> Self {
        let data = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt settings {:?}: {}", path, e);
                StoredSettings::default()
            }),
            Err(_) => StoredSettings::default(),
        };
        Self { path: Some(path), data }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&self.data)?;
            fs::write(path, content)?;
        }
        Ok(())
    }
}
