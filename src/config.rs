use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;

pub const QUALIFIER: (&str, &str, &str) = ("org", "rundialog", "rundialog");

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub sources: SourceConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub history_reverse: bool,
    #[serde(default)]
    pub terminal: Option<String>,
}

fn default_history_size() -> usize { 10 }
fn default_true() -> bool { true }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            history_reverse: false,
            terminal: None,
        }
    }
}

impl GeneralConfig {
    /// Command line prepended to argv when running in a terminal.
    pub fn terminal_argv(&self) -> Vec<String> {
        self.terminal
            .as_deref()
            .and_then(shlex::split)
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(|| vec!["xterm".to_string(), "-e".to_string()])
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DialogConfig {
    #[serde(default = "default_true")]
    pub enable_program_list: bool,
    #[serde(default = "default_true")]
    pub show_program_list: bool,
    #[serde(default = "default_true")]
    pub enable_autocompletion: bool,
    #[serde(default = "default_list_rows")]
    pub list_rows: usize,
}

fn default_list_rows() -> usize { 10 }

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            enable_program_list: true,
            show_program_list: true,
            enable_autocompletion: true,
            list_rows: default_list_rows(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LaunchConfig {
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url_handler: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub data_dirs: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl SourceConfig {
    /// XDG data directories, user directory first.
    pub fn data_dirs(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.data_dirs {
            return dirs.clone();
        }

        let mut dirs = Vec::new();
        if let Some(base_dirs) = directories::BaseDirs::new() {
            dirs.push(base_dirs.data_dir().to_path_buf());
        }
        let system = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs.extend(system.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
        dirs
    }

    pub fn locale(&self) -> Option<String> {
        if let Some(locale) = &self.locale {
            return Some(locale.clone());
        }
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
    }
}

pub fn config_path() -> PathBuf {
    let proj_dirs = ProjectDirs::from(QUALIFIER.0, QUALIFIER.1, QUALIFIER.2);
    if let Some(dirs) = &proj_dirs {
        dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing {}", config_path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.history_size, 10);
        assert!(!config.general.history_reverse);
        assert!(config.dialog.enable_program_list);
        assert!(config.dialog.enable_autocompletion);
        assert_eq!(config.dialog.list_rows, 10);
        assert!(config.launch.env.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [general]
            history_size = 3
            history_reverse = true
            terminal = "foot -e"

            [dialog]
            enable_autocompletion = false

            [launch.env]
            DISPLAY = ":1"

            [sources]
            data_dirs = ["/opt/share"]
            locale = "de_DE.UTF-8"
            "#,
        )
        .unwrap();

        assert_eq!(config.general.history_size, 3);
        assert!(config.general.history_reverse);
        assert_eq!(config.general.terminal_argv(), vec!["foot", "-e"]);
        assert!(!config.dialog.enable_autocompletion);
        assert!(config.dialog.show_program_list);
        assert_eq!(config.launch.env.get("DISPLAY").map(String::as_str), Some(":1"));
        assert_eq!(config.sources.data_dirs(), vec![PathBuf::from("/opt/share")]);
        assert_eq!(config.sources.locale().as_deref(), Some("de_DE.UTF-8"));
    }

    #[test]
    fn test_terminal_fallback() {
        let general = GeneralConfig::default();
        assert_eq!(general.terminal_argv(), vec!["xterm", "-e"]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.general.history_size, 10);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general]\nhistory_size = \"many\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
