use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::pds4::{PdsError, Result};

const CONFIG_FILE: &str = "config.toml";

/// User configuration, resolved with CLI flags always winning over a
/// loaded value. There's no repository namespace to key configuration
/// by, so this is a flat two-layer merge rather than global/per-repo.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub jaxa: bool,
    pub dry: bool,
    pub log_level: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    jaxa: Option<bool>,
    dry: Option<bool>,
    log_level: Option<String>,
}

impl Config {
    /// Overlays `overrides` onto `self`, with any `Some`/`true` value in
    /// `overrides` winning.
    pub fn merge_cli_overrides(mut self, jaxa: bool, dry: bool, log_level: Option<String>) -> Self {
        self.jaxa = self.jaxa || jaxa;
        self.dry = self.dry || dry;
        if log_level.is_some() {
            self.log_level = log_level;
        }
        self
    }
}

/// Loads configuration from `path` if given, else from the default
/// `pdsmerge` config directory, else falls back to all-default.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => config_path(),
    };

    match config_file {
        Some(config_file) if config_file.exists() => parse_config(&config_file),
        _ => Ok(Config::default()),
    }
}

/// The path to the default `pdsmerge` config file. The file may not exist.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Reference to the `pdsmerge` project directories. These do **not**
/// necessarily exist.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "pdsmerge", "pdsmerge")
}

fn parse_config(config_file: impl AsRef<Path>) -> Result<Config> {
    let mut buffer = String::new();
    fs::File::open(config_file.as_ref())?.read_to_string(&mut buffer)?;
    let file_config: FileConfig = toml::from_str(&buffer)
        .map_err(|e| PdsError::General(format!("failed to parse config file: {e}")))?;

    Ok(Config {
        jaxa: file_config.jaxa.unwrap_or(false),
        dry: file_config.dry.unwrap_or(false),
        log_level: file_config.log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_win_over_loaded_values() {
        let loaded = Config {
            jaxa: false,
            dry: false,
            log_level: Some("info".to_string()),
        };
        let merged = loaded.merge_cli_overrides(true, false, Some("debug".to_string()));
        assert!(merged.jaxa);
        assert!(!merged.dry);
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_config_file_yields_default() {
        let config = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert!(!config.jaxa);
        assert!(!config.dry);
        assert!(config.log_level.is_none());
    }
}
