use std::path::{Path, PathBuf};

use crate::args::DEFAULT_CONFIG_FILES;
use crate::error::{AppError, AppResult, ConfigError};

use tracing::{debug, warn};

use super::types::ConfigFile;

/// Loads a configuration file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        let path = PathBuf::from(path);
        return Ok(Some(load_config_file(&path)?));
    }

    match default_config_in(Path::new(".")) {
        Some(candidate) => {
            debug!("Using config file {}", candidate.display());
            Ok(Some(load_config_file(&candidate)?))
        }
        None => Ok(None),
    }
}

/// First of `swvbench.toml` / `swvbench.json` present in `dir`. When both
/// exist the TOML file wins and the JSON one is reported as ignored.
pub(crate) fn default_config_in(dir: &Path) -> Option<PathBuf> {
    let mut present = DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file());
    let chosen = present.next()?;
    for ignored in present {
        warn!(
            "Ignoring {} because {} takes precedence; pass -c to pick one explicitly.",
            ignored.display(),
            chosen.display()
        );
    }
    Some(chosen)
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
