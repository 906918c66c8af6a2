//! Configuration file resolution and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GUTENKU_CONFIG";

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory (`~/.config/gutenku/config.toml` on Linux)
///
/// Returns `None` when no tier yields an existing file; callers then run on defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        info!(path = %path.display(), "Using config file from command line");
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            info!(path = %path, env = env_var_name, "Using config file from environment");
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    let user_config = default_config_file()?;
    if user_config.exists() {
        info!(path = %user_config.display(), "Using config file from config directory");
        Some(user_config)
    } else {
        None
    }
}

/// Default config file location for the platform
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gutenku").join("config.toml"))
}

/// OS-dependent default data folder (models, downloaded books)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gutenku"))
        .unwrap_or_else(|| PathBuf::from("./gutenku_data"))
}

/// Load a TOML config file into `T`.
///
/// A missing file at an explicitly resolved path is an error; a `None` path
/// falls back to `T::default()`.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to read config file");
        Error::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let config = toml::from_str::<T>(&content)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        retries: u32,
    }

    #[test]
    #[serial]
    fn test_cli_argument_wins_over_environment() {
        std::env::set_var("GUTENKU_TEST_CONFIG", "/tmp/from-env.toml");
        let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), "GUTENKU_TEST_CONFIG");
        std::env::remove_var("GUTENKU_TEST_CONFIG");

        assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));
    }

    #[test]
    #[serial]
    fn test_environment_used_without_cli_argument() {
        std::env::set_var("GUTENKU_TEST_CONFIG", "/tmp/from-env.toml");
        let resolved = resolve_config_path(None, "GUTENKU_TEST_CONFIG");
        std::env::remove_var("GUTENKU_TEST_CONFIG");

        assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));
    }

    #[test]
    fn test_load_toml_defaults_without_path() {
        let sample: Sample = load_toml(None).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_load_toml_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retries = 4").unwrap();

        let sample: Sample = load_toml(Some(file.path())).unwrap();
        assert_eq!(sample.retries, 4);
        assert_eq!(sample.name, "");
    }

    #[test]
    fn test_load_toml_missing_file_is_error() {
        let result: Result<Sample> = load_toml(Some(Path::new("/nonexistent/gutenku.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_toml_invalid_syntax_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retries = = 4").unwrap();

        let result: Result<Sample> = load_toml(Some(file.path()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
