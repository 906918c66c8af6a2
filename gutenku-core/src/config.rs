//! Engine configuration
//!
//! One TOML file with a section per component. Every section is optional and
//! falls back to its defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/gutenku"
//!
//! [thresholds]
//! sentiment = 0.4
//! allow_weak_start = true
//!
//! [genetic]
//! population_size = 80
//! selection = "rank"
//! ```

use crate::extractors::gutenberg_client::GUTENBERG_BASE_URL;
use crate::genetic::GeneticConfig;
use crate::parsing::ValidationConfig;
use crate::services::GeneratorLimits;
use crate::utils::RetryPolicy;
use crate::validators::ScoreThresholds;
use gutenku_common::config::{default_data_dir, load_toml, resolve_config_path, CONFIG_ENV_VAR};
use gutenku_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MODEL_FILE: &str = "model.json";
const LIBRARY_FILE: &str = "library.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "gutenku=info,gutenku_core=info,gutenku_common=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for the model and library files
    pub data_dir: Option<PathBuf>,
    /// Overrides `<data_dir>/model.json`
    pub model_path: Option<PathBuf>,
    /// Overrides `<data_dir>/library.json`
    pub library_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: GUTENBERG_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub validation: ValidationConfig,
    pub thresholds: ScoreThresholds,
    pub genetic: GeneticConfig,
    pub generator: GeneratorLimits,
}

impl EngineConfig {
    /// Resolve and load: CLI path, then `GUTENKU_CONFIG`, then the platform
    /// config file, then defaults
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let config: Self = load_toml(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.genetic
            .validate()
            .map_err(|e| Error::Config(format!("[genetic] {e}")))?;
        if self.generator.max_attempts == 0 {
            return Err(Error::Config(
                "[generator] max_attempts must be positive".to_string(),
            ));
        }
        if self.fetch.base_url.trim().is_empty() {
            return Err(Error::Config("[fetch] base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn model_path(&self) -> PathBuf {
        self.storage
            .model_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(MODEL_FILE))
    }

    pub fn library_path(&self) -> PathBuf {
        self.storage
            .library_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(LIBRARY_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/tmp/gk"

            [thresholds]
            sentiment = 0.25
            allow_weak_start = true

            [genetic]
            population_size = 40

            [fetch.retry]
            max_retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.thresholds.sentiment, 0.25);
        assert!(config.thresholds.allow_weak_start);
        assert_eq!(config.thresholds.markov, 0.1);
        assert_eq!(config.genetic.population_size, 40);
        assert_eq!(config.fetch.retry.max_retries, 1);
        assert_eq!(config.model_path(), PathBuf::from("/tmp/gk/model.json"));
        assert_eq!(config.library_path(), PathBuf::from("/tmp/gk/library.json"));
    }

    #[test]
    fn test_invalid_genetic_section_rejected() {
        let config: EngineConfig =
            toml::from_str("[genetic]\npopulation_size = 4\nelite_count = 9\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[genetic]"));
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generator]\nmax_attempts = 42").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        let config = EngineConfig::load(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.unwrap().generator.max_attempts, 42);
    }

    #[test]
    #[serial]
    fn test_cli_path_wins_over_env() {
        let mut cli = tempfile::NamedTempFile::new().unwrap();
        writeln!(cli, "[generator]\nmax_attempts = 7").unwrap();
        let mut env = tempfile::NamedTempFile::new().unwrap();
        writeln!(env, "[generator]\nmax_attempts = 99").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, env.path());
        let config = EngineConfig::load(Some(cli.path()));
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.unwrap().generator.max_attempts, 7);
    }
}
