//! Engine configuration, persisted as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Knobs for the knowledge base and the `ftms` driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum successful productions per `assert` call before forward
    /// chaining gives up (default: 100,000).
    #[serde(default = "default_max_derivations")]
    pub max_derivations: usize,
    /// Check every provenance invariant after each assert and retract.
    #[serde(default)]
    pub verify_integrity: bool,
    /// `tracing` filter used by the CLI when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_max_derivations() -> usize {
    100_000
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_derivations: default_max_derivations(),
            verify_integrity: false,
            log_filter: default_log_filter(),
        }
    }
}

impl EngineConfig {
    /// Config used by tests: integrity checked after every operation.
    pub fn strict() -> Self {
        Self {
            verify_integrity: true,
            ..Default::default()
        }
    }

    /// Reject values the knowledge base cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_derivations == 0 {
            return Err(ConfigError::Invalid {
                message: "max_derivations must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_derivations, 100_000);
        assert!(!config.verify_integrity);
        assert_eq!(config.log_filter, "warn");
        assert!(EngineConfig::strict().verify_integrity);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("verify_integrity = true").unwrap();
        assert!(config.verify_integrity);
        assert_eq!(config.max_derivations, 100_000);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ftms.toml");
        let config = EngineConfig {
            max_derivations: 42,
            verify_integrity: true,
            log_filter: "forward_tms=debug".into(),
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn zero_derivation_budget_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ftms.toml");
        std::fs::write(&path, "max_derivations = 0").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/ftms.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
