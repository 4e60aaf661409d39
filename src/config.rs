//! Builder configuration, loaded from TOML.
//!
//! ```toml
//! default_qualifier = "fail"
//! macro_style = "braced"
//! max_dns_lookups = 10
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spf::{MacroStyle, Qualifier};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "spfgen.toml";

/// RFC 7208 Section 4.6.4 limit on DNS-querying terms.
pub const RFC_LOOKUP_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Settings shared by every build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Qualifier for the terminal `all` of new requests.
    pub default_qualifier: Qualifier,

    /// How macros in `exists` values are written.
    pub macro_style: MacroStyle,

    /// Records above this many DNS lookups are built but logged as a warning.
    pub max_dns_lookups: usize,

    pub logging: LoggingConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_qualifier: Qualifier::SoftFail,
            macro_style: MacroStyle::Compact,
            max_dns_lookups: RFC_LOOKUP_LIMIT,
            logging: LoggingConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. spfgen.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dns_lookups == 0 {
            return Err(ConfigError::Validation(
                "max_dns_lookups cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.default_qualifier, Qualifier::SoftFail);
        assert_eq!(config.macro_style, MacroStyle::Compact);
        assert_eq!(config.max_dns_lookups, 10);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(BuilderConfig::from_toml("").unwrap(), BuilderConfig::default());
    }

    #[test]
    fn full_toml() {
        let config = BuilderConfig::from_toml(
            r#"
            default_qualifier = "fail"
            macro_style = "braced"
            max_dns_lookups = 8

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_qualifier, Qualifier::Fail);
        assert_eq!(config.macro_style, MacroStyle::Braced);
        assert_eq!(config.max_dns_lookups, 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn bad_toml() {
        assert!(matches!(
            BuilderConfig::from_toml("default_qualifier = \"reject\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_lookup_limit_rejected() {
        let config = BuilderConfig {
            max_dns_lookups: 0,
            ..BuilderConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_qualifier = \"neutral\"").unwrap();
        let config = BuilderConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.default_qualifier, Qualifier::Neutral);
    }

    #[test]
    fn load_missing_file() {
        let err = BuilderConfig::load(Some(Path::new("/nonexistent/spfgen.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }
}
