use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub wizard: WizardConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7009
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Wizard rendering defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Template used when an instance does not name one
    #[serde(default = "default_template")]
    pub default_template: String,
    /// Redirect target when an instance has no return url
    #[serde(default = "default_return_url")]
    pub default_return_url: String,
    /// Joins labels of multi-valued selections on the review page
    #[serde(default = "default_option_delimiter")]
    pub option_delimiter: String,
    /// chrono format string for timestamp fields on the review page
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_template() -> String {
    crate::templates::WIZARD_TEMPLATE.to_string()
}

fn default_return_url() -> String {
    "/".to_string()
}

fn default_option_delimiter() -> String {
    ", ".to_string()
}

fn default_date_format() -> String {
    "%A, %-d %B %Y, %H:%M".to_string()
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            default_template: default_template(),
            default_return_url: default_return_url(),
            option_delimiter: default_option_delimiter(),
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// State directory (logs)
    pub state: String,
    /// Directory of additional `*.json` forms and `*.hbs` templates
    pub forms: String,
    /// Directory of persisted wizard records
    pub records: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether the server logs to a file (false = stderr)
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    /// Path to the config file in the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("multistep.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the server runs without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/multistep/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("multistep").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. MULTISTEP__SERVER__PORT=8080
        builder = builder.add_source(
            config::Environment::with_prefix("MULTISTEP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if !crate::wizard::format::is_valid_date_format(&config.wizard.date_format) {
            anyhow::bail!(
                "Invalid wizard.date_format '{}': not a chrono format string",
                config.wizard.date_format
            );
        }
        Ok(config)
    }

    /// Save config to ./multistep.toml
    pub fn save(&self) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(Self::local_config_path(), toml_str)
            .context("Failed to write config file")?;

        Ok(())
    }

    fn absolute(path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        Self::absolute(&self.paths.state)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Get absolute path to the forms directory
    pub fn forms_path(&self) -> PathBuf {
        Self::absolute(&self.paths.forms)
    }

    /// Get absolute path to the records directory
    pub fn records_path(&self) -> PathBuf {
        Self::absolute(&self.paths.records)
    }

    /// Address the REST server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            wizard: WizardConfig::default(),
            paths: PathsConfig {
                state: ".multistep".to_string(),
                forms: ".multistep/forms".to_string(),
                records: ".multistep/records".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, 7009);
        assert_eq!(parsed.wizard.default_template, "multistepform");
        assert_eq!(parsed.wizard.option_delimiter, ", ");
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9000\n\n[wizard]\ndefault_return_url = \"/home\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.wizard.default_return_url, "/home");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_invalid_date_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[wizard]\ndate_format = \"%Q\"\n").unwrap();

        let err = Config::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("date_format"));
    }

    #[test]
    fn test_relative_paths_are_absolutized() {
        let mut config = Config::default();
        config.paths.state = "/var/lib/multistep".to_string();
        assert_eq!(config.logs_path(), PathBuf::from("/var/lib/multistep/logs"));
        assert!(config.forms_path().is_absolute());
        assert!(config.records_path().ends_with(".multistep/records"));
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:7009");
    }
}
