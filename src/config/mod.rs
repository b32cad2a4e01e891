//! Configuration management module
//!
//! Handles loading, validation, and management of application configuration.
//! Values here pre-seed the resolution context, so a configured region or
//! target skips the corresponding interactive prompt.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// AWS credentials profile
    pub profile: String,

    /// AWS region; empty means resolve interactively
    pub region: String,

    /// Instance id; empty means resolve from the exec command or interactively
    pub target: String,

    /// Path or name of the delegated transport executable
    pub plugin: String,

    /// Logging level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            region: String::new(),
            target: String::new(),
            plugin: "session-manager-plugin".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(profile) = env::var("SSMGATE_PROFILE") {
            if !profile.trim().is_empty() {
                self.profile = profile;
            }
        }

        if let Ok(region) = env::var("SSMGATE_REGION") {
            self.region = region;
        }

        if let Ok(target) = env::var("SSMGATE_TARGET") {
            self.target = target;
        }

        if let Ok(plugin) = env::var("SSMGATE_PLUGIN") {
            if !plugin.trim().is_empty() {
                self.plugin = plugin;
            }
        }

        if let Ok(log_level) = env::var("SSMGATE_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|err| {
            tracing::debug!("Failed to load config: {}, using defaults", err);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.profile.trim().is_empty() {
            anyhow::bail!("Profile must not be empty");
        }

        if self.plugin.trim().is_empty() {
            anyhow::bail!("Plugin executable must not be empty");
        }

        if self.log_level.trim().is_empty() {
            anyhow::bail!("Log level must not be empty");
        }

        Ok(())
    }

    /// Display formatted configuration
    pub fn display(&self) -> Result<()> {
        println!("Current configuration:");
        println!("{:#?}", self);
        Ok(())
    }

    /// Display configuration management help
    pub fn display_help() -> Result<()> {
        println!("Configuration management commands:");
        println!("  ssmgate config show    - Show current configuration");
        println!("  ssmgate config set <key> <value> - Set configuration value");
        println!("  ssmgate config reset   - Reset to default configuration");
        Ok(())
    }

    /// Handle configuration command
    pub fn handle_command(config_file: &str, action: &Option<crate::cli::ConfigAction>) -> Result<()> {
        match action {
            Some(crate::cli::ConfigAction::Show) => {
                let config = Config::load_or_default(config_file);
                config.display()?;
            }
            Some(crate::cli::ConfigAction::Set { key, value }) => {
                let mut config = Config::load_or_default(config_file);
                match key.as_str() {
                    "profile" => config.profile = value.clone(),
                    "region" => config.region = value.clone(),
                    "target" => config.target = value.clone(),
                    "plugin" => config.plugin = value.clone(),
                    "log_level" => config.log_level = value.clone(),
                    other => anyhow::bail!("Unknown configuration key: {}", other),
                }
                config.validate()?;
                config.save_to_file(config_file)?;
                println!("Config set: {} = {}", key, value);
            }
            Some(crate::cli::ConfigAction::Reset) => {
                let config = Config::default();
                config.save_to_file(config_file)?;
                config.display()?;
            }
            None => {
                Config::display_help()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.plugin, "session-manager-plugin");
        assert!(config.region.is_empty());
    }

    #[test]
    fn test_empty_plugin_fails_validation() {
        let config = Config {
            plugin: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.plugin, deserialized.plugin);
        assert_eq!(config.profile, deserialized.profile);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: Config = toml::from_str("region = \"us-east-1\"").unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.plugin, "session-manager-plugin");
    }

    #[test]
    fn test_config_file_operations() {
        let config = Config {
            region: "ap-northeast-2".to_string(),
            ..Config::default()
        };
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.region, loaded_config.region);
    }
}
