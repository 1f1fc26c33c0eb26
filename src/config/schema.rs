//! Configuration schema for sdb
//!
//! Global configuration is stored at `~/.config/sdb/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Container engine selection
    pub engine: EngineConfig,

    /// Fact gathering
    pub facts: FactsConfig,

    /// Build defaults
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Container engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// "auto", "docker", "podman" or a path to a compatible binary
    pub binary: String,
}

impl EngineConfig {
    /// Probe docker, then podman
    pub const AUTO: &'static str = "auto";
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: Self::AUTO.to_string(),
        }
    }
}

/// Fact gathering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    /// Gather the built-in facts (os-id, os-version, arch) before image facts
    pub builtin: bool,

    /// Per-fact time limit in seconds, 0 disables it
    pub timeout_secs: u64,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            timeout_secs: 120,
        }
    }
}

impl FactsConfig {
    /// Time limit as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

/// Build defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Push the fingerprint tag and generated tags after tagging
    pub push: bool,

    /// Repository prefix used when the image config has none
    pub prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("binary = \"auto\""));
        assert!(toml.contains("timeout_secs = 120"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.binary, "auto");
        assert!(config.facts.builtin);
        assert!(!config.build.push);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [engine]
            binary = "podman"

            [build]
            prefix = "registry.example.com/team"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.binary, "podman");
        assert_eq!(config.build.prefix, "registry.example.com/team");
        assert_eq!(config.general.log_format, "text"); // default preserved
    }

    #[test]
    fn zero_timeout_disables_limit() {
        let mut facts = FactsConfig::default();
        assert_eq!(facts.timeout(), Some(std::time::Duration::from_secs(120)));
        facts.timeout_secs = 0;
        assert_eq!(facts.timeout(), None);
    }
}
