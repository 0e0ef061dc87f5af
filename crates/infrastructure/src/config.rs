//! Agent configuration: structs, parsing, and validation.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum configured feeds, to bound startup fetch fan-out.
const MAX_FEEDS: usize = 100;

// ── Config errors ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

fn validation(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        message: message.into(),
    }
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub agent: AgentInfo,

    #[serde(default)]
    pub intel: IntelConfig,
}

impl AgentConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.name.is_empty() {
            return Err(validation("agent.name", "agent name must not be empty"));
        }
        self.intel.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ── Intel section ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelConfig {
    /// How often all feeds are refreshed, in seconds. Default: 300.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Per-feed fetch timeout, in seconds. Default: 10.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            feeds: Vec::new(),
        }
    }
}

impl IntelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(validation(
                "intel.refresh_interval_secs",
                "refresh interval must be > 0",
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(validation(
                "intel.fetch_timeout_secs",
                "fetch timeout must be > 0",
            ));
        }
        if self.feeds.len() > MAX_FEEDS {
            return Err(validation(
                "intel.feeds",
                format!("at most {MAX_FEEDS} feeds supported"),
            ));
        }

        let mut seen = HashSet::new();
        for (idx, feed) in self.feeds.iter().enumerate() {
            feed.validate(idx)?;
            if !seen.insert(feed.id.as_str()) {
                return Err(validation(
                    format!("intel.feeds[{idx}].id"),
                    format!("duplicate feed id '{}'", feed.id),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Unique feed identifier; also used as the alert reason label.
    pub id: String,

    /// Feed download URL (http or https).
    pub url: String,

    /// Feed payload format.
    pub format: FeedFormat,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl FeedEntry {
    fn validate(&self, idx: usize) -> Result<(), ConfigError> {
        let prefix = format!("intel.feeds[{idx}]");

        if self.id.is_empty() {
            return Err(validation(
                format!("{prefix}.id"),
                "feed id must not be empty",
            ));
        }
        if self.url.is_empty() {
            return Err(validation(
                format!("{prefix}.url"),
                "feed URL must not be empty",
            ));
        }
        // Only http:// and https:// schemes, to prevent SSRF surprises.
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(validation(
                format!("{prefix}.url"),
                format!(
                    "feed URL must use http:// or https:// scheme, got '{}'",
                    self.url
                ),
            ));
        }
        Ok(())
    }
}

/// Feed payload format; selects the parser, not the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    /// One IP per line, `#` comments.
    IpList,
    /// JSON object with a `data` array of `{ioc_value, port}` entries.
    IpPortJson,
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
agent:
  name: flowsentry
  log_level: debug
  log_format: json
intel:
  refresh_interval_secs: 60
  fetch_timeout_secs: 5
  feeds:
    - id: tor-exit-nodes
      url: https://check.torproject.org/torbulkexitlist
      format: ip_list
    - id: threatfox-ip-port
      url: https://threatfox.abuse.ch/export/json/ip-port/recent/
      format: ip_port_json
      enabled: false
"#;

    #[test]
    fn full_config_parses() {
        let config = AgentConfig::from_yaml(FULL).unwrap();
        assert_eq!(config.agent.name, "flowsentry");
        assert_eq!(config.agent.log_level, LogLevel::Debug);
        assert_eq!(config.agent.log_format, LogFormat::Json);
        assert_eq!(config.intel.refresh_interval_secs, 60);
        assert_eq!(config.intel.fetch_timeout_secs, 5);
        assert_eq!(config.intel.feeds.len(), 2);
        assert_eq!(config.intel.feeds[0].format, FeedFormat::IpList);
        assert!(config.intel.feeds[0].enabled);
        assert!(!config.intel.feeds[1].enabled);
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = AgentConfig::from_yaml("agent:\n  name: flowsentry\n").unwrap();
        assert_eq!(config.agent.log_level, LogLevel::Info);
        assert_eq!(config.agent.log_format, LogFormat::Text);
        assert_eq!(config.intel.refresh_interval_secs, 300);
        assert_eq!(config.intel.fetch_timeout_secs, 10);
        assert!(config.intel.feeds.is_empty());
    }

    #[test]
    fn empty_agent_name_rejected() {
        let result = AgentConfig::from_yaml("agent:\n  name: \"\"\n");
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn zero_interval_rejected() {
        let yaml = "agent:\n  name: a\nintel:\n  refresh_interval_secs: 0\n";
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let yaml = "agent:\n  name: a\nintel:\n  fetch_timeout_secs: 0\n";
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn non_http_feed_url_rejected() {
        let yaml = concat!(
            "agent:\n  name: a\n",
            "intel:\n  feeds:\n",
            "    - id: f\n      url: file:///etc/passwd\n      format: ip_list\n",
        );
        let result = AgentConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn duplicate_feed_ids_rejected() {
        let yaml = concat!(
            "agent:\n  name: a\n",
            "intel:\n  feeds:\n",
            "    - id: f\n      url: http://x/a\n      format: ip_list\n",
            "    - id: f\n      url: http://x/b\n      format: ip_port_json\n",
        );
        let result = AgentConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn unknown_top_level_field_rejected() {
        let yaml = "agent:\n  name: a\nfirewall: {}\n";
        assert!(matches!(
            AgentConfig::from_yaml(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn unknown_format_rejected() {
        let yaml = concat!(
            "agent:\n  name: a\n",
            "intel:\n  feeds:\n",
            "    - id: f\n      url: http://x/a\n      format: stix\n",
        );
        assert!(matches!(
            AgentConfig::from_yaml(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }
}
