//! Configuration for the scrubber.
//!
//! The surrounding system keeps scrub rules in a YAML document and hands
//! the parsed configuration to this crate; JSON bytes are accepted for
//! embedders that deliver configuration over a byte channel. Editing and
//! persisting the document is the embedder's concern, not ours.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One scrub rule: a marker sequence plus the suppress-remainder flag.
///
/// Rule order is significant — the earliest declared rule wins when
/// several markers are simultaneously viable.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MarkerRule {
    /// Literal symbol sequence to detect and remove. Must be non-empty.
    pub pattern: String,
    /// Once this marker completes, discard the rest of the stream
    #[serde(default)]
    pub suppress_remainder: bool,
}

impl MarkerRule {
    /// Rule that removes the marker and keeps streaming
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            suppress_remainder: false,
        }
    }

    /// Rule that removes the marker and suppresses everything after it
    pub fn suppressing(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            suppress_remainder: true,
        }
    }
}

/// Scrubber configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ScrubConfig {
    /// Ordered scrub rules
    #[serde(default = "default_markers")]
    pub markers: Vec<MarkerRule>,

    /// Whether removed markers are reported as audit events
    #[serde(default = "default_log_matches")]
    pub log_matches: bool,
}

fn default_markers() -> Vec<MarkerRule> {
    vec![
        MarkerRule::new("<think>"),
        MarkerRule::suppressing("</think>"),
    ]
}

fn default_log_matches() -> bool {
    true
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            log_matches: default_log_matches(),
        }
    }
}

impl ScrubConfig {
    /// Parse configuration from JSON bytes
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// An empty pattern can never complete and is a configuration error;
    /// the whole configuration is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, rule) in self.markers.iter().enumerate() {
            if rule.pattern.is_empty() {
                return Err(ConfigError::EmptyPattern { index });
            }
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("marker pattern at index {index} is empty")]
    EmptyPattern { index: usize },

    #[error("configuration is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("invalid JSON configuration: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML configuration: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
