//! Engine Configuration

use serde::{Deserialize, Serialize};

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `id` attribute of the element the runtime mounts on
    pub root_element_id: String,

    /// Shared buffer size at startup (64 KiB pages)
    pub initial_memory_pages: usize,

    /// Upper bound the shared buffer may grow to
    pub max_memory_pages: usize,

    /// Default `tracing` filter; `RUST_LOG` takes precedence
    pub log_filter: String,

    /// Attach the delegated root listeners on mount
    pub install_delegation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_element_id: "main".to_string(),
            initial_memory_pages: 1,
            max_memory_pages: 256, // 16MB
            log_filter: "warn".to_string(),
            install_delegation: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("root_element_id must not be empty")]
    EmptyRootId,

    #[error("initial_memory_pages ({initial}) exceeds max_memory_pages ({max})")]
    MemoryPages { initial: usize, max: usize },
}

impl Config {
    /// Load from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_element_id.is_empty() {
            return Err(ConfigError::EmptyRootId);
        }
        if self.initial_memory_pages > self.max_memory_pages {
            return Err(ConfigError::MemoryPages {
                initial: self.initial_memory_pages,
                max: self.max_memory_pages,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"root_element_id": "app", "max_memory_pages": 8}"#).unwrap();
        assert_eq!(config.root_element_id, "app");
        assert_eq!(config.max_memory_pages, 8);
        assert_eq!(config.initial_memory_pages, 1);
        assert!(config.install_delegation);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config = Config { initial_memory_pages: 4, max_memory_pages: 2, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::MemoryPages { initial: 4, max: 2 })));

        let config = Config { root_element_id: String::new(), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRootId)));
    }

    #[test]
    fn test_bad_json() {
        let err = Config::from_json(r#"{"max_memory_pages": "lots"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
