//! Engine - Main entry point

use tessel_bridge::{BridgeError, ComputeModule, Runtime, SharedBuffer};
use tessel_dom::Document;
use tessel_html::HtmlError;

use crate::{logging, Config, ConfigError};

/// Builds runtimes according to one configuration
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        logging::init(&config.log_filter);
        tracing::info!("Tessel Engine {} initialized", crate::VERSION);
        Self { config }
    }

    /// Parse `html` and mount `compute` on its root element
    pub fn mount_html<C: ComputeModule>(&self, html: &str, compute: C) -> Result<Runtime<C>, EngineError> {
        let document = tessel_html::parse(html)?;
        self.mount(document, compute)
    }

    /// Mount `compute` on the configured root element of `document`
    pub fn mount<C: ComputeModule>(&self, document: Document, compute: C) -> Result<Runtime<C>, EngineError> {
        self.config.validate()?;
        let id = &self.config.root_element_id;
        let root = document
            .get_element_by_id(id)
            .ok_or_else(|| EngineError::RootNotFound(id.clone()))?;

        let buffer = SharedBuffer::new(self.config.initial_memory_pages, self.config.max_memory_pages);
        let mut runtime = Runtime::new(document, buffer, compute);
        if !self.config.install_delegation {
            runtime = runtime.without_delegation();
        }
        runtime.initialize(root, &[])?;

        tracing::info!("Mounted on #{}", id);
        Ok(runtime)
    }

    /// Get engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] HtmlError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No element with id {0:?} to mount on")]
    RootNotFound(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}
