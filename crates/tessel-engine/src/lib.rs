//! Tessel Engine
//!
//! Wires the document, the HTML parser and the bridge together: parse a
//! page, find the mount point, and hand back a [`Runtime`] ready to take
//! instruction streams.
//!
//! # Example
//! ```rust,ignore
//! use tessel_engine::{Engine, Config};
//!
//! let engine = Engine::new(Config::default());
//! let mut runtime = engine.mount_html(r#"<div id="main"></div>"#, app)?;
//! runtime.apply_edits(offset, len)?;
//! ```

mod config;
mod engine;
pub mod logging;

pub use config::{Config, ConfigError};
pub use engine::{Engine, EngineError};

// Re-export sub-crates for advanced usage
pub use tessel_bridge as bridge;
pub use tessel_dom as dom;
pub use tessel_html as html;

pub use tessel_bridge::{ComputeModule, Runtime};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
