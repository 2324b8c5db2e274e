//! Tessel Bridge - mutation interpreter and node arena
//!
//! Replays instruction streams written by a compute module into a shared
//! buffer against a live [`tessel_dom::Document`], and turns host events
//! into canonical records flowing back the other way.
//!
//! Everything hangs off a [`Runtime`], the single context object that owns
//! the arena, template cache, callback table and memory bridge.

mod arena;
mod memory;
mod template;
mod interpreter;
mod callback;
mod timers;
mod runtime;
mod error;
pub mod codec;
pub mod events;

pub use arena::{NodeArena, NodeHandle, ArenaError};
pub use memory::{MemoryBridge, SharedBuffer, TypedView, ViewElement, MemoryError, PAGE_SIZE};
pub use template::{TemplateCache, Template, TemplateNode, TemplateAttribute, TemplateError};
pub use codec::{Instruction, EditWriter, EditReader, DecodeError};
pub use callback::{CallbackTable, CallbackHandle, CallbackId, CallbackError, Closure};
pub use timers::{TimerQueue, TimerToken};
pub use runtime::{Runtime, ComputeModule};
pub use error::{BridgeError, BridgeResult};
pub use events::{CanonicalEventRecord, EventData, EventControl, EventCategory, FieldMap, FormValue};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier assigned by the compute module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The tree root
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
