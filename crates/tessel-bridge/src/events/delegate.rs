//! Event delegation
//!
//! One host listener per delegated event name at a scope root instead of a
//! listener per node. Whatever fires is routed back to the nearest node the
//! arena knows.

use tessel_dom::{Document, DomResult, HandlerId, ListenerOptions, NodeRef};

use super::category::{bubbles, delegated_names};
use crate::{CallbackId, NodeArena, NodeId};

/// Handler ids with this bit set belong to the delegation layer
const DELEGATE_BIT: u64 = 1 << 63;

/// Handler id of the root listeners
pub const DELEGATE_HANDLER: HandlerId = HandlerId(DELEGATE_BIT);

/// Who a host listener belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Delegate,
    Callback(CallbackId),
}

impl Handler {
    pub fn decode(handler: HandlerId) -> Handler {
        if handler.0 & DELEGATE_BIT != 0 {
            Handler::Delegate
        } else {
            Handler::Callback(CallbackId(handler.0 as u32))
        }
    }
}

/// Root listener bookkeeping
#[derive(Debug, Default)]
pub struct EventDelegation {
    scope: Option<NodeRef>,
    installed: usize,
}

impl EventDelegation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach one listener per delegated name to `scope`.
    ///
    /// Names that do not bubble are caught in the capture phase.
    pub fn install(&mut self, doc: &mut Document, scope: NodeRef) -> DomResult<()> {
        if let Some(previous) = self.scope.take() {
            self.uninstall_from(doc, previous)?;
        }
        let mut installed = 0;
        for name in delegated_names() {
            let options = ListenerOptions { capture: !bubbles(name), ..ListenerOptions::default() };
            if doc.add_event_listener(scope, name, DELEGATE_HANDLER, options)? {
                installed += 1;
            }
        }
        tracing::debug!(?scope, installed, "delegated listeners installed");
        self.scope = Some(scope);
        self.installed = installed;
        Ok(())
    }

    fn uninstall_from(&mut self, doc: &mut Document, scope: NodeRef) -> DomResult<()> {
        for name in delegated_names() {
            doc.remove_event_listener(scope, name, DELEGATE_HANDLER, !bubbles(name))?;
        }
        self.installed = 0;
        Ok(())
    }

    /// Scope root, once installed
    pub fn scope(&self) -> Option<NodeRef> {
        self.scope
    }

    /// Number of root listeners attached
    pub fn installed(&self) -> usize {
        self.installed
    }
}

/// Nearest node at or above `target` that has an id
pub fn resolve(doc: &Document, arena: &NodeArena, target: NodeRef) -> Option<NodeId> {
    doc.tree().ancestors(target).find_map(|node| arena.lookup(node))
}
