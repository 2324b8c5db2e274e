//! Event listener registry
//!
//! Listeners are keyed by target, then event type. The host only stores opaque
//! [`HandlerId`]s; whoever installed a listener resolves the id back to
//! behavior when the event is dispatched.

use std::collections::HashMap;
use crate::NodeRef;

/// Event handler function ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
    pub once: bool,
}

impl ListenerOptions {
    /// Options for a capture-phase listener
    pub fn capture() -> Self {
        Self { capture: true, ..Self::default() }
    }
}

/// Event listener with handler tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventListener {
    /// Handler ID
    pub handler_id: HandlerId,
    /// Capture phase
    pub capture: bool,
    /// Passive listener
    pub passive: bool,
    /// Once (auto-remove)
    pub once: bool,
}

/// Per-document listener storage, indexed by node first
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    handlers: HashMap<NodeRef, HashMap<String, Vec<EventListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Returns false if an identical
    /// (type, handler, capture) listener is already installed.
    pub fn add(&mut self, target: NodeRef, event_type: &str, handler_id: HandlerId, options: ListenerOptions) -> bool {
        let listeners = self.handlers
            .entry(target)
            .or_default()
            .entry(event_type.to_string())
            .or_default();
        if listeners.iter().any(|l| l.handler_id == handler_id && l.capture == options.capture) {
            return false;
        }
        listeners.push(EventListener {
            handler_id,
            capture: options.capture,
            passive: options.passive,
            once: options.once,
        });
        true
    }

    /// Remove a listener. Returns whether one was removed.
    pub fn remove(&mut self, target: NodeRef, event_type: &str, handler_id: HandlerId, capture: bool) -> bool {
        let Some(by_type) = self.handlers.get_mut(&target) else {
            return false;
        };
        let Some(listeners) = by_type.get_mut(event_type) else {
            return false;
        };
        let initial_len = listeners.len();
        listeners.retain(|l| !(l.handler_id == handler_id && l.capture == capture));
        let removed = listeners.len() < initial_len;
        if listeners.is_empty() {
            by_type.remove(event_type);
        }
        if by_type.is_empty() {
            self.handlers.remove(&target);
        }
        removed
    }

    /// Snapshot of listeners for target and event type, in insertion order
    pub fn get(&self, target: NodeRef, event_type: &str) -> Vec<EventListener> {
        self.handlers
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Does the node carry any listener?
    pub fn has_any(&self, target: NodeRef) -> bool {
        self.handlers.contains_key(&target)
    }

    /// Remove every listener on a node, returning (type, listener) pairs
    /// sorted by type
    pub fn take_all(&mut self, target: NodeRef) -> Vec<(String, EventListener)> {
        let Some(by_type) = self.handlers.remove(&target) else {
            return Vec::new();
        };
        let mut taken: Vec<(String, EventListener)> = by_type.into_iter()
            .flat_map(|(event_type, listeners)| {
                listeners.into_iter().map(move |l| (event_type.clone(), l))
            })
            .collect();
        taken.sort_by(|a, b| a.0.cmp(&b.0));
        taken
    }

    /// Total listener count
    pub fn len(&self) -> usize {
        self.handlers.values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
