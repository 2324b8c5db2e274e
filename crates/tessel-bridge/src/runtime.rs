//! Runtime
//!
//! The context object a host embeds: one document, one shared buffer and
//! the bookkeeping that connects them. Every boundary call between the
//! compute module and the host is a method here.

use std::time::Duration;

use tessel_dom::{Document, DomError, NativeEvent, NodeRef};

use crate::codec::EditReader;
use crate::events::{self, EventDelegation, Handler};
use crate::interpreter::Interpreter;
use crate::{
    BridgeError, BridgeResult, CallbackId, CallbackTable, CanonicalEventRecord, Closure, EventControl,
    FieldMap, MemoryBridge, NodeArena, NodeId, SharedBuffer, TemplateCache, TemplateNode, TimerQueue,
    TimerToken,
};

/// What the host calls back into
pub trait ComputeModule {
    /// A delegated event reached a registered node
    fn handle_event(&mut self, record: &CanonicalEventRecord, control: &mut EventControl);

    /// A callback lost its last listener or was disposed
    fn callback_released(&mut self, _id: CallbackId) {}

    /// A timer came due
    fn timer_fired(&mut self, _token: TimerToken) {}
}

impl ComputeModule for () {
    fn handle_event(&mut self, _record: &CanonicalEventRecord, _control: &mut EventControl) {}
}

/// Host-side state for one document
pub struct Runtime<C> {
    document: Document,
    memory: MemoryBridge,
    arena: NodeArena,
    templates: TemplateCache,
    callbacks: CallbackTable,
    delegation: EventDelegation,
    timers: TimerQueue,
    compute: C,
    last_error: Option<BridgeError>,
    delegate: bool,
}

impl<C: ComputeModule> Runtime<C> {
    pub fn new(document: Document, buffer: SharedBuffer, compute: C) -> Self {
        Self {
            document,
            memory: MemoryBridge::new(buffer),
            arena: NodeArena::new(),
            templates: TemplateCache::new(),
            callbacks: CallbackTable::new(),
            delegation: EventDelegation::new(),
            timers: TimerQueue::new(),
            compute,
            last_error: None,
            delegate: true,
        }
    }

    /// Skip the root listeners at `initialize`
    pub fn without_delegation(mut self) -> Self {
        self.delegate = false;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct host access, e.g. to reflect user input before dispatch
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    pub fn memory(&self) -> &MemoryBridge {
        &self.memory
    }

    pub fn delegation(&self) -> &EventDelegation {
        &self.delegation
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn compute(&self) -> &C {
        &self.compute
    }

    pub fn compute_mut(&mut self) -> &mut C {
        &mut self.compute
    }

    /// Live node bound to `id`
    pub fn node(&self, id: NodeId) -> BridgeResult<NodeRef> {
        Ok(self.arena.get(id)?)
    }

    // ------------------------------------------------------------------
    // Boundary calls
    // ------------------------------------------------------------------

    /// Bind `root` as id 0, bind each `(id, dom id)` pair, and attach the
    /// delegated listeners to the root.
    pub fn initialize(&mut self, root: NodeRef, registered: &[(NodeId, &str)]) -> BridgeResult<()> {
        self.document.tree().node(root)?;
        self.arena.set(NodeId::ROOT, root);
        for &(id, dom_id) in registered {
            let node = self.document
                .get_element_by_id(dom_id)
                .ok_or_else(|| DomError::IdNotFound(dom_id.to_string()))?;
            self.arena.set(id, node);
        }
        if self.delegate {
            self.delegation.install(&mut self.document, root)?;
        }
        tracing::debug!(?root, registered = registered.len(), "runtime initialized");
        Ok(())
    }

    /// Create a placeholder node under `id`
    pub fn create_node(&mut self, id: NodeId) -> NodeRef {
        self.arena.create(&mut self.document, id)
    }

    /// Bind a node the host already has
    pub fn set_node(&mut self, id: NodeId, node: NodeRef) -> BridgeResult<()> {
        self.document.tree().node(node)?;
        self.arena.set(id, node);
        Ok(())
    }

    /// Define a template outside an instruction stream
    pub fn save_template(&mut self, template_id: u32, nodes: Vec<TemplateNode>) -> BridgeResult<()> {
        self.templates.save(&mut self.document, template_id, nodes)
    }

    /// Point the memory bridge at a new buffer
    pub fn update_shared_memory(&mut self, buffer: SharedBuffer) {
        self.memory.update_shared_memory(buffer);
    }

    /// Entries of the form bound to `form`
    pub fn get_form_data(&self, form: NodeId) -> BridgeResult<FieldMap> {
        let node = self.arena.get(form)?;
        Ok(events::decode_form(&self.document, node)?)
    }

    /// Apply the instruction stream at `offset..offset + len` of the
    /// shared buffer. Returns the number of instructions applied.
    ///
    /// The first failure aborts the pass; it is logged, kept for
    /// [`Runtime::take_last_error`] and returned.
    pub fn apply_edits(&mut self, offset: usize, len: usize) -> BridgeResult<usize> {
        let reader = EditReader::new(&self.memory, offset, len);
        let mut interpreter = Interpreter {
            doc: &mut self.document,
            arena: &mut self.arena,
            templates: &mut self.templates,
            callbacks: &mut self.callbacks,
        };
        let result = interpreter.run(reader);
        self.flush_released();

        match result {
            Ok(applied) => {
                tracing::trace!(applied, live = self.arena.live_count(), "edits applied");
                Ok(applied)
            }
            Err(err) => {
                tracing::error!(%err, offset, len, "edit pass aborted");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Error that aborted the most recent pass, if not yet taken
    pub fn take_last_error(&mut self) -> Option<BridgeError> {
        self.last_error.take()
    }

    pub fn register_callback(&mut self, id: CallbackId, closure: Closure) -> BridgeResult<()> {
        Ok(self.callbacks.register(id, closure)?)
    }

    /// Dispose a callback.
    ///
    /// True when it was freed right away. A callback that still has
    /// listeners is freed when the last of them is removed.
    pub fn dispose_callback(&mut self, id: CallbackId) -> BridgeResult<bool> {
        let freed = self.callbacks.dispose(id)?;
        self.flush_released();
        Ok(freed)
    }

    fn flush_released(&mut self) {
        for id in self.callbacks.take_released() {
            self.compute.callback_released(id);
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    pub fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        self.timers.set_timeout(delay)
    }

    pub fn set_interval(&mut self, period: Duration) -> TimerToken {
        self.timers.set_interval(period)
    }

    pub fn clear_timer(&mut self, token: TimerToken) -> bool {
        self.timers.clear(token)
    }

    /// Advance the clock and fire what is due; returns how many fired
    pub fn run_timers(&mut self, now: Duration) -> usize {
        let fired = self.timers.advance(now);
        for &token in &fired {
            self.compute.timer_fired(token);
        }
        fired.len()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Deliver a host event.
    ///
    /// Delegated listeners hand a record to the compute module, callback
    /// listeners invoke their closure. Returns false when the default
    /// action was prevented.
    pub fn dispatch_event(&mut self, mut event: NativeEvent) -> BridgeResult<bool> {
        let Self { document, arena, callbacks, compute, .. } = self;
        let arena = &*arena;
        let callbacks = &*callbacks;

        let proceed = document.dispatch_event(&mut event, |doc, handler, native| {
            let handler = Handler::decode(handler);
            let target = match handler {
                Handler::Delegate => events::resolve(doc, arena, native.target),
                Handler::Callback(_) => events::resolve(doc, arena, native.target)
                    .or_else(|| arena.lookup(native.current_target)),
            };
            let Some(target) = target else {
                tracing::trace!(event = %native.event_type, "no registered node on the event path");
                return;
            };

            let record = events::synthesize(doc, native, target);
            let mut control = EventControl::default();
            match handler {
                Handler::Delegate => compute.handle_event(&record, &mut control),
                Handler::Callback(id) => {
                    if let Err(err) = callbacks.invoke(id, &record, &mut control) {
                        tracing::warn!(%err, event = %record.name, "callback not invoked");
                    }
                }
            }
            control.apply(native);
        })?;

        Ok(proceed)
    }
}

impl<C> std::fmt::Debug for Runtime<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("arena", &self.arena.live_count())
            .field("templates", &self.templates.len())
            .field("callbacks", &self.callbacks)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
