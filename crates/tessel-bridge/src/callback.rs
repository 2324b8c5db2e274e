//! Callback Lifetime Bridge
//!
//! Compute-module closures installed as host listeners. A closure is
//! registered once, wrapped in a counted [`CallbackHandle`] on its first
//! attachment, and dropped when the last attachment goes away. Disposing a
//! callback that still has listeners only takes effect once they are gone,
//! so dispatch never reaches a dropped closure.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tessel_dom::HandlerId;

use crate::events::{CanonicalEventRecord, EventControl};

/// Identifier the compute module gives a closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(pub u32);

impl CallbackId {
    /// Listener handler id the host stores for this callback
    pub fn handler(self) -> HandlerId {
        HandlerId(self.0 as u64)
    }
}

/// Compute-side closure invoked with the synthesized event
pub type Closure = Box<dyn FnMut(&CanonicalEventRecord, &mut EventControl)>;

/// Callback errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("callback {0:?} is not registered")]
    Unknown(CallbackId),

    #[error("callback {0:?} is already registered")]
    AlreadyRegistered(CallbackId),

    #[error("callback {0:?} has been disposed")]
    Disposed(CallbackId),

    #[error("callback {0:?} invoked while already running")]
    Reentrant(CallbackId),
}

/// Counted wrapper around a closure
pub struct CallbackHandle {
    id: CallbackId,
    count: Cell<usize>,
    closure: RefCell<Option<Closure>>,
    /// Disposal requested while listeners were still attached
    doomed: Cell<bool>,
}

impl CallbackHandle {
    fn new(id: CallbackId, closure: Closure) -> Self {
        Self {
            id,
            count: Cell::new(1),
            closure: RefCell::new(Some(closure)),
            doomed: Cell::new(false),
        }
    }

    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Live attachments
    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.closure.borrow().is_none()
    }

    /// Disposal is pending on the remaining listeners
    pub fn is_doomed(&self) -> bool {
        self.doomed.get()
    }

    fn retain(&self) {
        self.count.set(self.count.get() + 1);
    }

    /// Decrement; drops the closure and returns true at zero
    fn release(&self) -> bool {
        let count = self.count.get().saturating_sub(1);
        self.count.set(count);
        if count == 0 {
            self.closure.borrow_mut().take();
            return true;
        }
        false
    }

    /// Run the closure
    pub fn invoke(&self, record: &CanonicalEventRecord, control: &mut EventControl) -> Result<(), CallbackError> {
        let mut slot = self.closure.try_borrow_mut().map_err(|_| CallbackError::Reentrant(self.id))?;
        let closure = slot.as_mut().ok_or(CallbackError::Disposed(self.id))?;
        closure(record, control);
        Ok(())
    }
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("count", &self.count.get())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// All closures known to the runtime
#[derive(Default)]
pub struct CallbackTable {
    pending: HashMap<CallbackId, Closure>,
    live: HashMap<CallbackId, Rc<CallbackHandle>>,
    released: Vec<CallbackId>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a closure to the host
    pub fn register(&mut self, id: CallbackId, closure: Closure) -> Result<(), CallbackError> {
        if self.pending.contains_key(&id) || self.live.contains_key(&id) {
            return Err(CallbackError::AlreadyRegistered(id));
        }
        self.pending.insert(id, closure);
        Ok(())
    }

    /// Is `id` registered and not yet released?
    pub fn contains(&self, id: CallbackId) -> bool {
        self.pending.contains_key(&id) || self.live.contains_key(&id)
    }

    /// Can a new listener use `id`?
    pub fn check_attachable(&self, id: CallbackId) -> Result<(), CallbackError> {
        match self.live.get(&id) {
            Some(handle) if handle.is_doomed() => Err(CallbackError::Disposed(id)),
            Some(_) => Ok(()),
            None if self.pending.contains_key(&id) => Ok(()),
            None => Err(CallbackError::Unknown(id)),
        }
    }

    /// Record one more listener using `id`
    pub fn attach(&mut self, id: CallbackId) -> Result<Rc<CallbackHandle>, CallbackError> {
        if let Some(handle) = self.live.get(&id) {
            if handle.is_doomed() {
                return Err(CallbackError::Disposed(id));
            }
            handle.retain();
            return Ok(Rc::clone(handle));
        }
        let closure = self.pending.remove(&id).ok_or(CallbackError::Unknown(id))?;
        let handle = Rc::new(CallbackHandle::new(id, closure));
        self.live.insert(id, Rc::clone(&handle));
        Ok(handle)
    }

    /// Record one listener fewer. Returns true when the count hit zero.
    pub fn detach(&mut self, id: CallbackId) -> Result<bool, CallbackError> {
        let handle = self.live.get(&id).ok_or(CallbackError::Unknown(id))?;
        if !handle.release() {
            return Ok(false);
        }
        self.live.remove(&id);
        self.released.push(id);
        tracing::trace!(?id, "callback released");
        Ok(true)
    }

    /// Explicit disposal by the compute module.
    ///
    /// A never-attached closure is dropped outright and true is returned.
    /// An attached one stays callable and refuses new listeners; it is
    /// released when its last listener detaches.
    pub fn dispose(&mut self, id: CallbackId) -> Result<bool, CallbackError> {
        if self.pending.remove(&id).is_some() {
            self.released.push(id);
            return Ok(true);
        }
        let handle = self.live.get(&id).ok_or(CallbackError::Unknown(id))?;
        handle.doomed.set(true);
        tracing::debug!(?id, listeners = handle.count(), "callback disposal deferred");
        Ok(false)
    }

    /// Live handle for `id`
    pub fn get(&self, id: CallbackId) -> Option<Rc<CallbackHandle>> {
        self.live.get(&id).cloned()
    }

    /// Attachment count (zero when pending or unknown)
    pub fn count(&self, id: CallbackId) -> usize {
        self.live.get(&id).map_or(0, |h| h.count())
    }

    /// Invoke the closure behind a live handle
    pub fn invoke(&self, id: CallbackId, record: &CanonicalEventRecord, control: &mut EventControl) -> Result<(), CallbackError> {
        match self.live.get(&id) {
            Some(handle) => handle.invoke(record, control),
            None => Err(CallbackError::Disposed(id)),
        }
    }

    /// Ids released since the last call
    pub fn take_released(&mut self) -> Vec<CallbackId> {
        std::mem::take(&mut self.released)
    }
}

impl std::fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("pending", &self.pending.len())
            .field("live", &self.live)
            .finish()
    }
}
