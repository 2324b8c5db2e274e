//! Event Delegation & Synthesis

mod category;
mod delegate;
mod form;
mod record;

pub use category::{bubbles, delegated_names, EventCategory};
pub use delegate::{resolve, EventDelegation, Handler, DELEGATE_HANDLER};
pub use form::{decode_form, enclosing_form, FieldMap, FileValue, FormValue};
pub use record::{
    synthesize, AnimationData, CanonicalEventRecord, CompositionData, DragData, EventData, FormEventData,
    KeyboardData, ModifierKeys, MouseData, PointerData, TransitionData, WheelData,
};

use tessel_dom::NativeEvent;

/// What the compute module may do to an event while handling it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventControl {
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl EventControl {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Forward the requests to the native event
    pub(crate) fn apply(self, event: &mut NativeEvent) {
        if self.default_prevented {
            event.prevent_default();
        }
        if self.immediate_stopped {
            event.stop_immediate_propagation();
        } else if self.propagation_stopped {
            event.stop_propagation();
        }
    }
}
