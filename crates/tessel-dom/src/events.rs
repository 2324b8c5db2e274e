//! Native events
//!
//! What the host environment raises: an event type, a target, and a
//! payload whose shape depends on the interface the host used to build it.

use crate::{NodeRef, FileEntry};

/// Dispatch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Native event raised by the host
#[derive(Debug, Clone)]
pub struct NativeEvent {
    pub event_type: String,
    pub target: NodeRef,
    pub bubbles: bool,
    pub cancelable: bool,
    pub timestamp: f64,
    pub detail: EventDetail,
    pub phase: EventPhase,
    pub current_target: NodeRef,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl NativeEvent {
    /// Bubbling, cancelable event with no payload
    pub fn new(event_type: &str, target: NodeRef) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            bubbles: true,
            cancelable: true,
            timestamp: 0.0,
            detail: EventDetail::None,
            phase: EventPhase::None,
            current_target: NodeRef::NONE,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    /// Attach a payload
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Mark as non-bubbling
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation after the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation immediately
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }
}

/// Interface-specific payload
#[derive(Debug, Clone, Default)]
pub enum EventDetail {
    #[default]
    None,
    Mouse(MouseInit),
    Pointer(PointerInit),
    Wheel(WheelInit),
    Keyboard(KeyboardInit),
    Composition { data: String },
    Animation(AnimationInit),
    Transition(TransitionInit),
    Drag(DragInit),
}

/// Modifier key state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button (usually left)
    #[default]
    Primary,
    /// Auxiliary button (usually middle/wheel)
    Auxiliary,
    /// Secondary button (usually right)
    Secondary,
    /// Fourth button (usually back)
    Fourth,
    /// Fifth button (usually forward)
    Fifth,
}

impl MouseButton {
    /// Convert from button number (0-4)
    pub fn from_number(n: i16) -> Option<Self> {
        match n {
            0 => Some(Self::Primary),
            1 => Some(Self::Auxiliary),
            2 => Some(Self::Secondary),
            3 => Some(Self::Fourth),
            4 => Some(Self::Fifth),
            _ => None,
        }
    }

    /// Convert to button number
    pub fn to_number(self) -> i16 {
        match self {
            Self::Primary => 0,
            Self::Auxiliary => 1,
            Self::Secondary => 2,
            Self::Fourth => 3,
            Self::Fifth => 4,
        }
    }

    /// Get bit for buttons bitmask
    pub fn bit(self) -> u16 {
        match self {
            Self::Primary => 1,
            Self::Auxiliary => 4,
            Self::Secondary => 2,
            Self::Fourth => 8,
            Self::Fifth => 16,
        }
    }
}

/// MouseEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseInit {
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub button: MouseButton,
    /// Bitmask of pressed buttons
    pub buttons: u16,
    pub modifiers: Modifiers,
}

impl MouseInit {
    /// Click at viewport coordinates
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            client_x: x,
            client_y: y,
            page_x: x,
            page_y: y,
            ..Default::default()
        }
    }
}

/// PointerEvent fields
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInit {
    pub mouse: MouseInit,
    pub pointer_id: i32,
    pub width: f64,
    pub height: f64,
    pub pressure: f32,
    pub tangential_pressure: f32,
    pub tilt_x: i32,
    pub tilt_y: i32,
    pub twist: i32,
    pub pointer_type: String,
    pub is_primary: bool,
}

impl Default for PointerInit {
    fn default() -> Self {
        Self {
            mouse: MouseInit::default(),
            pointer_id: 0,
            width: 1.0,
            height: 1.0,
            pressure: 0.0,
            tangential_pressure: 0.0,
            tilt_x: 0,
            tilt_y: 0,
            twist: 0,
            pointer_type: "mouse".to_string(),
            is_primary: true,
        }
    }
}

/// WheelEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelInit {
    pub mouse: MouseInit,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    pub delta_mode: u32,
}

/// KeyboardEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardInit {
    pub key: String,
    pub code: String,
    pub location: u32,
    pub repeat: bool,
    pub is_composing: bool,
    pub modifiers: Modifiers,
}

impl KeyboardInit {
    pub fn key(key: &str, code: &str) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            ..Default::default()
        }
    }
}

/// AnimationEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationInit {
    pub animation_name: String,
    pub elapsed_time: f32,
    pub pseudo_element: String,
}

/// TransitionEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionInit {
    pub property_name: String,
    pub elapsed_time: f32,
    pub pseudo_element: String,
}

/// DragEvent fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragInit {
    pub mouse: MouseInit,
    pub files: Vec<FileEntry>,
}
