//! Canonical event records
//!
//! The flat, value-typed form of a host event that crosses into the compute
//! module. Extraction reads whatever detail the host attached and defaults
//! anything missing, so it never fails.

use serde::{Deserialize, Serialize};
use tessel_dom::events::{
    AnimationInit, DragInit, KeyboardInit, Modifiers, MouseInit, PointerInit, TransitionInit, WheelInit,
};
use tessel_dom::{Document, EventDetail, NativeEvent};

use super::category::EventCategory;
use super::form::{decode_form, enclosing_form, FieldMap, FileValue};
use crate::NodeId;

/// Event handed to the compute module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEventRecord {
    /// DOM event name
    pub name: String,
    /// Nearest registered node at or above the native target
    pub target: NodeId,
    pub bubbles: bool,
    pub data: EventData,
}

impl CanonicalEventRecord {
    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Category-specific fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventData {
    #[default]
    None,
    Mouse(MouseData),
    Pointer(PointerData),
    Keyboard(KeyboardData),
    Wheel(WheelData),
    Composition(CompositionData),
    Animation(AnimationData),
    Transition(TransitionData),
    Form(FormEventData),
    Focus,
    Clipboard,
    Drag(DragData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierKeys {
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
}

impl From<Modifiers> for ModifierKeys {
    fn from(m: Modifiers) -> Self {
        Self { alt_key: m.alt, ctrl_key: m.ctrl, meta_key: m.meta, shift_key: m.shift }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MouseData {
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub button: i16,
    pub buttons: u16,
    pub modifiers: ModifierKeys,
}

impl From<&MouseInit> for MouseData {
    fn from(m: &MouseInit) -> Self {
        Self {
            client_x: m.client_x,
            client_y: m.client_y,
            page_x: m.page_x,
            page_y: m.page_y,
            screen_x: m.screen_x,
            screen_y: m.screen_y,
            offset_x: m.offset_x,
            offset_y: m.offset_y,
            button: m.button.to_number(),
            buttons: m.buttons,
            modifiers: m.modifiers.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerData {
    pub mouse: MouseData,
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

impl From<&PointerInit> for PointerData {
    fn from(p: &PointerInit) -> Self {
        Self {
            mouse: (&p.mouse).into(),
            pointer_id: p.pointer_id,
            width: p.width,
            height: p.height,
            pressure: p.pressure,
            tangential_pressure: p.tangential_pressure,
            tilt_x: p.tilt_x,
            tilt_y: p.tilt_y,
            twist: p.twist,
            pointer_type: p.pointer_type.clone(),
            is_primary: p.is_primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyboardData {
    pub key: String,
    pub code: String,
    pub location: u32,
    pub repeat: bool,
    pub is_composing: bool,
    pub modifiers: ModifierKeys,
}

impl From<&KeyboardInit> for KeyboardData {
    fn from(k: &KeyboardInit) -> Self {
        Self {
            key: k.key.clone(),
            code: k.code.clone(),
            location: k.location,
            repeat: k.repeat,
            is_composing: k.is_composing,
            modifiers: k.modifiers.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelData {
    pub mouse: MouseData,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    pub delta_mode: u32,
}

impl From<&WheelInit> for WheelData {
    fn from(w: &WheelInit) -> Self {
        Self {
            mouse: (&w.mouse).into(),
            delta_x: w.delta_x,
            delta_y: w.delta_y,
            delta_z: w.delta_z,
            delta_mode: w.delta_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositionData {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationData {
    pub animation_name: String,
    pub elapsed_time: f32,
    pub pseudo_element: String,
}

impl From<&AnimationInit> for AnimationData {
    fn from(a: &AnimationInit) -> Self {
        Self {
            animation_name: a.animation_name.clone(),
            elapsed_time: a.elapsed_time,
            pseudo_element: a.pseudo_element.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionData {
    pub property_name: String,
    pub elapsed_time: f32,
    pub pseudo_element: String,
}

impl From<&TransitionInit> for TransitionData {
    fn from(t: &TransitionInit) -> Self {
        Self {
            property_name: t.property_name.clone(),
            elapsed_time: t.elapsed_time,
            pseudo_element: t.pseudo_element.clone(),
        }
    }
}

/// Form event fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormEventData {
    /// Current value of the native target
    pub value: String,
    pub checked: bool,
    /// Entries of the enclosing form (empty outside a form)
    pub values: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DragData {
    pub mouse: MouseData,
    pub files: Vec<FileValue>,
}

impl From<&DragInit> for DragData {
    fn from(d: &DragInit) -> Self {
        Self {
            mouse: (&d.mouse).into(),
            files: d.files.iter().map(FileValue::from).collect(),
        }
    }
}

/// Mouse fields of any detail that carries them
fn mouse_of(detail: &EventDetail) -> MouseData {
    match detail {
        EventDetail::Mouse(m) => m.into(),
        EventDetail::Pointer(p) => (&p.mouse).into(),
        EventDetail::Wheel(w) => (&w.mouse).into(),
        EventDetail::Drag(d) => (&d.mouse).into(),
        _ => MouseData::default(),
    }
}

/// Build the record for `event`, attributed to the registered node `target`
pub fn synthesize(doc: &Document, event: &NativeEvent, target: NodeId) -> CanonicalEventRecord {
    let detail = &event.detail;
    let data = match EventCategory::of(&event.event_type) {
        None => EventData::None,
        Some(EventCategory::Mouse) => EventData::Mouse(mouse_of(detail)),
        Some(EventCategory::Pointer) => EventData::Pointer(match detail {
            EventDetail::Pointer(p) => p.into(),
            other => PointerData {
                mouse: mouse_of(other),
                ..PointerData::from(&PointerInit::default())
            },
        }),
        Some(EventCategory::Keyboard) => EventData::Keyboard(match detail {
            EventDetail::Keyboard(k) => k.into(),
            _ => KeyboardData::default(),
        }),
        Some(EventCategory::Wheel) => EventData::Wheel(match detail {
            EventDetail::Wheel(w) => w.into(),
            other => WheelData { mouse: mouse_of(other), ..WheelData::default() },
        }),
        Some(EventCategory::Composition) => EventData::Composition(match detail {
            EventDetail::Composition { data } => CompositionData { data: data.clone() },
            _ => CompositionData::default(),
        }),
        Some(EventCategory::Animation) => EventData::Animation(match detail {
            EventDetail::Animation(a) => a.into(),
            _ => AnimationData::default(),
        }),
        Some(EventCategory::Transition) => EventData::Transition(match detail {
            EventDetail::Transition(t) => t.into(),
            _ => TransitionData::default(),
        }),
        Some(EventCategory::Drag) => EventData::Drag(match detail {
            EventDetail::Drag(d) => d.into(),
            other => DragData { mouse: mouse_of(other), files: Vec::new() },
        }),
        Some(EventCategory::Form) => EventData::Form(form_fields(doc, event)),
        Some(EventCategory::Focus) => EventData::Focus,
        Some(EventCategory::Clipboard) => EventData::Clipboard,
    };

    CanonicalEventRecord {
        name: event.event_type.clone(),
        target,
        bubbles: event.bubbles,
        data,
    }
}

fn form_fields(doc: &Document, event: &NativeEvent) -> FormEventData {
    let node = event.target;
    let values = enclosing_form(doc, node)
        .and_then(|form| match decode_form(doc, form) {
            Ok(fields) => Some(fields),
            Err(err) => {
                tracing::warn!(%err, "form entries unavailable");
                None
            }
        })
        .unwrap_or_default();
    FormEventData {
        value: doc.value(node).unwrap_or_default(),
        checked: doc.checked(node),
        values,
    }
}
