//! Event categories and the names delegated for each

use serde::{Deserialize, Serialize};

/// Families of events with a shared field set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Keyboard,
    Mouse,
    Pointer,
    Wheel,
    Composition,
    Animation,
    Transition,
    Form,
    Focus,
    Clipboard,
    Drag,
}

impl EventCategory {
    pub const ALL: [EventCategory; 11] = [
        EventCategory::Keyboard,
        EventCategory::Mouse,
        EventCategory::Pointer,
        EventCategory::Wheel,
        EventCategory::Composition,
        EventCategory::Animation,
        EventCategory::Transition,
        EventCategory::Form,
        EventCategory::Focus,
        EventCategory::Clipboard,
        EventCategory::Drag,
    ];

    /// Event names in this category
    pub fn names(self) -> &'static [&'static str] {
        match self {
            EventCategory::Keyboard => &["keydown", "keyup", "keypress"],
            EventCategory::Mouse => &[
                "click", "contextmenu", "dblclick", "mousedown", "mouseenter",
                "mouseleave", "mousemove", "mouseout", "mouseover", "mouseup",
            ],
            EventCategory::Pointer => &[
                "pointerdown", "pointermove", "pointerup", "pointercancel",
                "gotpointercapture", "lostpointercapture", "pointerenter",
                "pointerleave", "pointerover", "pointerout",
            ],
            EventCategory::Wheel => &["wheel"],
            EventCategory::Composition => &["compositionstart", "compositionupdate", "compositionend"],
            EventCategory::Animation => &["animationstart", "animationend", "animationiteration"],
            EventCategory::Transition => &["transitionrun", "transitionstart", "transitionend", "transitioncancel"],
            EventCategory::Form => &["input", "change", "submit", "reset", "invalid"],
            EventCategory::Focus => &["focus", "blur", "focusin", "focusout"],
            EventCategory::Clipboard => &["copy", "cut", "paste"],
            EventCategory::Drag => &[
                "drag", "dragend", "dragenter", "dragexit", "dragleave",
                "dragover", "dragstart", "drop",
            ],
        }
    }

    /// Category of a DOM event name
    pub fn of(name: &str) -> Option<EventCategory> {
        Self::ALL.into_iter().find(|category| category.names().contains(&name))
    }
}

/// Does the host raise this event as bubbling?
pub fn bubbles(name: &str) -> bool {
    !matches!(
        name,
        "focus" | "blur" | "mouseenter" | "mouseleave" | "pointerenter" | "pointerleave" | "invalid"
    )
}

/// Every delegated event name
pub fn delegated_names() -> impl Iterator<Item = &'static str> {
    EventCategory::ALL.into_iter().flat_map(|category| category.names().iter().copied())
}
