//! Input abstraction layer.
//!
//! Normalizes pointer and keyboard events into a unified
//! `InputEvent` enum consumed by the editor session. Pointer positions are
//! in screen pixels; the session maps them to canvas units.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Ctrl on Linux/Windows, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerMove {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    /// Wheel or pinch at screen point `(x, y)`.
    Scroll {
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        /// Zoom factor (1.0 = no change; >1 = zoom in).
        zoom: f32,
    },

    /// `key` is the `KeyboardEvent.key` value (`"z"`, `"Escape"`).
    Key { key: String, modifiers: Modifiers },

    /// Current content of the text field while a text element is edited.
    TextInput { text: String },

    /// The canvas lost input focus.
    Blur,
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Same event with different modifiers. Non-pointer, non-key events are
    /// returned unchanged.
    pub fn with_modifiers(mut self, mods: Modifiers) -> Self {
        match &mut self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers = mods,
            Self::Scroll { .. } | Self::TextInput { .. } | Self::Blur => {}
        }
        self
    }
}
