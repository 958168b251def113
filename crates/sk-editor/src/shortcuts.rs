//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Resolution is
//! pure; the session decides what an action does in the current state
//! (e.g. Escape cancels an interaction before it clears the selection).
//!
//! | Key | Action | Key | Action |
//! |-----|--------|-----|--------|
//! | V | select | R | rectangle |
//! | P | pencil | O | circle |
//! | M | marker | G | triangle |
//! | B | brush | L | line |
//! | N | pen | A | arrow |
//! | E | eraser | T | text |

use crate::input::Modifiers;
use crate::settings::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,
    /// Cancel the interaction in progress, else clear the selection.
    Escape,
    /// Finish text editing.
    Commit,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,

    // ── Z-order ──
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘, on other
/// platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. Returns `None` if the combo has no
    /// binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        match key {
            "Escape" => return Some(ShortcutAction::Escape),
            "Enter" => return Some(ShortcutAction::Commit),
            "Delete" | "Backspace" => return Some(ShortcutAction::Delete),
            _ => {}
        }
        if modifiers.alt || modifiers.shift {
            return None;
        }

        // ── Single keys ──
        let tool = match key {
            "v" | "V" => ToolKind::Select,
            "p" | "P" => ToolKind::Pencil,
            "m" | "M" => ToolKind::Marker,
            "b" | "B" => ToolKind::Brush,
            "n" | "N" => ToolKind::Pen,
            "r" | "R" => ToolKind::Rectangle,
            "o" | "O" => ToolKind::Circle,
            "g" | "G" => ToolKind::Triangle,
            "l" | "L" => ToolKind::LineShape,
            "a" | "A" => ToolKind::Arrow,
            "e" | "E" => ToolKind::Eraser,
            "t" | "T" => ToolKind::Text,
            _ => return None,
        };
        Some(ShortcutAction::Tool(tool))
    }
}
