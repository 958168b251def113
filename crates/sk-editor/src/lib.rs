//! Interactive editing for Sketchboard: tools, shortcuts, undo/redo and the
//! session that ties them to one open document.
//!
//! Hosts translate platform input into `InputEvent`s and hand them to an
//! `EditorSession`, then redraw from `EditorSession::scene`.

pub mod error;
pub mod history;
pub mod input;
pub mod insert;
pub mod session;
pub mod settings;
pub mod shortcuts;
pub mod tools;

pub use error::{EditorError, Result};
pub use history::{History, HistoryRecord};
pub use input::{InputEvent, Modifiers};
pub use session::EditorSession;
pub use settings::{ToolKind, ToolSettings};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Outcome, ResizeHandle, ToolController};
