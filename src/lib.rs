pub mod clipboard;
pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod ex;
pub mod key;
pub mod keymap;
pub mod macros;
pub mod marks;
pub mod motion;
pub mod notation;
pub mod operator;
pub mod repeat;
pub mod traits;
pub mod types;
pub mod visual;

pub use crate::clipboard::Register;
#[cfg(feature = "clipboard")]
pub use crate::clipboard::SystemClipboard;
pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, EngineBuilder, EngineSnapshot};
pub use crate::error::{EngineError, ErrorKind};
pub use crate::ex::{ExCommand, Substitution};
pub use crate::key::{KeyCode, KeyStroke, Modifiers};
pub use crate::macros::{Macro, MacroRecorder};
pub use crate::marks::{Mark, MarkRegistry};
pub use crate::motion::{Cursor, Motion, MotionContext, MotionResult};
pub use crate::notation::{KeyNotationError, parse_keys, to_notation};
pub use crate::operator::{Operator, Span};
pub use crate::traits::{Clipboard, TextEdit, TextOps};
pub use crate::types::{
    CaretStyle, FoldCommand, Mode, Position, SearchMatch, SearchQuery, Selection, Viewport,
    VisualKind,
};
