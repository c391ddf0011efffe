use thiserror::Error;

/// Errors reported while interpreting keystrokes.
///
/// None of these are fatal: the engine resets to Normal mode and shows the
/// message on the status line. The `Display` text is exactly that message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Unrecognised motion")]
    UnrecognisedMotion,

    #[error("Unknown command")]
    UnknownCommand,

    #[error("Command not recognised")]
    CommandNotRecognised,

    #[error("Keystroke was not a character")]
    NotACharacter,

    #[error("Invalid Mark")]
    InvalidMarkName(char),

    #[error("Invalid Macro Name")]
    InvalidMacroName(char),

    #[error("Unknown Mark")]
    UnknownMark(char),

    #[error("Invalid Macro Name '{0}'")]
    UnknownMacro(char),

    #[error("Macro '{0}' is already playing")]
    RecursiveMacro(char),

    #[error("Invalid line number.")]
    InvalidLineNumber(i64),

    #[error("No stored pattern.")]
    NoStoredPattern,

    #[error("No previous search.")]
    NoPreviousSearch,

    #[error("Replacement error: {0}")]
    Replacement(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Pattern not found: '{0}'")]
    PatternNotFound(String),
}

/// Coarse classification of [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The keystroke has no meaning in the current mode.
    UnrecognisedInput,
    /// A mark or macro name outside the allowed set.
    InvalidName,
    /// The named mark, macro or line does not exist.
    InvalidTarget,
    /// A search or substitution pattern problem.
    Pattern,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnrecognisedMotion
            | EngineError::UnknownCommand
            | EngineError::CommandNotRecognised
            | EngineError::NotACharacter => ErrorKind::UnrecognisedInput,
            EngineError::InvalidMarkName(_) | EngineError::InvalidMacroName(_) => {
                ErrorKind::InvalidName
            }
            EngineError::UnknownMark(_)
            | EngineError::UnknownMacro(_)
            | EngineError::RecursiveMacro(_)
            | EngineError::InvalidLineNumber(_) => ErrorKind::InvalidTarget,
            EngineError::NoStoredPattern
            | EngineError::NoPreviousSearch
            | EngineError::Replacement(_)
            | EngineError::InvalidPattern(_)
            | EngineError::PatternNotFound(_) => ErrorKind::Pattern,
        }
    }
}
