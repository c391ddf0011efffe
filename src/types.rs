/// A position within a text buffer.
///
/// Positions are zero-indexed. Columns are counted in whatever unit the host
/// buffer uses for its offsets (typically chars).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based column.
    pub col: u32,
}

impl Position {
    /// The origin position (0, 0).
    pub const ZERO: Position = Position { line: 0, col: 0 };

    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// The current mode of the engine.
///
/// Exactly one mode is active at a time. Besides the classic editing modes
/// this includes the transient modes entered while a multi-key command is
/// half typed (an operator waiting for its motion, `g`, `m`, `q`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Not yet attached; becomes `Normal` on the first keystroke.
    #[default]
    Unknown,
    Normal,
    Insert,
    Replace,
    Visual,
    VisualLine,
    /// Typing an ex command or a search after `:`, `/` or `?`.
    Command,
    Delete,
    Yank,
    Change,
    Indent,
    Unindent,
    /// After `g`.
    GPrefix,
    /// After `z`.
    Fold,
    /// After `m`, waiting for the mark name.
    Mark,
    /// After `` ` ``, waiting for the mark name.
    GoToMark,
    /// After `q`, waiting for the macro name.
    NameMacro,
    /// After `@`, waiting for the macro name.
    PlayMacro,
    /// After `r`, waiting for the replacement character.
    ReplaceChar,
}

impl Mode {
    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    pub fn is_insert(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }

    pub fn is_operator_pending(self) -> bool {
        matches!(
            self,
            Mode::Delete | Mode::Yank | Mode::Change | Mode::Indent | Mode::Unindent
        )
    }

    /// The status line text shown while the mode is active, for modes that
    /// have a fixed one.
    pub fn label(self) -> Option<&'static str> {
        Some(match self {
            Mode::Insert => "-- INSERT --",
            Mode::Replace | Mode::ReplaceChar => "-- REPLACE --",
            Mode::Visual => "-- VISUAL --",
            Mode::VisualLine => "-- VISUAL LINE --",
            Mode::Delete => "d",
            Mode::Yank => "y",
            Mode::Change => "c",
            Mode::Indent => ">",
            Mode::Unindent => "<",
            Mode::GPrefix => "g",
            Mode::Fold => "z",
            Mode::Mark => "m",
            Mode::GoToMark => "`",
            Mode::NameMacro => "q",
            Mode::PlayMacro => "@",
            Mode::Unknown | Mode::Normal | Mode::Command => return None,
        })
    }
}

/// The type of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// Character-wise selection (v).
    CharWise,
    /// Line-wise selection (V).
    LineWise,
}

/// A text selection as an anchor/lead pair.
///
/// The anchor stays where the selection was started; the lead follows the
/// caret. Character-wise selections cover `[min, max)` of the two positions;
/// line-wise selections cover every line from the anchor's to the lead's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub lead: Position,
    pub kind: VisualKind,
}

impl Selection {
    pub fn new(anchor: Position, lead: Position, kind: VisualKind) -> Self {
        Self { anchor, lead, kind }
    }

    /// A character-wise selection with anchor and lead in the same place
    /// selects nothing. Line-wise selections always cover at least one line.
    pub fn is_empty(&self) -> bool {
        self.kind == VisualKind::CharWise && self.anchor == self.lead
    }

    pub fn first_line(&self) -> u32 {
        self.anchor.line.min(self.lead.line)
    }

    pub fn last_line(&self) -> u32 {
        self.anchor.line.max(self.lead.line)
    }
}

/// How the host should draw the caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaretStyle {
    /// Covers the character under the caret (Normal and Visual modes).
    #[default]
    Block,
    /// A thin bar between characters (Insert mode).
    Bar,
    /// Underline (Replace mode).
    Underscore,
}

/// A search request forwarded to the host's search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// A regular expression.
    pub pattern: String,
    pub case_sensitive: bool,
    /// Continue from the other end of the document when nothing is found.
    pub wrap: bool,
}

impl SearchQuery {
    /// Builds a query whose case sensitivity is inferred from the pattern:
    /// any uppercase letter makes it case-sensitive.
    pub fn smart_case(pattern: impl Into<String>, wrap: bool) -> Self {
        let pattern = pattern.into();
        let case_sensitive = pattern.chars().any(char::is_uppercase);
        Self {
            pattern,
            case_sensitive,
            wrap,
        }
    }
}

/// A match reported by the host's search, in buffer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub offset: usize,
    pub len: usize,
}

/// The lines currently visible in the host's view, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first_line: u32,
    pub last_line: u32,
}

impl Viewport {
    pub fn height(&self) -> u32 {
        self.last_line.saturating_sub(self.first_line) + 1
    }
}

/// Fold commands reachable through the `z` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldCommand {
    Toggle,
    ToggleRecursive,
    Open,
    OpenRecursive,
    Close,
    CloseRecursive,
    OpenAll,
    CloseAll,
}
