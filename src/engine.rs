use log::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::edit;
use crate::error::EngineError;
use crate::ex::{self, ExCommand, SubstituteArgs, Substitution};
use crate::key::{KeyCode, KeyStroke};
use crate::keymap::{
    self, HistoryCommand, InsertAction, InsertAt, NormalAction, Placement, VisualAction,
};
use crate::macros::MacroRecorder;
use crate::marks::MarkRegistry;
use crate::motion::{self, Cursor, Motion, MotionContext};
use crate::operator::{Operator, Span};
use crate::repeat::RepeatRecorder;
use crate::traits::{Clipboard, TextEdit};
use crate::types::{CaretStyle, Mode, Position, SearchQuery, Selection, VisualKind};
use crate::visual::{self, LeadNudge};

/// Count prefixes. The count typed before an operator is held aside and
/// multiplied with the one typed before its motion, so `2d3w` covers six words.
#[derive(Debug, Default, Clone)]
struct Counts {
    current: Option<u32>,
    operator: Option<u32>,
}

impl Counts {
    fn push_digit(&mut self, d: u32) {
        let next = self
            .current
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(d);
        self.current = Some(next);
    }

    fn hold_for_operator(&mut self) {
        self.operator = self.current.take();
    }

    fn take(&mut self) -> Option<u32> {
        match (self.operator.take(), self.current.take()) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1)).max(1)),
        }
    }

    fn take_or(&mut self, default_: u32) -> u32 {
        self.take().unwrap_or(default_).max(1)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKey {
    None,
    G, // for 'gg' after an operator
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPaste {
    placement: Placement,
    count: u32,
    over_selection: bool,
}

/// The host collaborators for one call into the engine.
struct Host<'a> {
    buf: &'a mut dyn TextEdit,
    clipboard: &'a mut dyn Clipboard,
}

/// The modal keystroke interpreter.
///
/// The engine owns no text: every call borrows the host buffer and register
/// for its duration. All state that outlives a keystroke (mode, counts,
/// marks, macros, last search and substitution) lives here.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    mode: Mode,
    status: String,
    counts: Counts,
    pending: PendingKey,
    sticky_col: Option<u32>,
    caret_style: CaretStyle,
    insert_group_open: bool,
    command_line: String,
    /// The command line was opened with `:` over a visual selection.
    command_over_selection: bool,
    marks: MarkRegistry,
    macros: MacroRecorder,
    repeat: RepeatRecorder,
    replay_depth: usize,
    repeating: bool,
    search: Option<SearchQuery>,
    search_backward: bool,
    last_substitution: Option<Substitution>,
    pending_paste: Option<PendingPaste>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub mode: Mode,
    pub status: String,
    pub sticky_col: Option<u32>,
    pub pending_count: Option<u32>,
    pub recording: Option<char>,
    pub caret_style: CaretStyle,
}

#[derive(Debug, Default, Clone)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn indent_unit(mut self, unit: impl Into<String>) -> Self {
        self.config.indent_unit = unit.into();
        self
    }

    pub fn tab_width(mut self, width: u32) -> Self {
        self.config.tab_width = width;
        self
    }

    pub fn auto_indent(mut self, enabled: bool) -> Self {
        self.config.auto_indent = enabled;
        self
    }

    pub fn search_wrap(mut self, enabled: bool) -> Self {
        self.config.search_wrap = enabled;
        self
    }

    pub fn page_size(mut self, lines: u32) -> Self {
        self.config.page_size = lines.max(1);
        self
    }

    pub fn max_replay_depth(mut self, depth: usize) -> Self {
        self.config.max_replay_depth = depth;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            config: self.config,
            mode: Mode::Unknown,
            status: String::new(),
            counts: Counts::default(),
            pending: PendingKey::None,
            sticky_col: None,
            caret_style: CaretStyle::Block,
            insert_group_open: false,
            command_line: String::new(),
            marks: MarkRegistry::new(),
            macros: MacroRecorder::new(),
            repeat: RepeatRecorder::default(),
            replay_depth: 0,
            repeating: false,
            command_over_selection: false,
            search: None,
            search_backward: false,
            last_substitution: None,
            pending_paste: None,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The status line text.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn caret_style(&self) -> CaretStyle {
        self.caret_style
    }

    pub fn marks(&self) -> &MarkRegistry {
        &self.marks
    }

    pub fn macros(&self) -> &MacroRecorder {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroRecorder {
        &mut self.macros
    }

    pub fn last_search(&self) -> Option<&SearchQuery> {
        self.search.as_ref()
    }

    pub fn last_substitution(&self) -> Option<&Substitution> {
        self.last_substitution.as_ref()
    }

    /// Keystrokes `.` would replay.
    pub fn last_change(&self) -> &[KeyStroke] {
        self.repeat.last_change()
    }

    pub fn is_paste_pending(&self) -> bool {
        self.pending_paste.is_some()
    }

    /// Whether keystrokes should reach the engine before the host's input
    /// method gets to compose them. Only Insert and Replace type text.
    pub fn wants_to_preempt_im(&self) -> bool {
        !self.mode.is_insert()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            mode: self.mode,
            status: self.status.clone(),
            sticky_col: self.sticky_col,
            pending_count: self.counts.current,
            recording: self.macros.recording_name(),
            caret_style: self.caret_style,
        }
    }

    /// Takes over a buffer: Normal mode with a block caret.
    pub fn attach<B: TextEdit>(&mut self, buf: &mut B) {
        self.reset(buf, String::new());
        self.set_caret_style(buf, CaretStyle::Block);
        self.resync_visual(buf);
    }

    /// Hands the buffer back with a bar caret.
    pub fn detach<B: TextEdit>(&mut self, buf: &mut B) {
        self.close_insert_group(buf);
        self.set_caret_style(buf, CaretStyle::Bar);
        self.mode = Mode::Unknown;
    }

    /// Feeds one keystroke through the engine.
    pub fn handle_key<B: TextEdit, C: Clipboard>(
        &mut self,
        buf: &mut B,
        clipboard: &mut C,
        key: KeyStroke,
    ) {
        let mut host = Host { buf, clipboard };
        self.dispatch(&mut host, key);
        self.resync_visual(host.buf);
    }

    pub fn handle_keys<B: TextEdit, C: Clipboard>(
        &mut self,
        buf: &mut B,
        clipboard: &mut C,
        keys: impl IntoIterator<Item = KeyStroke>,
    ) {
        for key in keys {
            self.handle_key(buf, clipboard, key);
        }
    }

    /// Runs an ex command line such as `:s/a/b/` or `/pattern` directly and
    /// returns the status message it produced.
    pub fn run_command<B: TextEdit, C: Clipboard>(
        &mut self,
        buf: &mut B,
        clipboard: &mut C,
        text: &str,
    ) -> Result<String, EngineError> {
        let mut host = Host { buf, clipboard };
        let result = self.execute(&mut host, text);
        match &result {
            Ok(message) => self.reset(host.buf, message.clone()),
            Err(e) => self.reset(host.buf, e.to_string()),
        }
        self.resync_visual(host.buf);
        result
    }

    /// The host moved the caret (mouse click, undo, ...).
    pub fn caret_moved<B: TextEdit>(&mut self, buf: &mut B) {
        self.sticky_col = None;
        let selecting = buf.selection().is_some_and(|s| !s.is_empty());
        match self.mode {
            Mode::Insert | Mode::Replace | Mode::Visual | Mode::VisualLine => {}
            Mode::Normal | Mode::Unknown => edit::retreat_from_line_end(buf),
            _ if selecting => {}
            _ => self.reset(buf, String::new()),
        }
        self.resync_visual(buf);
    }

    /// The host changed the selection.
    pub fn selection_changed<B: TextEdit>(&mut self, buf: &mut B) {
        self.resync_visual(buf);
    }

    /// Delivers register contents for a paste whose clipboard request
    /// returned `None`. `None` cancels the paste.
    pub fn complete_paste<B: TextEdit, C: Clipboard>(
        &mut self,
        buf: &mut B,
        clipboard: &mut C,
        contents: Option<String>,
    ) {
        let mut host = Host { buf, clipboard };
        match contents {
            Some(text) => self.finish_paste(&mut host, text),
            None => self.pending_paste = None,
        }
        self.resync_visual(host.buf);
    }

    fn dispatch(&mut self, host: &mut Host<'_>, key: KeyStroke) {
        trace!("key {key} in {:?}", self.mode);
        if self.mode == Mode::Unknown {
            self.reset(host.buf, String::new());
        }

        if key.is_ctrl('c') || key.is_ctrl('[') {
            if let Some(name) = self.macros.discard() {
                debug!("discarded recording of macro '{name}'");
            }
            self.repeat.cancel();
            self.reset(host.buf, String::new());
            return;
        }

        let stops_recording = self.mode == Mode::Normal && key.is_char('q');
        if self.replay_depth == 0 && self.macros.is_recording() && !stops_recording {
            self.macros.record(key);
        }
        let capture = !self.repeating;
        if capture {
            if self.mode == Mode::Normal && !self.repeat.is_capturing() {
                self.repeat.begin();
            }
            self.repeat.push(key);
        }

        let result = if key.code == KeyCode::Esc {
            self.reset(host.buf, String::new());
            Ok(())
        } else {
            match self.mode {
                Mode::Unknown | Mode::Normal => self.normal(host, key),
                Mode::Insert | Mode::Replace => self.insert(host, key),
                Mode::Visual => self.visual(host, key, VisualKind::CharWise),
                Mode::VisualLine => self.visual(host, key, VisualKind::LineWise),
                Mode::Command => self.command_line(host, key),
                Mode::Delete => self.operator_pending(host, Operator::Delete, key),
                Mode::Yank => self.operator_pending(host, Operator::Yank, key),
                Mode::Change => self.operator_pending(host, Operator::Change, key),
                Mode::Indent => self.operator_pending(host, Operator::Indent, key),
                Mode::Unindent => self.operator_pending(host, Operator::Unindent, key),
                Mode::GPrefix => self.g_prefix(host, key),
                Mode::Fold => self.fold(host, key),
                Mode::Mark => self.set_mark(host, key),
                Mode::GoToMark => self.go_to_mark(host, key),
                Mode::NameMacro => self.name_macro(host, key),
                Mode::PlayMacro => self.play_macro(host, key),
                Mode::ReplaceChar => self.replace_char(host, key),
            }
        };
        if let Err(err) = result {
            debug!("{err} ({key} in {:?})", self.mode);
            self.reset(host.buf, err.to_string());
        }

        if capture
            && self.repeat.is_capturing()
            && self.mode == Mode::Normal
            && self.counts.current.is_none()
        {
            self.repeat.finish();
        }
    }

    fn enter(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        if let Some(label) = mode.label() {
            self.set_status(label);
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.status = match self.macros.recording_name() {
            Some(_) if message.is_empty() => "recording".to_string(),
            Some(_) => format!("{message} recording"),
            None => message,
        };
    }

    fn set_caret_style(&mut self, buf: &mut dyn TextEdit, style: CaretStyle) {
        self.caret_style = style;
        buf.set_caret_style(style);
    }

    /// Back to Normal mode: clears the selection and any half-typed command,
    /// closes an open Insert session and puts the caret back on a character.
    fn reset(&mut self, buf: &mut dyn TextEdit, status: impl Into<String>) {
        if self.mode != Mode::Normal {
            debug!("mode {:?} -> Normal", self.mode);
        }
        self.mode = Mode::Normal;
        self.counts.clear();
        self.pending = PendingKey::None;
        self.command_line.clear();
        self.command_over_selection = false;
        if buf.selection().is_some() {
            buf.set_selection(None);
        }
        if self.caret_style != CaretStyle::Block {
            self.set_caret_style(buf, CaretStyle::Block);
            let caret = buf.caret();
            if caret.col > 0 {
                buf.set_caret(Position::new(caret.line, caret.col - 1));
            }
        }
        self.close_insert_group(buf);
        edit::retreat_from_line_end(buf);
        self.set_status(status);
    }

    /// Enters or leaves a visual mode to match the host's selection.
    ///
    /// A selection appearing in any other mode abandons whatever was in
    /// progress there, except a command line typed over a selection.
    fn resync_visual(&mut self, buf: &mut dyn TextEdit) {
        let selection = buf.selection().filter(|s| !s.is_empty());
        match (self.mode, selection) {
            (Mode::Visual | Mode::VisualLine, Some(_)) => {}
            (Mode::Command, Some(_)) if self.command_over_selection => {}
            (mode, Some(s)) => {
                if !matches!(mode, Mode::Normal | Mode::Unknown) {
                    self.repeat.cancel();
                    self.counts.clear();
                    self.pending = PendingKey::None;
                    self.command_line.clear();
                    self.close_insert_group(buf);
                    self.set_caret_style(buf, CaretStyle::Block);
                }
                self.enter(match s.kind {
                    VisualKind::CharWise => Mode::Visual,
                    VisualKind::LineWise => Mode::VisualLine,
                });
            }
            (Mode::Visual | Mode::VisualLine, None) => self.reset(buf, String::new()),
            _ => {}
        }
    }

    fn begin_insert_group(&mut self, buf: &mut dyn TextEdit) {
        if !self.insert_group_open {
            buf.begin_undo_group();
            self.insert_group_open = true;
        }
    }

    fn close_insert_group(&mut self, buf: &mut dyn TextEdit) {
        if self.insert_group_open {
            buf.end_undo_group();
            self.insert_group_open = false;
        }
    }

    fn enter_insert(&mut self, buf: &mut dyn TextEdit, mode: Mode) {
        let style = if mode == Mode::Replace {
            CaretStyle::Underscore
        } else {
            CaretStyle::Bar
        };
        self.set_caret_style(buf, style);
        self.enter(mode);
    }

    fn count_digit(&self, key: &KeyStroke) -> Option<u32> {
        let d = key.printable()?.to_digit(10)?;
        (d != 0 || self.counts.current.is_some()).then_some(d)
    }

    fn motion_for(&self, key: &KeyStroke, edit_object: bool) -> Option<Motion> {
        key.printable()
            .and_then(|c| {
                if edit_object {
                    motion::edit_object_char(c)
                } else {
                    motion::nav_char(c)
                }
            })
            .or_else(|| motion::direction_key(key.code, key.mods))
    }

    fn motion_context(&self, from: Position, count: Option<u32>, clamp: bool) -> MotionContext {
        MotionContext::new(Cursor {
            pos: from,
            sticky_col: self.sticky_col,
        })
        .with_count(count)
        .with_clamp(clamp)
        .with_page_size(self.config.page_size)
    }

    fn move_caret(&mut self, buf: &mut dyn TextEdit, motion: Motion, clamp: bool) {
        let count = self.counts.take();
        let ctx = self.motion_context(buf.caret(), count, clamp);
        let result = motion.resolve(&ctx, &*buf);
        buf.set_caret(result.pos);
        self.sticky_col = result.sticky_col;
    }

    fn history(&mut self, buf: &mut dyn TextEdit, command: HistoryCommand) {
        self.counts.clear();
        match command {
            HistoryCommand::Undo => buf.undo(),
            HistoryCommand::Redo => buf.redo(),
        }
        self.sticky_col = None;
        edit::retreat_from_line_end(buf);
    }

    // Normal mode

    fn normal(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        if let Some(d) = self.count_digit(&key) {
            self.counts.push_digit(d);
            return Ok(());
        }
        if let Some(action) = keymap::normal_action(&key) {
            self.sticky_col = None;
            self.normal_action(host, action)?;
            if self.mode != Mode::GPrefix && !self.mode.is_operator_pending() {
                self.counts.clear();
            }
            return Ok(());
        }
        if let Some(motion) = self.motion_for(&key, false) {
            self.move_caret(host.buf, motion, true);
            return Ok(());
        }
        if let Some(command) = keymap::history_command(&key) {
            self.history(host.buf, command);
            return Ok(());
        }
        Err(EngineError::UnknownCommand)
    }

    fn normal_action(
        &mut self,
        host: &mut Host<'_>,
        action: NormalAction,
    ) -> Result<(), EngineError> {
        let caret = host.buf.caret();
        match action {
            NormalAction::CommandLine(lead) => {
                self.counts.clear();
                self.command_line = lead.to_string();
                self.enter(Mode::Command);
                self.set_status(lead.to_string());
            }
            NormalAction::Insert(at) => self.insert_at(host.buf, at),
            NormalAction::Replace => {
                self.begin_insert_group(host.buf);
                self.enter_insert(host.buf, Mode::Replace);
            }
            NormalAction::ReplaceChar => self.enter(Mode::ReplaceChar),
            NormalAction::Visual(kind) => self.enter_visual(host.buf, kind),
            NormalAction::Operator(op) => {
                self.counts.hold_for_operator();
                self.enter(op.mode());
            }
            NormalAction::YankLine => {
                self.counts.hold_for_operator();
                self.enter(Mode::Yank);
                return self.operator_pending(host, Operator::Yank, KeyStroke::char('y'));
            }
            NormalAction::DeleteChar => self.delete_chars(host, true)?,
            NormalAction::DeleteCharBefore => self.delete_chars(host, false)?,
            NormalAction::DeleteToLineEnd => {
                let span = self.to_line_end(host.buf);
                self.apply_operator(host, Operator::Delete, span, caret)?;
            }
            NormalAction::ChangeToLineEnd => {
                let span = self.to_line_end(host.buf);
                self.apply_operator(host, Operator::Change, span, caret)?;
            }
            NormalAction::SubstituteChar => {
                let count = self.counts.take_or(1);
                let len = host.buf.line_len(caret.line);
                let end = Position::new(caret.line, caret.col.saturating_add(count).min(len));
                let span = Span::between(&*host.buf, caret, end);
                self.apply_operator(host, Operator::Change, span, caret)?;
            }
            NormalAction::SubstituteLine => {
                let count = self.counts.take_or(1);
                let last = caret.line.saturating_add(count - 1);
                let span = Span::lines(&*host.buf, caret.line, last);
                self.apply_operator(host, Operator::Change, span, caret)?;
            }
            NormalAction::SearchNext => self.search_next(host.buf, false)?,
            NormalAction::SearchPrevious => self.search_next(host.buf, true)?,
            NormalAction::SearchWord => self.search_word(host.buf)?,
            NormalAction::Paste(placement) => self.request_paste(host, placement),
            NormalAction::GPrefix => self.enter(Mode::GPrefix),
            NormalAction::Fold => self.enter(Mode::Fold),
            NormalAction::SetMark => self.enter(Mode::Mark),
            NormalAction::GoToMark => self.enter(Mode::GoToMark),
            NormalAction::Record => match self.macros.stop() {
                Some(name) => {
                    debug!("recorded macro '{name}'");
                    self.reset(host.buf, "Macro Recorded");
                }
                None => self.enter(Mode::NameMacro),
            },
            NormalAction::Play => self.enter(Mode::PlayMacro),
            NormalAction::Join => {
                let count = self.counts.take_or(2).max(2);
                let last = caret.line.saturating_add(count - 1);
                let last = last.min(host.buf.last_line());
                let joined = edit::grouped(host.buf, |buf| edit::join_lines(buf, caret.line, last));
                if let Some(col) = joined {
                    host.buf.set_caret(Position::new(caret.line, col));
                }
            }
            NormalAction::ToggleCase => {
                let count = self.counts.take_or(1);
                let len = host.buf.line_len(caret.line);
                if caret.col < len {
                    let end = caret.col.saturating_add(count).min(len);
                    let offset = host.buf.position_to_offset(caret);
                    let width = (end - caret.col) as usize;
                    let toggled = edit::toggle_case(&host.buf.text(offset, width));
                    edit::grouped(host.buf, |buf| buf.replace(offset, width, &toggled));
                    host.buf.set_caret(Position::new(caret.line, end));
                    edit::retreat_from_line_end(host.buf);
                }
            }
            NormalAction::Repeat => self.repeat_last_change(host)?,
        }
        Ok(())
    }

    fn insert_at(&mut self, buf: &mut dyn TextEdit, at: InsertAt) {
        self.begin_insert_group(buf);
        let caret = buf.caret();
        let len = buf.line_len(caret.line);
        let indent = if self.config.auto_indent {
            edit::indentation(&*buf, caret.line)
        } else {
            String::new()
        };
        let target = match at {
            InsertAt::Caret => caret,
            InsertAt::After => Position::new(caret.line, (caret.col + 1).min(len)),
            InsertAt::FirstNonBlank => Position::new(caret.line, buf.first_non_blank(caret.line)),
            InsertAt::LineEnd => Position::new(caret.line, len),
            InsertAt::LineBelow => edit::open_line(buf, caret.line, true, &indent),
            InsertAt::LineAbove => edit::open_line(buf, caret.line, false, &indent),
        };
        buf.set_caret(target);
        self.enter_insert(buf, Mode::Insert);
    }

    fn enter_visual(&mut self, buf: &mut dyn TextEdit, kind: VisualKind) {
        let caret = buf.caret();
        let selection = match kind {
            VisualKind::CharWise => {
                let offset = buf.position_to_offset(caret);
                let lead = buf.offset_to_position((offset + 1).min(buf.len()));
                Selection::new(caret, lead, kind)
            }
            VisualKind::LineWise => Selection::new(caret, caret, kind),
        };
        buf.set_selection(Some(selection));
        buf.set_caret(selection.lead);
        self.enter(match kind {
            VisualKind::CharWise => Mode::Visual,
            VisualKind::LineWise => Mode::VisualLine,
        });
    }

    fn delete_chars(&mut self, host: &mut Host<'_>, forward: bool) -> Result<(), EngineError> {
        let count = self.counts.take_or(1);
        let caret = host.buf.caret();
        let len = host.buf.line_len(caret.line);
        let (from, to) = if forward {
            if caret.col >= len {
                return Ok(());
            }
            (caret.col, caret.col.saturating_add(count).min(len))
        } else {
            if caret.col == 0 {
                return Ok(());
            }
            (caret.col.saturating_sub(count), caret.col)
        };
        let span = Span::between(
            &*host.buf,
            Position::new(caret.line, from),
            Position::new(caret.line, to),
        );
        self.apply_operator(host, Operator::Delete, span, caret)
    }

    /// From the caret to the end of the line, or of the line `count - 1` below.
    fn to_line_end(&mut self, buf: &mut dyn TextEdit) -> Span {
        let count = self.counts.take_or(1);
        let caret = buf.caret();
        let line = caret.line.saturating_add(count - 1).min(buf.last_line());
        let end = Position::new(line, buf.line_len(line));
        Span::between(&*buf, caret, end)
    }

    // Operators

    fn operator_pending(
        &mut self,
        host: &mut Host<'_>,
        op: Operator,
        key: KeyStroke,
    ) -> Result<(), EngineError> {
        if self.pending == PendingKey::None
            && let Some(d) = self.count_digit(&key)
        {
            self.counts.push_digit(d);
            return Ok(());
        }
        let origin = host.buf.caret();

        if self.pending == PendingKey::G {
            self.pending = PendingKey::None;
            if !key.is_char('g') {
                return Err(EngineError::UnrecognisedMotion);
            }
            let count = self.counts.take();
            let ctx = self.motion_context(origin, count, false);
            let target = Motion::FirstLine.resolve(&ctx, &*host.buf);
            let span = Span::lines(&*host.buf, origin.line, target.pos.line);
            return self.apply_operator(host, op, span, origin);
        }
        if key.is_char('g') {
            self.pending = PendingKey::G;
            return Ok(());
        }

        let count = self.counts.take();
        let span = if key.is_char(op.key()) {
            let last = origin
                .line
                .saturating_add(count.unwrap_or(1) - 1)
                .min(host.buf.last_line());
            Span::lines(&*host.buf, origin.line, last)
        } else {
            let motion = self
                .motion_for(&key, op == Operator::Change)
                .ok_or(EngineError::UnrecognisedMotion)?;
            let ctx = self.motion_context(origin, count, false);
            let result = motion.resolve(&ctx, &*host.buf);
            let target = result.pos;
            if motion.is_linewise() {
                Span::lines(&*host.buf, origin.line, target.line)
            } else if target.line > origin.line && target.col == 0 {
                // An exclusive motion ending at the start of a later line
                // stops at the end of the line before it.
                let line = target.line - 1;
                Span::between(&*host.buf, origin, Position::new(line, host.buf.line_len(line)))
            } else {
                let end = result
                    .offset
                    .unwrap_or_else(|| host.buf.position_to_offset(target));
                Span::chars(host.buf.position_to_offset(origin), end)
            }
        };
        self.apply_operator(host, op, span, origin)
    }

    fn store(&mut self, host: &mut Host<'_>, span: Span) {
        let text = span.register_text(&*host.buf);
        host.clipboard.set(text);
    }

    fn apply_operator(
        &mut self,
        host: &mut Host<'_>,
        op: Operator,
        span: Span,
        origin: Position,
    ) -> Result<(), EngineError> {
        trace!("{op:?} over {span:?}");
        match op {
            Operator::Delete => {
                self.store(host, span);
                host.buf.set_selection(None);
                let start = edit::grouped(host.buf, |buf| edit::delete_span(buf, span));
                let pos = host.buf.offset_to_position(start);
                let caret = if span.is_linewise() {
                    Position::new(pos.line, host.buf.first_non_blank(pos.line))
                } else {
                    pos
                };
                host.buf.set_caret(caret);
                self.reset(host.buf, String::new());
            }
            Operator::Yank => {
                self.store(host, span);
                let caret = match span.lines {
                    Some((first, _)) => Position::new(first.min(origin.line), origin.col),
                    None => host.buf.offset_to_position(span.start),
                };
                host.buf.set_selection(None);
                host.buf.set_caret(host.buf.clamp(caret));
                self.reset(host.buf, String::new());
            }
            Operator::Change => {
                self.begin_insert_group(host.buf);
                self.store(host, span);
                host.buf.set_selection(None);
                let caret = match span.lines {
                    Some((first, last)) => {
                        let indent = if self.config.auto_indent {
                            edit::indentation(&*host.buf, first)
                        } else {
                            String::new()
                        };
                        let start = host.buf.line_offset(first);
                        let end = host.buf.line_offset(last) + host.buf.line_len(last) as usize;
                        host.buf.replace(start, end - start, &indent);
                        Position::new(first, indent.chars().count() as u32)
                    }
                    None => {
                        host.buf.remove(span.start, span.len());
                        host.buf.offset_to_position(span.start)
                    }
                };
                host.buf.set_caret(caret);
                self.enter_insert(host.buf, Mode::Insert);
            }
            Operator::Indent | Operator::Unindent => {
                let (first, last) = span.line_range(&*host.buf);
                let right = op == Operator::Indent;
                let unit = self.config.indent_unit.clone();
                let tab_width = self.config.tab_width;
                host.buf.set_selection(None);
                edit::grouped(host.buf, |buf| {
                    edit::shift_lines(buf, first, last, right, &unit, tab_width)
                });
                let col = host.buf.first_non_blank(first);
                host.buf.set_caret(Position::new(first, col));
                self.reset(host.buf, String::new());
            }
        }
        Ok(())
    }

    // Visual modes

    fn visual(
        &mut self,
        host: &mut Host<'_>,
        key: KeyStroke,
        kind: VisualKind,
    ) -> Result<(), EngineError> {
        if let Some(d) = self.count_digit(&key) {
            self.counts.push_digit(d);
            return Ok(());
        }
        if let Some(action) = keymap::visual_action(&key) {
            return self.visual_action(host, action, kind);
        }
        if let Some(motion) = self.motion_for(&key, false) {
            self.extend_selection(host.buf, motion, kind);
            return Ok(());
        }
        if let Some(command) = keymap::history_command(&key) {
            self.history(host.buf, command);
            return Ok(());
        }
        Err(EngineError::UnknownCommand)
    }

    fn extend_selection(&mut self, buf: &mut dyn TextEdit, motion: Motion, kind: VisualKind) {
        let count = self.counts.take();
        let caret = buf.caret();
        let old = buf
            .selection()
            .unwrap_or_else(|| Selection::new(caret, caret, kind));
        let clamp = kind == VisualKind::LineWise;
        let ctx = self.motion_context(old.lead, count, clamp);
        let result = motion.resolve(&ctx, &*buf);

        let mut anchor = old.anchor;
        let mut lead = result.pos;
        let mut sticky = result.sticky_col;
        if kind == VisualKind::CharWise {
            let pivot = visual::pivot(old.anchor, old.lead, old.anchor, lead);
            anchor = buf.clamp(pivot.anchor);
            let nudge = match pivot.nudge {
                LeadNudge::None => None,
                LeadNudge::Left => Some(Motion::Left),
                LeadNudge::Right => Some(Motion::Right),
            };
            if let Some(nudge) = nudge {
                let ctx = MotionContext::new(Cursor::new(lead)).with_clamp(false);
                lead = nudge.apply(&ctx, &*buf).pos;
                sticky = None;
            }
        }

        buf.set_selection(Some(Selection::new(anchor, lead, kind)));
        buf.set_caret(lead);
        self.sticky_col = sticky;
    }

    fn visual_action(
        &mut self,
        host: &mut Host<'_>,
        action: VisualAction,
        kind: VisualKind,
    ) -> Result<(), EngineError> {
        let caret = host.buf.caret();
        let Some(selection) = host.buf.selection() else {
            self.reset(host.buf, String::new());
            return Ok(());
        };
        let span = Span::from_selection(&*host.buf, &selection);
        match action {
            VisualAction::Delete => {
                self.apply_operator(host, Operator::Delete, span, caret)?;
                self.set_status("Deleted selection");
            }
            VisualAction::Yank => {
                self.store(host, span);
                let start = host.buf.offset_to_position(span.start);
                host.buf.set_selection(None);
                host.buf.set_caret(start);
                self.reset(host.buf, "Yanked selection");
            }
            VisualAction::Change => self.apply_operator(host, Operator::Change, span, caret)?,
            VisualAction::ChangeLines => {
                let span =
                    Span::lines(&*host.buf, selection.first_line(), selection.last_line());
                self.apply_operator(host, Operator::Change, span, caret)?;
            }
            VisualAction::Indent => self.apply_operator(host, Operator::Indent, span, caret)?,
            VisualAction::Unindent => {
                self.apply_operator(host, Operator::Unindent, span, caret)?
            }
            VisualAction::CommandLine => {
                self.counts.clear();
                self.command_line = ":".to_string();
                self.command_over_selection = true;
                self.enter(Mode::Command);
                self.set_status(":");
            }
            VisualAction::Join => {
                let (first, last) = span.line_range(&*host.buf);
                host.buf.set_selection(None);
                let joined = edit::grouped(host.buf, |buf| edit::join_lines(buf, first, last));
                if let Some(col) = joined {
                    host.buf.set_caret(Position::new(first, col));
                }
                self.reset(host.buf, String::new());
            }
            VisualAction::ToggleCase => {
                let toggled = edit::toggle_case(&host.buf.text(span.start, span.len()));
                host.buf.set_selection(None);
                edit::grouped(host.buf, |buf| buf.replace(span.start, span.len(), &toggled));
                let start = host.buf.offset_to_position(span.start);
                host.buf.set_caret(start);
                self.reset(host.buf, String::new());
            }
            VisualAction::Paste(placement) => self.request_paste(host, placement),
            VisualAction::SwitchKind(target) if target == kind => {
                self.reset(host.buf, String::new());
            }
            VisualAction::SwitchKind(target) => {
                host.buf
                    .set_selection(Some(Selection::new(selection.anchor, selection.lead, target)));
                self.enter(match target {
                    VisualKind::CharWise => Mode::Visual,
                    VisualKind::LineWise => Mode::VisualLine,
                });
            }
        }
        Ok(())
    }

    // Insert and Replace modes

    fn insert(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        if let Some(action) = keymap::insert_action(&key) {
            self.insert_action(host.buf, action);
            return Ok(());
        }
        if let Some(motion) = motion::direction_key(key.code, key.mods) {
            self.move_caret(host.buf, motion, false);
            return Ok(());
        }
        if let Some(c) = key.printable() {
            self.type_char(host.buf, c);
        }
        Ok(())
    }

    fn type_char(&mut self, buf: &mut dyn TextEdit, c: char) {
        let caret = buf.caret();
        let offset = buf.position_to_offset(caret);
        let overwrite = self.mode == Mode::Replace && caret.col < buf.line_len(caret.line);
        let mut encoded = [0u8; 4];
        buf.replace(offset, usize::from(overwrite), c.encode_utf8(&mut encoded));
        buf.set_caret(Position::new(caret.line, caret.col + 1));
    }

    fn insert_action(&mut self, buf: &mut dyn TextEdit, action: InsertAction) {
        let caret = buf.caret();
        let offset = buf.position_to_offset(caret);
        match action {
            InsertAction::InsertTab => {
                let unit = self.config.indent_unit.clone();
                buf.insert(offset, &unit);
                let width = unit.chars().count() as u32;
                buf.set_caret(Position::new(caret.line, caret.col + width));
            }
            InsertAction::NewLine => {
                let indent: String = if self.config.auto_indent {
                    edit::indentation(&*buf, caret.line)
                        .chars()
                        .take(caret.col as usize)
                        .collect()
                } else {
                    String::new()
                };
                buf.insert(offset, &format!("\n{indent}"));
                buf.set_caret(Position::new(caret.line + 1, indent.chars().count() as u32));
            }
            InsertAction::Backspace => {
                if caret.col > 0 {
                    buf.remove(offset - 1, 1);
                    buf.set_caret(Position::new(caret.line, caret.col - 1));
                } else if caret.line > 0 {
                    let prev = caret.line - 1;
                    let prev_len = buf.line_len(prev);
                    let delimiter = buf.delimiter_len(prev) as usize;
                    buf.remove(offset - delimiter, delimiter);
                    buf.set_caret(Position::new(prev, prev_len));
                }
            }
            InsertAction::Delete => {
                if caret.col < buf.line_len(caret.line) {
                    buf.remove(offset, 1);
                } else if caret.line < buf.last_line() {
                    let delimiter = buf.delimiter_len(caret.line) as usize;
                    buf.remove(offset, delimiter);
                }
            }
            InsertAction::ToggleOverwrite => {
                let next = if self.mode == Mode::Replace {
                    Mode::Insert
                } else {
                    Mode::Replace
                };
                self.enter_insert(buf, next);
            }
            InsertAction::DeleteWordBefore => {
                let start = buf.prev_subword_start(offset);
                if start < offset {
                    buf.remove(start, offset - start);
                    let pos = buf.offset_to_position(start);
                    buf.set_caret(pos);
                }
            }
            InsertAction::DeleteWordAfter => {
                let end = buf.next_subword_start(offset).min(buf.len());
                if end > offset {
                    buf.remove(offset, end - offset);
                }
            }
            InsertAction::RemoveIndent => {
                let before = buf.line_len(caret.line);
                let unit = self.config.indent_unit.clone();
                edit::shift_lines(buf, caret.line, caret.line, false, &unit, self.config.tab_width);
                let removed = before - buf.line_len(caret.line);
                buf.set_caret(Position::new(caret.line, caret.col.saturating_sub(removed)));
            }
        }
    }

    fn replace_char(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let c = key.printable().ok_or(EngineError::NotACharacter)?;
        let caret = host.buf.caret();
        if caret.col < host.buf.line_len(caret.line) {
            let offset = host.buf.position_to_offset(caret);
            edit::grouped(host.buf, |buf| buf.replace(offset, 1, &c.to_string()));
        }
        self.reset(host.buf, String::new());
        host.buf.set_caret(caret);
        Ok(())
    }

    // Prefix modes

    fn g_prefix(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        if !key.is_char('g') {
            return Err(EngineError::UnknownCommand);
        }
        let count = self.counts.take();
        let ctx = self.motion_context(host.buf.caret(), count, true);
        let target = Motion::FirstLine.resolve(&ctx, &*host.buf);
        host.buf.set_caret(target.pos);
        self.sticky_col = None;
        self.reset(host.buf, String::new());
        Ok(())
    }

    fn fold(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let command = keymap::fold_command(&key).ok_or(EngineError::UnknownCommand)?;
        host.buf.fold(command);
        self.reset(host.buf, String::new());
        Ok(())
    }

    fn set_mark(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let name = key.printable().ok_or(EngineError::NotACharacter)?;
        self.marks.set(name, host.buf.caret())?;
        debug!("set mark '{name}'");
        self.reset(host.buf, String::new());
        Ok(())
    }

    fn go_to_mark(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let name = key.printable().ok_or(EngineError::NotACharacter)?;
        let pos = self.marks.get(name)?;
        let pos = host.buf.clamp(pos);
        host.buf.set_caret(pos);
        self.sticky_col = None;
        self.reset(host.buf, String::new());
        Ok(())
    }

    fn name_macro(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let name = key.printable().ok_or(EngineError::NotACharacter)?;
        self.macros.start(name)?;
        debug!("recording macro '{name}'");
        self.reset(host.buf, String::new());
        Ok(())
    }

    fn play_macro(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        let name = key.printable().ok_or(EngineError::NotACharacter)?;
        let name = self.macros.resolve(name)?;
        self.reset(host.buf, String::new());
        let keys = self
            .macros
            .begin_playback(name, self.config.max_replay_depth)
            .inspect_err(|e| {
                if matches!(e, EngineError::RecursiveMacro(_)) {
                    warn!("refusing to replay macro '{name}' recursively");
                }
            })?;
        debug!("playing macro '{name}' ({} keys)", keys.len());
        // The macro's own commands are captured for `.`, not `@x`.
        self.repeat.cancel();
        self.replay(host, &keys);
        self.macros.end_playback();
        Ok(())
    }

    fn repeat_last_change(&mut self, host: &mut Host<'_>) -> Result<(), EngineError> {
        self.counts.clear();
        if self.replay_depth >= self.config.max_replay_depth {
            warn!("refusing to repeat the last change at depth {}", self.replay_depth);
            return Ok(());
        }
        let keys = self.repeat.last_change().to_vec();
        let repeating = std::mem::replace(&mut self.repeating, true);
        self.replay(host, &keys);
        self.repeating = repeating;
        Ok(())
    }

    fn replay(&mut self, host: &mut Host<'_>, keys: &[KeyStroke]) {
        self.replay_depth += 1;
        for key in keys {
            self.dispatch(host, *key);
            self.resync_visual(host.buf);
        }
        self.replay_depth -= 1;
    }

    // Command line

    fn command_line(&mut self, host: &mut Host<'_>, key: KeyStroke) -> Result<(), EngineError> {
        match key.code {
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.command_line);
                let message = self.execute(host, &text)?;
                self.reset(host.buf, message);
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.command_line.pop();
                if self.command_line.is_empty() {
                    self.reset(host.buf, String::new());
                } else {
                    self.set_status(self.command_line.clone());
                }
            }
            _ => {
                if let Some(c) = key.printable() {
                    self.command_line.push(c);
                    self.set_status(self.command_line.clone());
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, host: &mut Host<'_>, text: &str) -> Result<String, EngineError> {
        debug!("ex command {text:?}");
        match ExCommand::parse(text)? {
            ExCommand::GotoLine(line) => {
                let count = i64::from(host.buf.line_count());
                if !(0..=count).contains(&line) {
                    return Err(EngineError::InvalidLineNumber(line));
                }
                self.sticky_col = None;
                if line == 0 {
                    host.buf.set_caret(Position::ZERO);
                    return Ok("Jumped to beginning of document.".to_string());
                }
                let target = (line - 1) as u32;
                let col = host.buf.first_non_blank(target);
                host.buf.set_caret(Position::new(target, col));
                Ok(format!("Jumped to line {line}."))
            }
            ExCommand::DocumentEnd => {
                let ctx = self.motion_context(host.buf.caret(), None, true);
                let target = Motion::DocumentEnd.resolve(&ctx, &*host.buf);
                host.buf.set_caret(target.pos);
                self.sticky_col = None;
                Ok("Jumped to end of document.".to_string())
            }
            ExCommand::Substitute(args) => self.substitute(host.buf, args),
            ExCommand::Search { backward, pattern } => {
                match pattern {
                    Some(pattern) => self.set_search(pattern, backward)?,
                    None if self.search.is_some() => self.search_backward = backward,
                    None => return Err(EngineError::NoPreviousSearch),
                }
                self.search_next(host.buf, false)?;
                Ok(String::new())
            }
        }
    }

    fn substitute(
        &mut self,
        buf: &mut dyn TextEdit,
        args: Option<SubstituteArgs>,
    ) -> Result<String, EngineError> {
        let substitution = match args {
            None => self
                .last_substitution
                .clone()
                .ok_or(EngineError::NoStoredPattern)?,
            Some(args) => {
                let pattern = if args.pattern.is_empty() {
                    self.last_substitution
                        .as_ref()
                        .map(|s| s.pattern.clone())
                        .ok_or(EngineError::NoStoredPattern)?
                } else {
                    args.pattern
                };
                Substitution {
                    pattern,
                    replacement: args.replacement,
                    ignore_case: args.ignore_case,
                }
            }
        };

        let (start, end) = match buf.selection().filter(|s| !s.is_empty()) {
            Some(selection) => {
                let span = Span::from_selection(&*buf, &selection);
                (span.start, span.end)
            }
            None => {
                let line = buf.caret().line;
                let start = buf.line_offset(line);
                (start, start + buf.line_len(line) as usize)
            }
        };
        let original = buf.text(start, end - start);
        let replaced = substitution.apply(&original)?;
        if replaced != original {
            edit::grouped(buf, |buf| buf.replace(start, end - start, &replaced));
        }
        debug!("substituted /{}/{}/", substitution.pattern, substitution.replacement);
        self.last_substitution = Some(substitution);
        Ok("Performed replacement.".to_string())
    }

    // Search

    fn set_search(&mut self, pattern: String, backward: bool) -> Result<(), EngineError> {
        let query = SearchQuery::smart_case(pattern, self.config.search_wrap);
        ex::validate_search(&query.pattern, query.case_sensitive)?;
        self.search = Some(query);
        self.search_backward = backward;
        Ok(())
    }

    /// Jumps to the next match of the last search, in its direction or the
    /// opposite one.
    fn search_next(&mut self, buf: &mut dyn TextEdit, reverse: bool) -> Result<(), EngineError> {
        let query = self.search.as_ref().ok_or(EngineError::NoPreviousSearch)?;
        let backward = self.search_backward != reverse;
        let offset = buf.position_to_offset(buf.caret());
        let found = if backward {
            buf.search_backward(query, offset)
        } else {
            buf.search_forward(query, (offset + 1).min(buf.len()))
        };
        let found = found.ok_or_else(|| EngineError::PatternNotFound(query.pattern.clone()))?;
        let pos = buf.offset_to_position(found.offset);
        buf.set_caret(pos);
        self.sticky_col = None;
        Ok(())
    }

    fn search_word(&mut self, buf: &mut dyn TextEdit) -> Result<(), EngineError> {
        let offset = buf.position_to_offset(buf.caret());
        let (start, end) = (buf.current_word_start(offset), buf.current_word_end(offset));
        if end <= start {
            return Ok(());
        }
        let word = buf.text(start, end - start);
        if word.trim().is_empty() {
            return Ok(());
        }
        let boundary = |c: Option<char>| {
            if c.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                r"\b"
            } else {
                ""
            }
        };
        let pattern = format!(
            "{}{}{}",
            boundary(word.chars().next()),
            regex::escape(&word),
            boundary(word.chars().last())
        );
        self.search = Some(SearchQuery {
            pattern,
            case_sensitive: true,
            wrap: self.config.search_wrap,
        });
        self.search_backward = false;
        self.search_next(buf, false)
    }

    // Paste

    fn request_paste(&mut self, host: &mut Host<'_>, placement: Placement) {
        self.pending_paste = Some(PendingPaste {
            placement,
            count: self.counts.take_or(1),
            over_selection: self.mode.is_visual(),
        });
        if let Some(text) = host.clipboard.request() {
            self.finish_paste(host, text);
        }
    }

    fn finish_paste(&mut self, host: &mut Host<'_>, text: String) {
        let Some(request) = self.pending_paste.take() else {
            return;
        };
        if text.is_empty() {
            self.reset(host.buf, String::new());
            return;
        }
        let contents = text.repeat(request.count as usize);
        let selection = if request.over_selection {
            host.buf.selection()
        } else {
            None
        };
        let (caret, replaced) = edit::paste(host.buf, &contents, request.placement, selection);
        if let Some(replaced) = replaced {
            host.clipboard.set(replaced);
        }
        host.buf.set_caret(caret);
        self.sticky_col = None;
        self.reset(host.buf, String::new());
    }
}
