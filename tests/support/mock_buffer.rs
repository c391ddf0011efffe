use regex::{Regex, RegexBuilder};
use ropey::Rope;
use vi_engine::traits::{TextEdit, TextOps};
use vi_engine::types::{
    CaretStyle, FoldCommand, Position, SearchMatch, SearchQuery, Selection, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Newline,
    Blank,
    Word,
    Punct,
}

fn class_of(c: char) -> Class {
    match c {
        '\n' | '\r' => Class::Newline,
        c if c.is_whitespace() => Class::Blank,
        c if c.is_alphanumeric() || c == '_' => Class::Word,
        _ => Class::Punct,
    }
}

/// `W`-style classes: any run of non-blank characters is one word.
fn big_class_of(c: char) -> Class {
    match class_of(c) {
        Class::Punct => Class::Word,
        other => other,
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    rope: Rope,
    caret: Position,
}

/// Rope-backed host buffer with nested undo groups.
#[derive(Debug, Clone)]
pub struct MockBuffer {
    rope: Rope,
    caret: Position,
    selection: Option<Selection>,
    pub caret_style: CaretStyle,
    pub viewport: Option<Viewport>,
    pub folds: Vec<FoldCommand>,
    group_depth: u32,
    group_start: Option<Snapshot>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl MockBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            caret: Position::ZERO,
            selection: None,
            caret_style: CaretStyle::Bar,
            viewport: None,
            folds: Vec::new(),
            group_depth: 0,
            group_start: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn with_caret(mut self, line: u32, col: u32) -> Self {
        self.caret = Position::new(line, col);
        self
    }

    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn open_groups(&self) -> u32 {
        self.group_depth
    }

    /// Moves the caret the way a mouse click would, without telling the engine.
    pub fn place_caret(&mut self, line: u32, col: u32) {
        self.caret = Position::new(line, col);
    }

    pub fn place_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn class_at(&self, offset: usize, classify: fn(char) -> Class) -> Class {
        classify(self.rope.char(offset))
    }

    fn next_start(&self, offset: usize, classify: fn(char) -> Class) -> usize {
        let n = self.rope.len_chars();
        if offset >= n {
            return n;
        }
        let start = self.class_at(offset, classify);
        let mut i = offset;
        if matches!(start, Class::Word | Class::Punct) {
            while i < n && self.class_at(i, classify) == start {
                i += 1;
            }
        }
        while i < n {
            match self.class_at(i, classify) {
                Class::Blank => i += 1,
                Class::Newline => {
                    i += 1;
                    if i < n && self.class_at(i, classify) == Class::Newline {
                        return i;
                    }
                }
                _ => break,
            }
        }
        i
    }

    fn prev_start(&self, offset: usize, classify: fn(char) -> Class) -> usize {
        let offset = offset.min(self.rope.len_chars());
        if offset == 0 {
            return 0;
        }
        let mut i = offset - 1;
        while i > 0 && matches!(self.class_at(i, classify), Class::Blank | Class::Newline) {
            i -= 1;
        }
        let class = self.class_at(i, classify);
        if matches!(class, Class::Blank | Class::Newline) {
            return i;
        }
        while i > 0 && self.class_at(i - 1, classify) == class {
            i -= 1;
        }
        i
    }

    fn regex(query: &SearchQuery) -> Option<Regex> {
        RegexBuilder::new(&query.pattern)
            .case_insensitive(!query.case_sensitive)
            .multi_line(true)
            .build()
            .ok()
    }

    fn matches(&self, query: &SearchQuery) -> Vec<SearchMatch> {
        let Some(regex) = Self::regex(query) else {
            return Vec::new();
        };
        let text = self.rope.to_string();
        regex
            .find_iter(&text)
            .map(|m| {
                let offset = self.rope.byte_to_char(m.start());
                SearchMatch {
                    offset,
                    len: self.rope.byte_to_char(m.end()) - offset,
                }
            })
            .collect()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rope: self.rope.clone(),
            caret: self.caret,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.rope = snapshot.rope;
        self.caret = self.clamp(snapshot.caret);
        self.selection = None;
    }
}

impl TextOps for MockBuffer {
    fn len(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> u32 {
        self.rope.len_lines() as u32
    }

    fn line_offset(&self, line: u32) -> usize {
        let line = (line as usize).min(self.rope.len_lines() - 1);
        self.rope.line_to_char(line)
    }

    fn line_len(&self, line: u32) -> u32 {
        if line >= self.line_count() {
            return 0;
        }
        let chars = self.rope.line(line as usize).len_chars() as u32;
        chars - self.delimiter_len(line)
    }

    fn delimiter_len(&self, line: u32) -> u32 {
        if line >= self.line_count() {
            return 0;
        }
        let text = self.rope.line(line as usize);
        let n = text.len_chars();
        match (n.checked_sub(2).map(|i| text.char(i)), n.checked_sub(1).map(|i| text.char(i))) {
            (Some('\r'), Some('\n')) => 2,
            (_, Some('\n' | '\r')) => 1,
            _ => 0,
        }
    }

    fn text(&self, offset: usize, len: usize) -> String {
        let start = offset.min(self.len());
        let end = offset.saturating_add(len).min(self.len());
        self.rope.slice(start..end).to_string()
    }

    fn next_word_start(&self, offset: usize) -> usize {
        self.next_start(offset, big_class_of)
    }

    fn prev_word_start(&self, offset: usize) -> usize {
        self.prev_start(offset, big_class_of)
    }

    fn next_subword_start(&self, offset: usize) -> usize {
        self.next_start(offset, class_of)
    }

    fn prev_subword_start(&self, offset: usize) -> usize {
        self.prev_start(offset, class_of)
    }

    fn current_word_end(&self, offset: usize) -> usize {
        let n = self.len();
        if offset >= n {
            return n;
        }
        let class = self.class_at(offset, class_of);
        if class == Class::Newline {
            return offset;
        }
        let mut i = offset;
        while i < n && self.class_at(i, class_of) == class {
            i += 1;
        }
        i
    }

    fn current_word_start(&self, offset: usize) -> usize {
        if offset >= self.len() {
            return offset.min(self.len());
        }
        let class = self.class_at(offset, class_of);
        let mut i = offset;
        while i > 0 && self.class_at(i - 1, class_of) == class {
            i -= 1;
        }
        i
    }

    fn caret(&self) -> Position {
        self.caret
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn search_forward(&self, query: &SearchQuery, from: usize) -> Option<SearchMatch> {
        let found = self.matches(query);
        found
            .iter()
            .find(|m| m.offset >= from)
            .or_else(|| query.wrap.then(|| found.first()).flatten())
            .copied()
    }

    fn search_backward(&self, query: &SearchQuery, from: usize) -> Option<SearchMatch> {
        let found = self.matches(query);
        found
            .iter()
            .rev()
            .find(|m| m.offset < from)
            .or_else(|| query.wrap.then(|| found.last()).flatten())
            .copied()
    }
}

impl TextEdit for MockBuffer {
    fn replace(&mut self, offset: usize, len: usize, text: &str) {
        if self.group_depth == 0 {
            let snapshot = self.snapshot();
            self.undo_stack.push(snapshot);
            self.redo_stack.clear();
        }
        let start = offset.min(self.len());
        let end = offset.saturating_add(len).min(self.len());
        self.rope.remove(start..end);
        self.rope.insert(start, text);
    }

    fn set_caret(&mut self, pos: Position) {
        self.caret = pos;
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn set_caret_style(&mut self, style: CaretStyle) {
        self.caret_style = style;
    }

    fn begin_undo_group(&mut self) {
        if self.group_depth == 0 {
            self.group_start = Some(self.snapshot());
        }
        self.group_depth += 1;
    }

    fn end_undo_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth > 0 {
            return;
        }
        if let Some(start) = self.group_start.take()
            && start.rope != self.rope
        {
            self.undo_stack.push(start);
            self.redo_stack.clear();
        }
    }

    fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            let current = self.snapshot();
            self.redo_stack.push(current);
            self.restore(previous);
        }
    }

    fn redo(&mut self) {
        if let Some(next) = self.redo_stack.pop() {
            let current = self.snapshot();
            self.undo_stack.push(current);
            self.restore(next);
        }
    }

    fn fold(&mut self, command: FoldCommand) {
        self.folds.push(command);
    }
}
