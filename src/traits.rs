use crate::types::{
    CaretStyle, FoldCommand, Position, SearchMatch, SearchQuery, Selection, Viewport,
};

/// Read access to the host's document and view.
///
/// Offsets are indices into the document in the host's own unit (the engine
/// only ever does arithmetic on them that stays inside one line or moves by
/// whole lines). Lines are zero-based and a document always has at least one.
pub trait TextOps {
    // Basic queries
    fn len(&self) -> usize;
    fn line_count(&self) -> u32;
    /// Offset of the first character of `line`.
    fn line_offset(&self, line: u32) -> usize;
    /// Length of `line` without its delimiter.
    fn line_len(&self, line: u32) -> u32;
    /// Length of the delimiter ending `line` (0 for the last line).
    fn delimiter_len(&self, line: u32) -> u32;
    fn text(&self, offset: usize, len: usize) -> String;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn last_line(&self) -> u32 {
        self.line_count().saturating_sub(1)
    }

    fn line_text(&self, line: u32) -> String {
        self.text(self.line_offset(line), self.line_len(line) as usize)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len() {
            return None;
        }
        self.text(offset, 1).chars().next()
    }

    fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.last_line());
        let col = pos.col.min(self.line_len(line));
        Position { line, col }
    }

    fn position_to_offset(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.line_offset(pos.line) + pos.col as usize
    }

    fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len());
        let (mut lo, mut hi) = (0u32, self.last_line());
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            if self.line_offset(mid) <= offset {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let col = (offset - self.line_offset(lo)) as u32;
        Position::new(lo, col.min(self.line_len(lo)))
    }

    /// Column of the first non-whitespace character on `line`, or the line
    /// length when the line is blank.
    fn first_non_blank(&self, line: u32) -> u32 {
        self.line_text(line)
            .chars()
            .position(|c| !c.is_whitespace())
            .map_or(self.line_len(line), |col| col as u32)
    }

    // Word boundaries. A "word" is a run of non-blank characters; a
    // "subword" is a run of identifier characters or a run of punctuation.
    fn next_word_start(&self, offset: usize) -> usize;
    fn prev_word_start(&self, offset: usize) -> usize;
    fn next_subword_start(&self, offset: usize) -> usize;
    fn prev_subword_start(&self, offset: usize) -> usize;
    /// End (exclusive) of the subword under `offset`.
    fn current_word_end(&self, offset: usize) -> usize;
    /// Start of the subword under `offset`.
    fn current_word_start(&self, offset: usize) -> usize;

    // View state
    fn caret(&self) -> Position;
    fn selection(&self) -> Option<Selection>;
    fn viewport(&self) -> Option<Viewport> {
        None
    }

    // Search: the host owns the regex engine that matches what it highlights.
    fn search_forward(&self, query: &SearchQuery, from: usize) -> Option<SearchMatch>;
    fn search_backward(&self, query: &SearchQuery, from: usize) -> Option<SearchMatch>;
}

/// Mutating access to the host's document and view.
pub trait TextEdit: TextOps {
    /// Replaces `len` units at `offset` with `text`.
    fn replace(&mut self, offset: usize, len: usize, text: &str);

    fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset, 0, text);
    }

    fn remove(&mut self, offset: usize, len: usize) {
        self.replace(offset, len, "");
    }

    fn set_caret(&mut self, pos: Position);
    fn set_selection(&mut self, selection: Option<Selection>);
    fn set_caret_style(&mut self, style: CaretStyle);

    /// Undo groups nest; everything between the outermost begin/end pair
    /// is undone as one step.
    fn begin_undo_group(&mut self);
    fn end_undo_group(&mut self);
    fn undo(&mut self);
    fn redo(&mut self);

    fn fold(&mut self, _command: FoldCommand) {}
}

/// The register the engine yanks into and pastes from.
pub trait Clipboard {
    /// Returns the register contents, or `None` when they are not available
    /// right now. A host that fetches contents asynchronously returns `None`
    /// and later hands them to [`crate::Engine::complete_paste`].
    fn request(&mut self) -> Option<String>;
    fn set(&mut self, text: String);
}
