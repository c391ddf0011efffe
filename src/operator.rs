use crate::traits::TextOps;
use crate::types::{Mode, Position, Selection, VisualKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Yank,
    Change,
    Indent,
    Unindent,
}

impl Operator {
    /// The key that invokes the operator; typing it twice applies the
    /// operator to whole lines.
    pub fn key(self) -> char {
        match self {
            Operator::Delete => 'd',
            Operator::Yank => 'y',
            Operator::Change => 'c',
            Operator::Indent => '>',
            Operator::Unindent => '<',
        }
    }

    /// The operator-pending mode entered after the operator key.
    pub fn mode(self) -> Mode {
        match self {
            Operator::Delete => Mode::Delete,
            Operator::Yank => Mode::Yank,
            Operator::Change => Mode::Change,
            Operator::Indent => Mode::Indent,
            Operator::Unindent => Mode::Unindent,
        }
    }
}

/// The text an operator acts on, as buffer offsets `[start, end)`.
///
/// Line-wise spans record their first and last line and include the last
/// line's delimiter, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub lines: Option<(u32, u32)>,
}

impl Span {
    /// Character-wise span between two positions, in either order.
    pub fn between<T: TextOps + ?Sized>(text: &T, a: Position, b: Position) -> Span {
        Span::chars(text.position_to_offset(a), text.position_to_offset(b))
    }

    /// Character-wise span between two offsets, in either order.
    pub fn chars(a: usize, b: usize) -> Span {
        Span {
            start: a.min(b),
            end: a.max(b),
            lines: None,
        }
    }

    /// Every line from `first` to `last`, in either order.
    pub fn lines<T: TextOps + ?Sized>(text: &T, first: u32, last: u32) -> Span {
        let (first, last) = (first.min(last), first.max(last).min(text.last_line()));
        let end = text.line_offset(last)
            + text.line_len(last) as usize
            + text.delimiter_len(last) as usize;
        Span {
            start: text.line_offset(first),
            end,
            lines: Some((first, last)),
        }
    }

    pub fn from_selection<T: TextOps + ?Sized>(text: &T, selection: &Selection) -> Span {
        match selection.kind {
            VisualKind::CharWise => Span::between(text, selection.anchor, selection.lead),
            VisualKind::LineWise => {
                Span::lines(text, selection.first_line(), selection.last_line())
            }
        }
    }

    pub fn is_linewise(&self) -> bool {
        self.lines.is_some()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// First and last line touched by the span.
    pub fn line_range<T: TextOps + ?Sized>(&self, text: &T) -> (u32, u32) {
        if let Some(lines) = self.lines {
            return lines;
        }
        let first = text.offset_to_position(self.start).line;
        let last = text
            .offset_to_position(self.end.saturating_sub(1).max(self.start))
            .line;
        (first, last)
    }

    /// The text stored in the register. Line-wise text always ends with a
    /// line delimiter, so pasting it again inserts whole lines.
    pub fn register_text<T: TextOps + ?Sized>(&self, text: &T) -> String {
        let mut out = text.text(self.start, self.len());
        if let Some((_, last)) = self.lines {
            if text.delimiter_len(last) == 0 {
                out.push('\n');
            }
        }
        out
    }
}
