//! Caret motions.
//!
//! A motion is a pure function of the buffer and a [`MotionContext`]: it
//! never touches the caret itself. The engine applies the result in Normal
//! and Visual modes and turns it into a span for operators.

use crate::key::{KeyCode, Modifiers};
use crate::traits::TextOps;
use crate::types::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    NextWord,
    PrevWord,
    NextSubword,
    PrevSubword,
    /// End of the subword under the caret (the `cw` object).
    WordEnd,
    /// Start of the subword under the caret (the `cb` object).
    WordStart,
    LineStart,
    FirstNonBlank,
    LineEnd,
    /// Alternates between the first non-blank and column zero.
    LineHome,
    /// Line `count`, or the first line (`gg`).
    FirstLine,
    /// Line `count`, or the last line (`G`).
    LastLine,
    DocumentStart,
    DocumentEnd,
    PrevEmptyLine,
    NextEmptyLine,
    MatchingBracket,
    ViewTop,
    ViewMiddle,
    ViewBottom,
}

/// The caret a motion starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub pos: Position,
    /// Column that vertical motions try to return to.
    pub sticky_col: Option<u32>,
}

impl Cursor {
    pub fn new(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionContext {
    pub cursor: Cursor,
    pub count: Option<u32>,
    /// Overrides the cursor position; set between repetitions.
    pub starting: Option<Position>,
    /// Keep the result on a character rather than past the end of the line.
    pub clamp: bool,
    pub page_size: u32,
}

impl MotionContext {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            count: None,
            starting: None,
            clamp: true,
            page_size: 20,
        }
    }

    pub fn with_count(mut self, count: Option<u32>) -> Self {
        self.count = count;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn origin(&self) -> Position {
        self.starting.unwrap_or(self.cursor.pos)
    }

    fn repetitions(&self) -> u32 {
        self.count.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionResult {
    pub pos: Position,
    pub sticky_col: Option<u32>,
    /// Set when the motion computed a buffer offset directly.
    pub offset: Option<usize>,
}

impl MotionResult {
    fn at(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: None,
            offset: None,
        }
    }

    fn sticky(pos: Position, col: u32) -> Self {
        Self {
            pos,
            sticky_col: Some(col),
            offset: None,
        }
    }
}

impl Motion {
    /// Motions that take the operator's whole lines rather than the
    /// characters between caret and target.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            Motion::Up
                | Motion::Down
                | Motion::PageUp
                | Motion::PageDown
                | Motion::FirstLine
                | Motion::LastLine
                | Motion::DocumentStart
                | Motion::DocumentEnd
                | Motion::ViewTop
                | Motion::ViewMiddle
                | Motion::ViewBottom
        )
    }

    /// Motions applied once: they read the count as an argument, or toggle
    /// between two places and ignore it.
    fn is_absolute(self) -> bool {
        matches!(
            self,
            Motion::MatchingBracket
                | Motion::LineHome
                | Motion::FirstLine
                | Motion::LastLine
                | Motion::DocumentStart
                | Motion::DocumentEnd
                | Motion::ViewTop
                | Motion::ViewMiddle
                | Motion::ViewBottom
        )
    }

    /// Applies the motion `count` times, feeding each result into the next
    /// repetition. Stops early once the caret no longer moves or starts
    /// alternating between two positions.
    pub fn resolve<T: TextOps + ?Sized>(self, ctx: &MotionContext, text: &T) -> MotionResult {
        if self.is_absolute() {
            return self.apply(ctx, text);
        }
        let mut step = *ctx;
        let mut result = MotionResult {
            pos: ctx.origin(),
            sticky_col: ctx.cursor.sticky_col,
            offset: None,
        };
        let mut before = None;
        for _ in 0..ctx.repetitions() {
            let next = self.apply(&step, text);
            let stalled = next.pos == result.pos || before == Some(next.pos);
            before = Some(result.pos);
            result = next;
            step.starting = Some(next.pos);
            step.cursor.sticky_col = next.sticky_col;
            if stalled {
                break;
            }
        }
        result
    }

    /// A single application of the motion from `ctx.origin()`.
    pub fn apply<T: TextOps + ?Sized>(self, ctx: &MotionContext, text: &T) -> MotionResult {
        let p = text.clamp(ctx.origin());
        let clamp = ctx.clamp;
        let last = text.last_line();
        match self {
            Motion::Left => {
                let col = p.col.min(max_col(text, p.line, clamp));
                MotionResult::at(Position::new(p.line, col.saturating_sub(1)))
            }
            Motion::Right => {
                let max = max_col(text, p.line, clamp);
                let col = if p.col < max { p.col + 1 } else { max };
                MotionResult::at(Position::new(p.line, col))
            }
            Motion::Up => vertical(text, p, ctx.cursor.sticky_col, -1, clamp),
            Motion::Down => vertical(text, p, ctx.cursor.sticky_col, 1, clamp),
            Motion::PageUp => vertical(text, p, ctx.cursor.sticky_col, -page(text, ctx), clamp),
            Motion::PageDown => vertical(text, p, ctx.cursor.sticky_col, page(text, ctx), clamp),
            Motion::NextWord => by_offset(text, p, clamp, |o| text.next_word_start(o)),
            Motion::PrevWord => by_offset(text, p, clamp, |o| text.prev_word_start(o)),
            Motion::NextSubword => by_offset(text, p, clamp, |o| text.next_subword_start(o)),
            Motion::PrevSubword => by_offset(text, p, clamp, |o| text.prev_subword_start(o)),
            Motion::WordEnd => by_offset(text, p, clamp, |o| text.current_word_end(o)),
            Motion::WordStart => by_offset(text, p, clamp, |o| text.current_word_start(o)),
            Motion::LineStart => MotionResult::at(Position::new(p.line, 0)),
            Motion::FirstNonBlank => first_non_blank(text, p.line, clamp),
            Motion::LineEnd => {
                MotionResult::sticky(Position::new(p.line, max_col(text, p.line, clamp)), u32::MAX)
            }
            Motion::LineHome => {
                let indent = text.first_non_blank(p.line);
                let col = if p.col == indent { 0 } else { indent };
                MotionResult::at(settle(text, Position::new(p.line, col), clamp))
            }
            Motion::FirstLine => {
                let line = ctx.count.map_or(0, |n| n.saturating_sub(1)).min(last);
                first_non_blank(text, line, clamp)
            }
            Motion::LastLine => {
                let line = ctx.count.map_or(last, |n| n.saturating_sub(1)).min(last);
                first_non_blank(text, line, clamp)
            }
            Motion::DocumentStart => MotionResult {
                pos: Position::ZERO,
                sticky_col: None,
                offset: Some(0),
            },
            Motion::DocumentEnd => {
                let pos = Position::new(last, max_col(text, last, clamp));
                MotionResult {
                    pos,
                    sticky_col: None,
                    offset: Some(text.position_to_offset(pos)),
                }
            }
            Motion::PrevEmptyLine => {
                let found = (0..p.line)
                    .rev()
                    .find(|&l| text.line_len(l) == 0 && text.line_len(l + 1) != 0);
                MotionResult::at(Position::new(found.unwrap_or(0), 0))
            }
            Motion::NextEmptyLine => {
                let found = (p.line + 1..=last)
                    .find(|&l| text.line_len(l) == 0 && text.line_len(l - 1) != 0);
                match found {
                    Some(line) => MotionResult::at(Position::new(line, 0)),
                    None => MotionResult::at(Position::new(last, max_col(text, last, clamp))),
                }
            }
            Motion::MatchingBracket => MotionResult::at(matching_bracket(text, p).unwrap_or(p)),
            Motion::ViewTop | Motion::ViewMiddle | Motion::ViewBottom => {
                let (top, bottom) = text
                    .viewport()
                    .map_or((0, last), |v| (v.first_line.min(last), v.last_line.min(last)));
                let line = match self {
                    Motion::ViewTop => top,
                    Motion::ViewBottom => bottom,
                    _ => top + (bottom.saturating_sub(top)) / 2,
                };
                first_non_blank(text, line, clamp)
            }
        }
    }
}

/// Rightmost column the caret may occupy on `line`.
fn max_col<T: TextOps + ?Sized>(text: &T, line: u32, clamp: bool) -> u32 {
    let len = text.line_len(line);
    if clamp { len.saturating_sub(1) } else { len }
}

fn settle<T: TextOps + ?Sized>(text: &T, pos: Position, clamp: bool) -> Position {
    Position::new(pos.line, pos.col.min(max_col(text, pos.line, clamp)))
}

fn first_non_blank<T: TextOps + ?Sized>(text: &T, line: u32, clamp: bool) -> MotionResult {
    let col = text.first_non_blank(line);
    MotionResult::at(settle(text, Position::new(line, col), clamp))
}

fn page<T: TextOps + ?Sized>(text: &T, ctx: &MotionContext) -> i64 {
    let lines = text
        .viewport()
        .map(|v| v.height().saturating_sub(1))
        .filter(|&h| h > 0)
        .unwrap_or(ctx.page_size);
    i64::from(lines.max(1))
}

fn vertical<T: TextOps + ?Sized>(
    text: &T,
    p: Position,
    sticky: Option<u32>,
    delta: i64,
    clamp: bool,
) -> MotionResult {
    let desired = sticky.unwrap_or(p.col);
    let target = (i64::from(p.line) + delta).clamp(0, i64::from(text.last_line())) as u32;
    if target == p.line {
        return MotionResult::sticky(p, desired);
    }
    let col = desired.min(max_col(text, target, clamp));
    MotionResult::sticky(Position::new(target, col), desired)
}

fn by_offset<T: TextOps + ?Sized>(
    text: &T,
    p: Position,
    clamp: bool,
    step: impl Fn(usize) -> usize,
) -> MotionResult {
    let offset = step(text.position_to_offset(p)).min(text.len());
    let pos = settle(text, text.offset_to_position(offset), clamp);
    MotionResult {
        pos,
        sticky_col: None,
        offset: Some(offset),
    }
}

const BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}')];

/// Finds the bracket paired with the one under the caret, or with the first
/// bracket after the caret on the same line.
fn matching_bracket<T: TextOps + ?Sized>(text: &T, p: Position) -> Option<Position> {
    let line = text.line_text(p.line);
    let (col, c) = line
        .chars()
        .enumerate()
        .skip(p.col as usize)
        .find(|(_, c)| BRACKETS.iter().any(|(o, cl)| c == o || c == cl))?;
    let start = text.line_offset(p.line) + col;

    let mut depth = 0usize;
    if let Some(&(open, close)) = BRACKETS.iter().find(|(o, _)| *o == c) {
        let tail = text.text(start, text.len() - start);
        for (i, ch) in tail.chars().enumerate() {
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Some(text.offset_to_position(start + i));
                }
            }
        }
    } else {
        let &(open, close) = BRACKETS.iter().find(|(_, cl)| *cl == c)?;
        let head = text.text(0, start + 1);
        for (i, ch) in head.chars().rev().enumerate() {
            if ch == close {
                depth += 1;
            } else if ch == open {
                depth -= 1;
                if depth == 0 {
                    return Some(text.offset_to_position(start - i));
                }
            }
        }
    }
    None
}

const NAV_CHARS: &[(char, Motion)] = &[
    ('h', Motion::Left),
    ('l', Motion::Right),
    ('k', Motion::Up),
    ('j', Motion::Down),
    ('b', Motion::PrevSubword),
    ('B', Motion::PrevWord),
    ('w', Motion::NextSubword),
    ('W', Motion::NextWord),
    ('%', Motion::MatchingBracket),
    ('0', Motion::LineStart),
    ('^', Motion::FirstNonBlank),
    ('_', Motion::FirstNonBlank),
    ('$', Motion::LineEnd),
    ('G', Motion::LastLine),
    ('{', Motion::PrevEmptyLine),
    ('}', Motion::NextEmptyLine),
    ('H', Motion::ViewTop),
    ('M', Motion::ViewMiddle),
    ('L', Motion::ViewBottom),
];

/// Word objects used by `c`; anything else falls back to [`nav_char`].
const EDIT_OBJECT_CHARS: &[(char, Motion)] = &[
    ('w', Motion::WordEnd),
    ('W', Motion::WordEnd),
    ('b', Motion::WordStart),
    ('B', Motion::WordStart),
];

const DIRECTION_KEYS: &[(KeyCode, Modifiers, Motion)] = &[
    (KeyCode::Left, Modifiers::empty(), Motion::Left),
    (KeyCode::Right, Modifiers::empty(), Motion::Right),
    (KeyCode::Up, Modifiers::empty(), Motion::Up),
    (KeyCode::Down, Modifiers::empty(), Motion::Down),
    (KeyCode::Home, Modifiers::empty(), Motion::LineHome),
    (KeyCode::End, Modifiers::empty(), Motion::LineEnd),
    (KeyCode::PageUp, Modifiers::empty(), Motion::PageUp),
    (KeyCode::PageDown, Modifiers::empty(), Motion::PageDown),
    (KeyCode::Left, Modifiers::CTRL, Motion::PrevWord),
    (KeyCode::Right, Modifiers::CTRL, Motion::NextWord),
    (KeyCode::Char('u'), Modifiers::CTRL, Motion::PageUp),
    (KeyCode::Char('d'), Modifiers::CTRL, Motion::PageDown),
    (KeyCode::Home, Modifiers::CTRL, Motion::DocumentStart),
    (KeyCode::End, Modifiers::CTRL, Motion::DocumentEnd),
];

pub fn nav_char(c: char) -> Option<Motion> {
    NAV_CHARS.iter().find(|(k, _)| *k == c).map(|(_, m)| *m)
}

pub fn edit_object_char(c: char) -> Option<Motion> {
    EDIT_OBJECT_CHARS
        .iter()
        .find(|(k, _)| *k == c)
        .map(|(_, m)| *m)
        .or_else(|| nav_char(c))
}

/// Motion for a named key. Alt is ignored; Shift and Control must match.
pub fn direction_key(code: KeyCode, mods: Modifiers) -> Option<Motion> {
    let mods = mods & (Modifiers::SHIFT | Modifiers::CTRL);
    DIRECTION_KEYS
        .iter()
        .find(|(k, m, _)| *k == code && *m == mods)
        .map(|(_, _, motion)| *motion)
}
