//! Buffer edits shared by the mode handlers.

use crate::keymap::Placement;
use crate::operator::Span;
use crate::traits::{TextEdit, TextOps};
use crate::types::{Position, Selection};

/// Runs `f` inside one undo group.
pub fn grouped<R>(buf: &mut dyn TextEdit, f: impl FnOnce(&mut dyn TextEdit) -> R) -> R {
    buf.begin_undo_group();
    let result = f(&mut *buf);
    buf.end_undo_group();
    result
}

/// Keeps a block caret on a character: a caret past the last character of
/// a non-empty line moves back onto it.
pub fn retreat_from_line_end(buf: &mut dyn TextEdit) {
    if buf.selection().is_some() {
        return;
    }
    let caret = buf.caret();
    let len = buf.line_len(caret.line);
    if caret.col > 0 && caret.col >= len {
        buf.set_caret(Position::new(caret.line, len.saturating_sub(1)));
    }
}

/// Removes `span` and returns the offset the removed text started at.
///
/// Removing line-wise through the last line, which has no delimiter of its
/// own, also removes the delimiter before it.
pub fn delete_span(buf: &mut dyn TextEdit, span: Span) -> usize {
    let mut start = span.start;
    if let Some((first, last)) = span.lines {
        if first > 0 && buf.delimiter_len(last) == 0 {
            start -= buf.delimiter_len(first - 1) as usize;
        }
    }
    let end = span.end.min(buf.len());
    buf.remove(start, end.saturating_sub(start));
    start
}

/// Leading whitespace of `line`.
pub fn indentation<T: TextOps + ?Sized>(text: &T, line: u32) -> String {
    text.line_text(line)
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect()
}

/// Opens a new line below or above `line` and returns the caret position on it.
pub fn open_line(buf: &mut dyn TextEdit, line: u32, below: bool, indent: &str) -> Position {
    let width = indent.chars().count() as u32;
    if below {
        let offset = buf.line_offset(line) + buf.line_len(line) as usize;
        buf.insert(offset, &format!("\n{indent}"));
        Position::new(line + 1, width)
    } else {
        let offset = buf.line_offset(line);
        buf.insert(offset, &format!("{indent}\n"));
        Position::new(line, width)
    }
}

/// Inserts delimiter-terminated `contents` as whole lines starting at `line`.
/// A line one past the end appends to the document.
pub fn insert_lines(buf: &mut dyn TextEdit, line: u32, contents: &str) -> Position {
    if line <= buf.last_line() {
        let offset = buf.line_offset(line);
        buf.insert(offset, contents);
    } else {
        let body = contents
            .strip_suffix('\n')
            .map(|b| b.strip_suffix('\r').unwrap_or(b))
            .unwrap_or(contents);
        let end = buf.len();
        buf.insert(end, &format!("\n{body}"));
    }
    Position::new(line, 0)
}

/// Joins lines `first..=last` with single spaces, trimming the whitespace
/// around each join. Joining one line joins it with the next. Returns the
/// column of the last join, or `None` when there is nothing to join.
pub fn join_lines(buf: &mut dyn TextEdit, first: u32, last: u32) -> Option<u32> {
    let last = if first == last { first + 1 } else { last };
    if last > buf.last_line() {
        return None;
    }
    let mut joined = buf.line_text(first).trim_end().to_string();
    let mut join_col = 0;
    for line in first + 1..=last {
        let text = buf.line_text(line);
        let text = text.trim();
        join_col = joined.chars().count() as u32;
        if !text.is_empty() {
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(text);
        }
    }
    let start = buf.line_offset(first);
    let end = buf.line_offset(last) + buf.line_len(last) as usize;
    buf.replace(start, end - start, &joined);
    Some(join_col)
}

pub fn toggle_case(text: &str) -> String {
    text.chars()
        .flat_map(|c| {
            let toggled: Vec<char> = if c.is_lowercase() {
                c.to_uppercase().collect()
            } else if c.is_uppercase() {
                c.to_lowercase().collect()
            } else {
                vec![c]
            };
            toggled
        })
        .collect()
}

fn unindent(line: &str, unit: &str, tab_width: u32) -> String {
    if !unit.is_empty() {
        if let Some(rest) = line.strip_prefix(unit) {
            return rest.to_string();
        }
    }
    if let Some(rest) = line.strip_prefix('\t') {
        return rest.to_string();
    }
    let spaces = line
        .chars()
        .take(tab_width as usize)
        .take_while(|&c| c == ' ')
        .count();
    line[spaces..].to_string()
}

/// Shifts lines `first..=last` one indent unit right or left. Blank lines
/// are not indented.
pub fn shift_lines(
    buf: &mut dyn TextEdit,
    first: u32,
    last: u32,
    right: bool,
    unit: &str,
    tab_width: u32,
) {
    let mut out = String::new();
    for line in first..=last {
        let text = buf.line_text(line);
        if right && !text.is_empty() {
            out.push_str(unit);
            out.push_str(&text);
        } else if right {
            out.push_str(&text);
        } else {
            out.push_str(&unindent(&text, unit, tab_width));
        }
        if line < last {
            let delimiter = buf.line_offset(line) + buf.line_len(line) as usize;
            out.push_str(&buf.text(delimiter, buf.delimiter_len(line) as usize));
        }
    }
    let start = buf.line_offset(first);
    let end = buf.line_offset(last) + buf.line_len(last) as usize;
    buf.replace(start, end - start, &out);
}

/// Pastes `contents` at the caret, or over `selection` when given.
///
/// Contents ending with a line delimiter are pasted as whole lines. Returns
/// the caret position afterwards and the text that was replaced, if any.
pub fn paste(
    buf: &mut dyn TextEdit,
    contents: &str,
    placement: Placement,
    selection: Option<Selection>,
) -> (Position, Option<String>) {
    let linewise = contents.ends_with('\n') || contents.ends_with('\r');
    let width = contents.chars().count();

    grouped(buf, |buf| {
        let Some(selection) = selection else {
            let caret = buf.caret();
            if linewise {
                let line = match placement {
                    Placement::After => caret.line + 1,
                    Placement::Before => caret.line,
                };
                let pos = insert_lines(buf, line, contents);
                return (Position::new(pos.line, buf.first_non_blank(pos.line)), None);
            }
            let mut offset = buf.position_to_offset(caret);
            if placement == Placement::After && caret.col < buf.line_len(caret.line) {
                offset += 1;
            }
            buf.insert(offset, contents);
            return (buf.offset_to_position((offset + width).saturating_sub(1)), None);
        };

        let span = Span::from_selection(&*buf, &selection);
        let replaced = span.register_text(&*buf);
        buf.set_selection(None);
        let caret = match (span.lines, linewise) {
            (Some((first, _)), true) => {
                delete_span(buf, span);
                insert_lines(buf, first, contents)
            }
            (Some((first, _)), false) => {
                delete_span(buf, span);
                insert_lines(buf, first, &format!("{contents}\n"))
            }
            (None, true) => {
                buf.remove(span.start, span.len());
                buf.insert(span.start, &format!("\n{contents}"));
                Position::new(buf.offset_to_position(span.start).line + 1, 0)
            }
            (None, false) => {
                buf.remove(span.start, span.len());
                buf.insert(span.start, contents);
                buf.offset_to_position((span.start + width).saturating_sub(1))
            }
        };
        (caret, Some(replaced))
    })
}
