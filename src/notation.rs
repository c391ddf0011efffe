//! Textual key notation, e.g. `d2w<Esc><C-r><S-C-M-Down>`.
//!
//! Plain characters stand for themselves. Everything else is written as a
//! chord in angle brackets: optional `S-`, `C-` and `M-` prefixes (Shift,
//! Control, Alt) followed by a single character or a key name.
//!
//! Each keystroke has one canonical spelling, and that is the well-formed
//! notation: modifiers in `S-C-M` order, the first listed name of a key
//! with aliases (`<Enter>`, not `<CR>`), `<Space>` and `<lt>` for space
//! and `<`, and a bare character for an unmodified printable key. A
//! well-formed string renders back to itself exactly. Other spellings are
//! accepted when parsing and render in canonical form.

use std::fmt;

use thiserror::Error;

use crate::key::{KeyCode, KeyStroke, Modifiers};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyNotationError {
    #[error("unterminated key chord starting at byte {0}")]
    Unterminated(usize),
    #[error("empty key chord at byte {0}")]
    Empty(usize),
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Space", KeyCode::Char(' ')),
    ("lt", KeyCode::Char('<')),
    ("Esc", KeyCode::Esc),
    ("Enter", KeyCode::Enter),
    ("CR", KeyCode::Enter),
    ("BS", KeyCode::Backspace),
    ("Tab", KeyCode::Tab),
    ("Del", KeyCode::Delete),
    ("Insert", KeyCode::Insert),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
];

const MODIFIER_PREFIXES: &[(char, Modifiers)] = &[
    ('S', Modifiers::SHIFT),
    ('C', Modifiers::CTRL),
    ('M', Modifiers::ALT),
];

/// Parses a notation string into keystrokes.
pub fn parse_keys(input: &str) -> Result<Vec<KeyStroke>, KeyNotationError> {
    let mut keys = Vec::new();
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c != '<' {
            keys.push(KeyStroke::char(c));
            rest = &rest[c.len_utf8()..];
            continue;
        }
        let start = input.len() - rest.len();
        let (key, tail) = parse_chord(&rest[1..], start)?;
        keys.push(key);
        rest = tail;
    }
    Ok(keys)
}

/// Parses the inside of a chord and returns the text after its closing `>`.
fn parse_chord(mut body: &str, at: usize) -> Result<(KeyStroke, &str), KeyNotationError> {
    let mut mods = Modifiers::empty();
    loop {
        let mut chars = body.chars();
        let (Some(prefix), Some('-'), Some(_)) = (chars.next(), chars.next(), chars.next()) else {
            break;
        };
        let Some((_, flag)) = MODIFIER_PREFIXES.iter().find(|(p, _)| *p == prefix) else {
            break;
        };
        mods |= *flag;
        body = &body[2..];
    }

    let first = body.chars().next().ok_or(KeyNotationError::Unterminated(at))?;
    let width = first.len_utf8();
    // A single character key, which may itself be '>' or '-'.
    if body[width..].starts_with('>') {
        let key = KeyStroke::key(KeyCode::Char(first)).with_mods(mods);
        return Ok((key, &body[width + 1..]));
    }

    let end = body.find('>').ok_or(KeyNotationError::Unterminated(at))?;
    let name = &body[..end];
    if name.is_empty() {
        return Err(KeyNotationError::Empty(at));
    }
    let code = lookup_name(name).ok_or_else(|| KeyNotationError::UnknownKey(name.to_string()))?;
    Ok((KeyStroke::key(code).with_mods(mods), &body[end + 1..]))
}

fn lookup_name(name: &str) -> Option<KeyCode> {
    if let Some(n) = name.strip_prefix('F') {
        return n
            .parse::<u8>()
            .ok()
            .filter(|n| (1..=12).contains(n))
            .map(KeyCode::F);
    }
    NAMED_KEYS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Renders keystrokes back to notation. Keys with more than one name use
/// the first one listed, so `<CR>` renders as `<Enter>`.
pub fn to_notation(keys: &[KeyStroke]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = NAMED_KEYS
            .iter()
            .find(|(_, code)| *code == self.code)
            .map(|(name, _)| *name);

        if let (KeyCode::Char(c), None, true) = (self.code, name, self.mods.is_empty()) {
            return write!(f, "{c}");
        }

        f.write_str("<")?;
        for (prefix, flag) in MODIFIER_PREFIXES {
            if self.mods.contains(*flag) {
                write!(f, "{prefix}-")?;
            }
        }
        match (self.code, name) {
            (_, Some(name)) => f.write_str(name)?,
            (KeyCode::Char(c), None) => write!(f, "{c}")?,
            (KeyCode::F(n), None) => write!(f, "F{n}")?,
            (code, None) => write!(f, "{code:?}")?,
        }
        f.write_str(">")
    }
}
