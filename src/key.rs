/// Key codes representing individual keys on the keyboard.
///
/// This enum provides a platform-agnostic representation of keys.
/// Hosts should map their platform-specific key events to these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key. The character is the one the key produced, so
    /// shifted letters arrive as `Char('A')`.
    Char(char),
    /// The Escape key, used to exit modes and cancel operations.
    Esc,
    /// The Enter/Return key.
    Enter,
    /// The Backspace key.
    Backspace,
    Tab,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function keys, `F(1)` through `F(12)`.
    F(u8),
}

bitflags::bitflags! {
    /// Keyboard modifier flags.
    ///
    /// These can be combined to represent multiple modifiers held simultaneously.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

/// A single keystroke as delivered by the host: the key, the character it
/// produced (if any) and the modifiers held.
///
/// Equality is exact on all three fields, so a recorded macro replays the
/// very same keystrokes that were typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub code: KeyCode,
    /// The printable character produced by the key, `None` for keys such as
    /// arrows or Escape.
    pub ch: Option<char>,
    pub mods: Modifiers,
}

impl KeyStroke {
    pub const fn new(code: KeyCode, ch: Option<char>, mods: Modifiers) -> Self {
        Self { code, ch, mods }
    }

    /// A plain character key with no modifiers.
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), Some(c), Modifiers::empty())
    }

    /// A named key with no modifiers. `Char` codes get their character filled in.
    pub const fn key(code: KeyCode) -> Self {
        let ch = match code {
            KeyCode::Char(c) => Some(c),
            _ => None,
        };
        Self::new(code, ch, Modifiers::empty())
    }

    pub const fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }

    /// The character this keystroke types, unless Control or Alt is held.
    pub fn printable(&self) -> Option<char> {
        if self.mods.intersects(Modifiers::CTRL | Modifiers::ALT) {
            None
        } else {
            self.ch
        }
    }

    /// True when the keystroke types `c`. Shift is part of the character.
    pub fn is_char(&self, c: char) -> bool {
        self.printable() == Some(c)
    }

    /// True for a Control chord on `c`.
    pub fn is_ctrl(&self, c: char) -> bool {
        self.mods.contains(Modifiers::CTRL)
            && (self.code == KeyCode::Char(c) || self.ch == Some(c))
    }
}
