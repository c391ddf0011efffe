use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::Position;

/// A named caret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub name: char,
    pub pos: Position,
}

/// Marks set with `m<name>` and jumped to with `` `<name> ``.
///
/// Names are ASCII letters and digits. Setting an existing name overwrites it.
#[derive(Debug, Default, Clone)]
pub struct MarkRegistry {
    marks: HashMap<char, Mark>,
}

impl MarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_name(name: char) -> bool {
        name.is_ascii_alphanumeric()
    }

    pub fn set(&mut self, name: char, pos: Position) -> Result<(), EngineError> {
        if !Self::is_valid_name(name) {
            return Err(EngineError::InvalidMarkName(name));
        }
        self.marks.insert(name, Mark { name, pos });
        Ok(())
    }

    pub fn get(&self, name: char) -> Result<Position, EngineError> {
        self.marks
            .get(&name)
            .map(|mark| mark.pos)
            .ok_or(EngineError::UnknownMark(name))
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_one_entry() {
        let mut marks = MarkRegistry::new();
        marks.set('a', Position::new(1, 2)).unwrap();
        marks.set('a', Position::new(3, 0)).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks.get('a'), Ok(Position::new(3, 0)));
    }

    #[test]
    fn rejects_punctuation() {
        let mut marks = MarkRegistry::new();
        assert_eq!(
            marks.set('#', Position::ZERO),
            Err(EngineError::InvalidMarkName('#'))
        );
        assert_eq!(marks.get('z'), Err(EngineError::UnknownMark('z')));
    }
}
