use std::collections::HashMap;

use crate::error::EngineError;
use crate::key::KeyStroke;
use crate::notation::to_notation;

/// A recorded keystroke sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: char,
    keys: Vec<KeyStroke>,
}

impl Macro {
    pub fn new(name: char, keys: Vec<KeyStroke>) -> Self {
        Self { name, keys }
    }

    pub fn name(&self) -> char {
        self.name
    }

    pub fn keys(&self) -> &[KeyStroke] {
        &self.keys
    }

    pub fn to_notation(&self) -> String {
        to_notation(&self.keys)
    }
}

/// Macro registry plus recording and playback state.
///
/// A macro being recorded is kept aside and only stored under its name when
/// recording stops, so aborting leaves an older macro of the same name intact.
#[derive(Debug, Default, Clone)]
pub struct MacroRecorder {
    macros: HashMap<char, Macro>,
    recording: Option<Macro>,
    last_played: Option<char>,
    playing: Vec<char>,
}

impl MacroRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_name(name: char) -> bool {
        name.is_ascii_alphanumeric()
    }

    pub fn get(&self, name: char) -> Option<&Macro> {
        self.macros.get(&name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Stores a macro directly, e.g. one parsed from key notation.
    pub fn define(&mut self, name: char, keys: Vec<KeyStroke>) -> Result<(), EngineError> {
        if !Self::is_valid_name(name) {
            return Err(EngineError::InvalidMacroName(name));
        }
        self.macros.insert(name, Macro::new(name, keys));
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recording_name(&self) -> Option<char> {
        self.recording.as_ref().map(Macro::name)
    }

    pub fn start(&mut self, name: char) -> Result<(), EngineError> {
        if !Self::is_valid_name(name) {
            return Err(EngineError::InvalidMacroName(name));
        }
        self.recording = Some(Macro::new(name, Vec::new()));
        Ok(())
    }

    pub fn record(&mut self, key: KeyStroke) {
        if let Some(recording) = self.recording.as_mut() {
            recording.keys.push(key);
        }
    }

    /// Finishes recording and stores the macro. Returns its name.
    pub fn stop(&mut self) -> Option<char> {
        let recorded = self.recording.take()?;
        let name = recorded.name;
        self.macros.insert(name, recorded);
        Some(name)
    }

    /// Drops the macro being recorded without storing it.
    pub fn discard(&mut self) -> Option<char> {
        self.recording.take().map(|m| m.name)
    }

    pub fn last_played(&self) -> Option<char> {
        self.last_played
    }

    pub fn is_playing(&self) -> bool {
        !self.playing.is_empty()
    }

    /// Resolves `@` to the last played macro and checks the name.
    pub fn resolve(&self, name: char) -> Result<char, EngineError> {
        if name == '@' {
            return self.last_played.ok_or(EngineError::UnknownMacro('@'));
        }
        if !Self::is_valid_name(name) {
            return Err(EngineError::InvalidMacroName(name));
        }
        Ok(name)
    }

    /// Marks `name` as playing and returns its keystrokes. Every successful
    /// call must be paired with [`MacroRecorder::end_playback`].
    pub fn begin_playback(
        &mut self,
        name: char,
        max_depth: usize,
    ) -> Result<Vec<KeyStroke>, EngineError> {
        if self.playing.contains(&name) || self.playing.len() >= max_depth {
            return Err(EngineError::RecursiveMacro(name));
        }
        let keys = self
            .macros
            .get(&name)
            .map(|m| m.keys.clone())
            .ok_or(EngineError::UnknownMacro(name))?;
        self.playing.push(name);
        self.last_played = Some(name);
        Ok(keys)
    }

    pub fn end_playback(&mut self) {
        self.playing.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_keeps_previous_macro() {
        let mut rec = MacroRecorder::new();
        rec.define('a', vec![KeyStroke::char('x')]).unwrap();
        rec.start('a').unwrap();
        rec.record(KeyStroke::char('j'));
        assert_eq!(rec.discard(), Some('a'));
        assert_eq!(rec.get('a').map(Macro::to_notation).as_deref(), Some("x"));
    }

    #[test]
    fn playback_stack_rejects_reentry() {
        let mut rec = MacroRecorder::new();
        rec.define('a', vec![KeyStroke::char('@'), KeyStroke::char('a')])
            .unwrap();
        assert!(rec.begin_playback('a', 8).is_ok());
        assert_eq!(
            rec.begin_playback('a', 8),
            Err(EngineError::RecursiveMacro('a'))
        );
        rec.end_playback();
        assert!(!rec.is_playing());
        assert_eq!(rec.resolve('@'), Ok('a'));
    }

    #[test]
    fn unknown_and_invalid_names() {
        let mut rec = MacroRecorder::new();
        assert_eq!(rec.resolve('@'), Err(EngineError::UnknownMacro('@')));
        assert_eq!(rec.start('!'), Err(EngineError::InvalidMacroName('!')));
        assert_eq!(
            rec.begin_playback('k', 8),
            Err(EngineError::UnknownMacro('k'))
        );
    }
}
