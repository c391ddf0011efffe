use crate::key::KeyStroke;
use crate::keymap;

/// Captures the keystrokes of each Normal-mode command so the last change
/// can be replayed with `.`.
///
/// Capture starts with the first keystroke received in Normal mode and ends
/// when the engine is back in Normal mode with no count pending. The
/// sequence is kept only if its command edits the buffer.
#[derive(Debug, Default, Clone)]
pub struct RepeatRecorder {
    pending: Vec<KeyStroke>,
    capturing: bool,
    last: Vec<KeyStroke>,
}

impl RepeatRecorder {
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn begin(&mut self) {
        self.pending.clear();
        self.capturing = true;
    }

    pub fn push(&mut self, key: KeyStroke) {
        if self.capturing {
            self.pending.push(key);
        }
    }

    /// Drops the keystrokes captured so far without touching the last change.
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.capturing = false;
    }

    pub fn finish(&mut self) {
        self.capturing = false;
        let keys = std::mem::take(&mut self.pending);
        if is_change(&keys) {
            self.last = keys;
        }
    }

    pub fn last_change(&self) -> &[KeyStroke] {
        &self.last
    }
}

/// True when the first keystroke after any count digits starts a change.
fn is_change(keys: &[KeyStroke]) -> bool {
    let mut digits = 0;
    let command = keys.iter().find(|key| {
        let counted = key
            .printable()
            .and_then(|c| c.to_digit(10))
            .is_some_and(|d| d != 0 || digits > 0);
        digits += usize::from(counted);
        !counted
    });
    command
        .and_then(keymap::normal_action)
        .is_some_and(|action| action.is_change())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_keys;

    fn capture(rec: &mut RepeatRecorder, notation: &str) {
        rec.begin();
        for key in parse_keys(notation).unwrap() {
            rec.push(key);
        }
        rec.finish();
    }

    #[test]
    fn keeps_changes_only() {
        let mut rec = RepeatRecorder::default();
        capture(&mut rec, "3dw");
        capture(&mut rec, "10j");
        capture(&mut rec, "u");
        assert_eq!(rec.last_change(), parse_keys("3dw").unwrap().as_slice());
    }

    #[test]
    fn zero_is_a_motion_not_a_count() {
        let mut rec = RepeatRecorder::default();
        capture(&mut rec, "0");
        assert!(rec.last_change().is_empty());
        capture(&mut rec, "ihi<Esc>");
        assert_eq!(rec.last_change().len(), 4);
    }

    #[test]
    fn cancel_keeps_previous_change() {
        let mut rec = RepeatRecorder::default();
        capture(&mut rec, "x");
        rec.begin();
        rec.push(KeyStroke::char('d'));
        rec.cancel();
        assert!(!rec.is_capturing());
        assert_eq!(rec.last_change(), parse_keys("x").unwrap().as_slice());
    }
}
