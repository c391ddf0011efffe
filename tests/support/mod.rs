#![allow(dead_code)]

pub mod mock_buffer;
pub mod mock_clipboard;

use mock_buffer::MockBuffer;
use mock_clipboard::MockClipboard;
use vi_engine::traits::TextOps;
use vi_engine::types::{Mode, Position, Selection};
use vi_engine::{Engine, parse_keys};

/// An engine attached to a mock buffer and register.
pub struct Harness {
    pub engine: Engine,
    pub buf: MockBuffer,
    pub clipboard: MockClipboard,
}

impl Harness {
    pub fn new(text: &str) -> Self {
        Self::with_engine(Engine::new(), text)
    }

    pub fn with_engine(mut engine: Engine, text: &str) -> Self {
        let mut buf = MockBuffer::new(text);
        engine.attach(&mut buf);
        Self {
            engine,
            buf,
            clipboard: MockClipboard::new(),
        }
    }

    /// Feeds keys written in key notation, e.g. `"dw"` or `"ihi<Esc>"`.
    pub fn keys(&mut self, notation: &str) -> &mut Self {
        let keys = parse_keys(notation).expect("valid key notation");
        self.engine
            .handle_keys(&mut self.buf, &mut self.clipboard, keys);
        self
    }

    pub fn text(&self) -> String {
        self.buf.contents()
    }

    pub fn caret(&self) -> Position {
        self.buf.caret()
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.buf.selection()
    }

    pub fn register(&self) -> Option<&str> {
        self.clipboard.content.as_deref()
    }

    /// Moves the caret from outside the engine and tells it so.
    pub fn click(&mut self, line: u32, col: u32) -> &mut Self {
        self.buf.place_caret(line, col);
        self.engine.caret_moved(&mut self.buf);
        self
    }
}

pub fn p(line: u32, col: u32) -> Position {
    Position::new(line, col)
}
