use vi_engine::traits::Clipboard;

/// In-memory register. In deferred mode `request` answers `None`, the way an
/// asynchronous system clipboard would.
#[derive(Default, Debug, Clone)]
pub struct MockClipboard {
    pub content: Option<String>,
    pub deferred: bool,
    pub requests: usize,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(text: &str) -> Self {
        Self {
            content: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }
}

impl Clipboard for MockClipboard {
    fn request(&mut self) -> Option<String> {
        self.requests += 1;
        if self.deferred {
            return None;
        }
        Some(self.content.clone().unwrap_or_default())
    }

    fn set(&mut self, text: String) {
        self.content = Some(text);
    }
}
