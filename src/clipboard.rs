use crate::traits::Clipboard;

/// An in-process register. Contents are always available synchronously.
#[derive(Debug, Default, Clone)]
pub struct Register {
    content: Option<String>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl Clipboard for Register {
    /// Never defers: an empty register pastes nothing.
    fn request(&mut self) -> Option<String> {
        Some(self.content.clone().unwrap_or_default())
    }

    fn set(&mut self, text: String) {
        self.content = Some(text);
    }
}

/// The operating system clipboard.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, arboard::Error> {
        Ok(Self {
            inner: arboard::Clipboard::new()?,
        })
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn request(&mut self) -> Option<String> {
        match self.inner.get_text() {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("clipboard read failed: {e}");
                Some(String::new())
            }
        }
    }

    fn set(&mut self, text: String) {
        if let Err(e) = self.inner.set_text(text) {
            log::warn!("clipboard write failed: {e}");
        }
    }
}
