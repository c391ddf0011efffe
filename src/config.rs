/// Tunables for an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Text inserted by Tab and by `>`.
    pub indent_unit: String,
    /// Number of leading spaces `<` removes when a line is not indented
    /// with `indent_unit`.
    pub tab_width: u32,
    /// Copy the current line's indentation into lines opened with
    /// `o`, `O` and Enter.
    pub auto_indent: bool,
    /// Searches continue from the other end of the document.
    pub search_wrap: bool,
    /// Lines moved by PageUp/PageDown when the host reports no viewport.
    pub page_size: u32,
    /// Maximum nesting of macro and repeat playback.
    pub max_replay_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indent_unit: "\t".to_string(),
            tab_width: 4,
            auto_indent: true,
            search_wrap: true,
            page_size: 20,
            max_replay_depth: 32,
        }
    }
}
