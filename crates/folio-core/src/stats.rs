//! Word and character counting

/// Counts derived from a block of plain text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Whitespace-delimited, non-empty tokens
    pub words: usize,
    /// Unicode scalar values
    pub chars: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            chars: text.chars().count(),
        }
    }
}
