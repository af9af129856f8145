//! Fixed-window text chunking for indexing
//!
//! Splits on character offsets, not sentences or paragraphs. Windows do not
//! overlap and the final piece may be shorter than the window.

/// Default window size in characters
pub const DEFAULT_WINDOW: usize = 500;

/// Fixed-window chunker
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    window: usize,
}

impl Chunker {
    /// Create a chunker with the given window (clamped to at least 1)
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Split `text` into consecutive windows of `window` characters.
    ///
    /// Offsets count Unicode scalar values so a multi-byte character is never
    /// split. Concatenating the output reproduces `text` exactly.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::with_capacity(text.len() / self.window + 1);
        let mut start = 0;
        let mut count = 0;

        for (offset, _) in text.char_indices() {
            if count == self.window {
                chunks.push(text[start..offset].to_string());
                start = offset;
                count = 0;
            }
            count += 1;
        }

        if count > 0 {
            chunks.push(text[start..].to_string());
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(Chunker::default().chunk("").is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        let chunks = Chunker::new(4).chunk("abcdefgh");
        assert_eq!(chunks, vec!["abcd", "efgh"]);
    }

    #[test]
    fn test_short_tail() {
        let chunks = Chunker::new(4).chunk("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_characters_not_split() {
        // 议程设置理论 = 6 characters, 18 bytes
        let chunks = Chunker::new(4).chunk("议程设置理论");
        assert_eq!(chunks, vec!["议程设置", "理论"]);
        assert_eq!(chunks.concat(), "议程设置理论");
    }

    #[test]
    fn test_zero_window_clamped() {
        let chunker = Chunker::new(0);
        assert_eq!(chunker.window(), 1);
        assert_eq!(chunker.chunk("ab"), vec!["a", "b"]);
    }

    #[test]
    fn test_default_window() {
        let text = "x".repeat(1201);
        let chunks = Chunker::default().chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[2].len(), 201);
    }
}
