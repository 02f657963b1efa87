//! Overlapping text chunking for retrieval.
//!
//! Splits on paragraph boundaries first, carrying a character-count overlap
//! between consecutive chunks. Oversized paragraphs are windowed with a
//! preference for sentence boundaries. All measurement and slicing is in
//! characters, so multi-byte extraction output never lands mid-codepoint.

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            overlap: CHUNK_OVERLAP,
        }
    }

    pub fn with_sizes(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for para in text.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if !current.is_empty() && char_len(&current) + char_len(para) > self.chunk_size {
                chunks.push(current.trim().to_string());
                current = char_tail(&current, self.overlap);
            }

            if char_len(para) > self.chunk_size {
                self.window_long_paragraph(para, &mut chunks);
                current.clear();
            } else {
                current.push_str(para);
                current.push_str("\n\n");
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Walk an oversized paragraph in fixed windows, breaking at a sentence
    /// boundary within the last fifth of the window when one exists.
    fn window_long_paragraph(&self, para: &str, chunks: &mut Vec<String>) {
        let chars: Vec<char> = para.chars().collect();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());

            let break_at = if end < chars.len() {
                let search_start = start + self.chunk_size * 4 / 5;
                sentence_break(&chars[search_start..end])
                    .map(|pos| search_start + pos + 2)
                    .unwrap_or(end)
            } else {
                end
            };

            let piece: String = chars[start..break_at].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if break_at >= chars.len() {
                break;
            }
            start = if break_at > self.overlap {
                break_at - self.overlap
            } else {
                break_at
            };
        }
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`.
fn char_tail(s: &str, n: usize) -> String {
    let len = char_len(s);
    if len <= n {
        s.to_string()
    } else {
        s.chars().skip(len - n).collect()
    }
}

/// Position of the last ". " in the window.
fn sentence_break(window: &[char]) -> Option<usize> {
    (0..window.len().saturating_sub(1))
        .rev()
        .find(|&i| window[i] == '.' && window[i + 1] == ' ')
}
