//! Boundary-aware overlapping text segmentation. Pure and deterministic:
//! the same text always produces byte-identical chunks.

/// A text segment with its dense index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: i32,
}

/// Splits text into overlapping windows, preferring sentence boundaries and
/// falling back to word boundaries. All positions are in characters, never
/// bytes, so multi-byte text cannot split a code point.
pub struct Chunker {
    min_chunk_size: usize,
    max_chunk_size: usize,
    overlap: usize,
}

/// How far back from the window end to look for a sentence break.
const SENTENCE_SEARCH_WINDOW: usize = 200;

impl Chunker {
    pub fn new(min_chunk_size: usize, max_chunk_size: usize, overlap: usize) -> Self {
        Self {
            min_chunk_size,
            max_chunk_size,
            overlap,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();

        // Short texts are a single chunk equal to the input.
        if chars.len() <= self.max_chunk_size {
            return vec![Chunk {
                text: text.to_string(),
                chunk_index: 0,
            }];
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut starts: Vec<usize> = Vec::new();
        let mut chunk_index: i32 = 0;
        let mut start: usize = 0;

        while start < chars.len() {
            let mut end = (start + self.max_chunk_size).min(chars.len());

            if end < chars.len() {
                let window = &chars[start..end];
                let search_start = window.len().saturating_sub(SENTENCE_SEARCH_WINDOW);

                if let Some(break_at) = last_sentence_break(window, search_start)
                    .filter(|pos| *pos > self.min_chunk_size)
                {
                    // Keep the terminator character, drop the space.
                    end = start + break_at + 1;
                } else if let Some(space_at) = last_space(window).filter(|pos| *pos > self.min_chunk_size)
                {
                    end = start + space_at;
                }
                // Otherwise break hard at max_chunk_size.
            }

            let chunk_text: String = chars[start..end].iter().collect();
            let trimmed = chunk_text.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    text: trimmed.to_string(),
                    chunk_index,
                });
                starts.push(start);
                chunk_index += 1;
            }

            if end >= chars.len() {
                break;
            }

            let next = end.saturating_sub(self.overlap);
            let prev_start = starts.last().copied().unwrap_or(0);
            start = if next <= prev_start { end } else { next };
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(800, 1200, 100)
    }
}

/// Latest position at or after `from` where `. `, `! ` or `? ` starts.
fn last_sentence_break(window: &[char], from: usize) -> Option<usize> {
    if window.len() < 2 {
        return None;
    }
    (from..window.len() - 1)
        .rev()
        .find(|&i| matches!(window[i], '.' | '!' | '?') && window[i + 1] == ' ')
}

/// Latest space anywhere in the window.
fn last_space(window: &[char]) -> Option<usize> {
    window.iter().rposition(|c| *c == ' ')
}
