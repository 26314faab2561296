
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Configuration for the sliding-window chunker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in tokens
    pub target_chunk_size: usize,
    /// Tokens shared between consecutive chunks
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            target_chunk_size: 300,
            overlap_size: 20,
        }
    }
}

/// A bounded slice of a source document's text
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChunk {
    /// Exact substring of the source text covered by this chunk
    pub content: String,
    /// Zero-based position within the source document
    pub chunk_index: usize,
    /// Number of tokens in the chunk
    pub token_count: usize,
    /// Byte offset of the chunk start in the source text
    pub byte_start: usize,
    /// Byte offset one past the chunk end in the source text
    pub byte_end: usize,
}

/// Splits text into overlapping token windows.
///
/// Tokens are whitespace-delimited words. Chunk boundaries fall on token
/// starts, so chunks tile the source text exactly: re-joining them with the
/// overlap removed reconstructs the input byte for byte. Text at or under
/// the target size (including empty text) comes back as a single unchanged
/// chunk.
#[inline]
#[expect(
    clippy::string_slice,
    reason = "chunk bounds come from char_indices and are valid char boundaries"
)]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<ContentChunk>> {
    ensure!(
        config.overlap_size < config.target_chunk_size,
        "Overlap size ({}) must be smaller than target chunk size ({})",
        config.overlap_size,
        config.target_chunk_size
    );

    let (token_total, bounds) = token_bounds(text);

    if token_total <= config.target_chunk_size {
        return Ok(vec![ContentChunk {
            content: text.to_string(),
            chunk_index: 0,
            token_count: token_total,
            byte_start: 0,
            byte_end: text.len(),
        }]);
    }

    let step = config.target_chunk_size - config.overlap_size;
    let mut chunks = Vec::with_capacity(token_total.div_ceil(step));
    let mut start_token = 0;

    loop {
        let end_token = (start_token + config.target_chunk_size).min(token_total);
        let byte_start = bounds[start_token];
        let byte_end = bounds[end_token];

        chunks.push(ContentChunk {
            content: text[byte_start..byte_end].to_string(),
            chunk_index: chunks.len(),
            token_count: end_token - start_token,
            byte_start,
            byte_end,
        });

        if end_token == token_total {
            break;
        }
        start_token = end_token - config.overlap_size;
    }

    Ok(chunks)
}

/// Byte offsets at which chunks may start or end.
///
/// `bounds[k]` is where a chunk beginning at token `k` starts; the first
/// bound is pinned to offset zero and the last to the text length, so
/// leading and trailing whitespace always belong to some chunk.
fn token_bounds(text: &str) -> (usize, Vec<usize>) {
    let mut bounds = vec![0];
    let mut token_count = 0usize;
    let mut in_token = false;

    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_token = false;
        } else if !in_token {
            in_token = true;
            token_count += 1;
            if token_count > 1 {
                bounds.push(offset);
            }
        }
    }

    bounds.push(text.len());
    (token_count, bounds)
}

/// Keeps the trailing `byte_limit` bytes of `text`.
///
/// When the cut would land inside a multi-byte character, the split
/// character is dropped so the result stays valid UTF-8; ASCII input keeps
/// exactly `byte_limit` bytes. Text at or under the limit is returned
/// unchanged.
#[inline]
#[expect(
    clippy::string_slice,
    reason = "the start offset is advanced to a char boundary before slicing"
)]
pub fn truncate_to_trailing_bytes(text: &str, byte_limit: usize) -> &str {
    if text.len() <= byte_limit {
        return text;
    }

    let mut start = text.len() - byte_limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
