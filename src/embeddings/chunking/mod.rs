
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::PageText;

/// A retrievable slice of the source document, ready for embedding.
///
/// Passages are exact substrings of the extracted page text; adjacent
/// passages on the same page share exactly `overlap` characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// Identifier of the source document.
    pub source: String,
    /// 1-based page the passage was cut from.
    pub page_number: u32,
    /// Sequential index across the whole document.
    pub chunk_index: u32,
    /// The passage text.
    pub text: String,
    /// Characters shared with the preceding passage (0 for the first
    /// passage of each page).
    pub overlap: u32,
}

/// Configuration for passage chunking, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target window size in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 150,
        }
    }
}

/// Cut ordered page texts into overlapping passages.
///
/// Each page is chunked independently; the window start advances by
/// `chunk_size - overlap` per step, and a cut that would land mid-word moves
/// back to the nearest whitespace boundary that still clears the overlap
/// region. Pages without printable text yield no passages. Fails only on
/// invalid configuration.
#[inline]
pub fn chunk_pages(
    source: &str,
    pages: &[PageText],
    config: &ChunkingConfig,
) -> Result<Vec<Passage>> {
    if config.chunk_size == 0 {
        bail!("chunk size must be at least 1 character");
    }
    if config.overlap >= config.chunk_size {
        bail!(
            "chunk overlap ({}) must be smaller than the chunk size ({})",
            config.overlap,
            config.chunk_size
        );
    }

    let mut passages = Vec::new();
    let mut chunk_index: u32 = 0;

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }

        let chars: Vec<char> = page.text.chars().collect();
        for (text, overlap) in chunk_page(&chars, config) {
            passages.push(Passage {
                source: source.to_string(),
                page_number: page.page_number,
                chunk_index,
                text,
                overlap: u32::try_from(overlap).unwrap_or(u32::MAX),
            });
            chunk_index += 1;
        }
    }

    debug!(
        "Chunked '{}' into {} passages across {} pages",
        source,
        passages.len(),
        pages.len()
    );

    Ok(passages)
}

/// Chunk one page's characters into `(text, overlap_with_previous)` windows.
fn chunk_page(chars: &[char], config: &ChunkingConfig) -> Vec<(String, usize)> {
    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + config.chunk_size).min(chars.len());
        let mut end = hard_end;

        // Prefer a whitespace boundary when the hard cut would split a word.
        // The cut must stay past the overlap region so the window keeps
        // advancing.
        if hard_end < chars.len()
            && !chars[hard_end].is_whitespace()
            && !chars[hard_end - 1].is_whitespace()
        {
            if let Some(ws) = (start + config.overlap..hard_end)
                .rev()
                .find(|&i| chars[i].is_whitespace())
            {
                end = ws + 1;
            }
        }

        let overlap = if start == 0 { 0 } else { config.overlap };
        windows.push((chars[start..end].iter().collect(), overlap));

        if end == chars.len() {
            break;
        }
        start = end - config.overlap;
    }

    windows
}
