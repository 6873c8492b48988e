//! Fixed-size character windows with overlap
//!
//! Pages are joined with a blank line and cut into windows of `chunk_size`
//! characters. Window `i` starts at `i * (chunk_size - overlap)`, so
//! neighbouring windows share exactly `overlap` characters, and the final
//! window ends at the end of the text. Sizes count Unicode scalar values,
//! never bytes, so a window never splits a character.

use crate::config::AppConfig;
use crate::errors::FinAgentsError;
use crate::errors::Result;

const PAGE_SEPARATOR: &str = "\n\n";

/// One window of document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sequence_index: u32,
    /// 1-based page the window starts on
    pub page: u32,
    pub text: String,
    /// Whitespace-separated words
    pub token_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(FinAgentsError::ConfigError(format!(
                "Invalid chunking policy: size {chunk_size}, overlap {overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.ingest.chunk_size, config.ingest.chunk_overlap)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    const fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Number of windows for a text of `len` characters
    #[must_use]
    pub const fn window_count(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len <= self.chunk_size {
            1
        } else {
            (len - self.overlap).div_ceil(self.step())
        }
    }

    /// Split pages into windows; blank pages contribute nothing but keep their number
    #[must_use]
    pub fn chunk(&self, pages: &[String]) -> Vec<Chunk> {
        let mut chars: Vec<char> = Vec::new();
        // (char offset, 1-based page number)
        let mut page_starts: Vec<(usize, u32)> = Vec::new();

        for (idx, page) in pages.iter().enumerate() {
            let text = page.trim();
            if text.is_empty() {
                continue;
            }
            if !chars.is_empty() {
                chars.extend(PAGE_SEPARATOR.chars());
            }
            page_starts.push((chars.len(), idx as u32 + 1));
            chars.extend(text.chars());
        }

        let len = chars.len();
        let mut chunks = Vec::with_capacity(self.window_count(len));
        for window in 0..self.window_count(len) {
            let start = window * self.step();
            let end = (start + self.chunk_size).min(len);
            let text: String = chars[start..end].iter().collect();
            if text.trim().is_empty() {
                continue;
            }

            let page = page_starts
                .iter()
                .take_while(|(offset, _)| *offset <= start)
                .last()
                .map_or(1, |(_, page)| *page);

            chunks.push(Chunk {
                sequence_index: chunks.len() as u32,
                page,
                token_count: text.split_whitespace().count() as u32,
                text,
            });
        }

        chunks
    }
}
