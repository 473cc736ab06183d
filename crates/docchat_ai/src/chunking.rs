use docchat_core::domain::{Chunk, Document};
use docchat_core::error::AppError;

/// Character-window splitter with a fixed overlap.
///
/// Each cut is placed at the last paragraph break (else the last newline, else the last
/// whitespace) inside a small window before the hard limit, falling back to a hard cut at
/// `chunk_size` characters. The next chunk starts exactly `chunk_overlap` characters before
/// the cut, so adjacent chunks always share `chunk_overlap` characters and text is never
/// trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    window: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 || chunk_size <= chunk_overlap {
            return Err(AppError::config("chunk_size must exceed chunk_overlap").with_details(
                format!("chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"),
            ));
        }
        // Cuts must land strictly after `start + overlap` or the splitter would not advance.
        let window = (chunk_size / 5).min(chunk_size - chunk_overlap - 1);
        Ok(Self {
            chunk_size,
            chunk_overlap,
            window,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, doc: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = doc.raw_text.chars().collect();
        let n = chars.len();
        let mut out = Vec::new();
        if doc.raw_text.trim().is_empty() {
            return out;
        }

        let mut start = 0usize;
        loop {
            let hard_end = start + self.chunk_size;
            let end = if hard_end >= n {
                n
            } else {
                self.cut_position(&chars, hard_end)
            };

            out.push(Chunk {
                text: chars[start..end].iter().collect(),
                source_path: doc.source_path.clone(),
                offset: start,
                page: doc.page_at(start),
            });

            if end == n {
                break;
            }
            start = end - self.chunk_overlap;
        }
        out
    }

    pub fn split_all(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.split(d)).collect()
    }

    /// Cut index in `(hard_end - window)..=hard_end`; the cut character starts the next chunk.
    fn cut_position(&self, chars: &[char], hard_end: usize) -> usize {
        let lo = hard_end - self.window;
        let range = lo..=hard_end;
        // A blank line: cut before it so the break opens the next chunk.
        if let Some(i) = range
            .clone()
            .rev()
            .find(|&i| i > lo && chars[i] == '\n' && chars[i - 1] == '\n')
        {
            return i - 1;
        }
        if let Some(i) = range.clone().rev().find(|&i| chars[i] == '\n') {
            return i;
        }
        if let Some(i) = range.rev().find(|&i| chars[i].is_whitespace()) {
            return i;
        }
        hard_end
    }
}

/// Rebuild the source text from consecutive chunks of one document.
pub fn reassemble(chunks: &[Chunk], chunk_overlap: usize) -> String {
    let mut out = String::new();
    for (i, c) in chunks.iter().enumerate() {
        if i == 0 {
            out.push_str(&c.text);
        } else {
            out.extend(c.text.chars().skip(chunk_overlap));
        }
    }
    out
}
