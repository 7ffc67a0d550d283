use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Chunk, ChunkRole};

// A paragraph boundary is a newline, optional whitespace, then another
// newline. Sentence terminators are Western punctuation only; scripts with
// other terminators fall through to the hard-cut policy.
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph regex"));
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex"));

/// Splits `text` into chunks of at most `max_chunk_size` characters,
/// preferring paragraph boundaries, then sentence boundaries, then hard cuts.
///
/// Lengths are Unicode scalar values, not bytes. The result is fully
/// materialized because callers need the chunk count upfront for progress
/// reporting. Pure and deterministic.
pub fn split_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    if char_len(text) <= max_chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in PARAGRAPH_RE.split(text) {
        let paragraph_len = char_len(paragraph);

        // +2 for the "\n\n" separator, counted even into an empty buffer to
        // keep the greedy rule simple.
        if char_len(&current) + paragraph_len + 2 <= max_chunk_size {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            if paragraph_len > max_chunk_size {
                split_long_paragraph(paragraph, max_chunk_size, &mut chunks, &mut current);
            } else {
                current = paragraph.to_string();
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Splits an oversize paragraph at sentence boundaries with the same greedy
/// accumulation, at single-space granularity. The remainder stays in
/// `current` so following paragraphs can still pack into it.
fn split_long_paragraph(
    paragraph: &str,
    max_chunk_size: usize,
    chunks: &mut Vec<String>,
    current: &mut String,
) {
    current.clear();

    for sentence in split_sentences(paragraph) {
        let sentence_len = char_len(sentence);

        if char_len(current) + sentence_len + 1 <= max_chunk_size {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(current));
            }

            if sentence_len > max_chunk_size {
                // Hard cut. Each piece is emitted immediately and the buffer
                // is not carried across the cut.
                chunks.extend(hard_cut(sentence, max_chunk_size));
                current.clear();
            } else {
                *current = sentence.to_string();
            }
        }
    }
}

/// A sentence ends at `.`, `!` or `?` followed by whitespace. The terminator
/// stays with its sentence; the whitespace run is consumed.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END_RE.find_iter(paragraph) {
        // The terminator is a single ASCII byte, so start + 1 is on a char
        // boundary.
        sentences.push(&paragraph[last..m.start() + 1]);
        last = m.end();
    }
    sentences.push(&paragraph[last..]);

    sentences
}

fn hard_cut(text: &str, max_chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chunk_size)
        .map(|piece| piece.iter().collect())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// `split_text` plus ordinal position and role for each chunk.
pub fn chunk(text: &str, max_chunk_size: usize) -> Vec<Chunk> {
    let parts = split_text(text, max_chunk_size);
    let total = parts.len();

    parts
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk {
            index,
            role: ChunkRole::of(index, total),
            content,
        })
        .collect()
}
