//! Text chunking for the RAG pipeline: bounded, overlapping chunks split on a
//! separator cascade (paragraph, line, word, then hard character split).

use std::collections::VecDeque;

pub const CHUNK_SIZE: usize = 500;
pub const CHUNK_OVERLAP: usize = 100;

const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Splits text into overlapping chunks of at most `CHUNK_SIZE` characters.
/// Always returns at least one chunk.
pub fn chunk_text(text: &str) -> Vec<String> {
    if char_len(text) <= CHUNK_SIZE {
        return vec![text.to_string()];
    }
    let pieces = split_recursive(text, SEPARATORS);
    let chunks = merge_with_overlap(&pieces);
    if chunks.is_empty() {
        vec![text.to_string()]
    } else {
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Breaks text into pieces no longer than `CHUNK_SIZE`, preferring coarse
/// separators, falling back to a hard character split when none remain.
fn split_recursive(text: &str, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= CHUNK_SIZE {
        return vec![text.to_string()];
    }
    match separators.split_first() {
        Some((sep, rest)) => text
            .split(sep)
            .filter(|p| !p.is_empty())
            .flat_map(|p| split_recursive(p, rest))
            .collect(),
        None => {
            let chars: Vec<char> = text.chars().collect();
            chars
                .chunks(CHUNK_SIZE)
                .map(|c| c.iter().collect())
                .collect()
        }
    }
}

/// Greedily packs pieces into chunks, carrying a tail of up to
/// `CHUNK_OVERLAP` characters into the next chunk so context spans chunk
/// boundaries.
fn merge_with_overlap(pieces: &[String]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&String> = VecDeque::new();

    for piece in pieces {
        let piece_len = char_len(piece);
        if !window.is_empty() && window_len(&window) + 1 + piece_len > CHUNK_SIZE {
            chunks.push(join_window(&window));
            // Shrink the window to the overlap budget, keeping room for the piece.
            while !window.is_empty()
                && (window_len(&window) > CHUNK_OVERLAP
                    || window_len(&window) + 1 + piece_len > CHUNK_SIZE)
            {
                window.pop_front();
            }
        }
        window.push_back(piece);
    }

    if !window.is_empty() {
        chunks.push(join_window(&window));
    }
    chunks
}

fn window_len(window: &VecDeque<&String>) -> usize {
    let sep_total = window.len().saturating_sub(1);
    window.iter().map(|p| char_len(p)).sum::<usize>() + sep_total
}

fn join_window(window: &VecDeque<&String>) -> String {
    window
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize, width: usize) -> String {
        (0..n)
            .map(|i| format!("para{i} ").repeat(width / 6))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "Jane Smith\nSoftware Engineer";
        assert_eq!(chunk_text(text), vec![text.to_string()]);
    }

    #[test]
    fn test_empty_text_yields_one_chunk() {
        assert_eq!(chunk_text("").len(), 1);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = paragraphs(20, 120);
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= CHUNK_SIZE,
                "chunk of {} chars exceeds {CHUNK_SIZE}",
                chunk.chars().count()
            );
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = paragraphs(20, 80);
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        // The tail piece of each chunk reappears at the head of the next.
        for pair in chunks.windows(2) {
            let tail = pair[0].rsplit('\n').next().unwrap();
            assert!(
                pair[1].contains(tail),
                "no overlap between consecutive chunks"
            );
        }
    }

    #[test]
    fn test_oversized_single_line_hard_splits() {
        let text = "x".repeat(CHUNK_SIZE * 3);
        let chunks = chunk_text(&text);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "résumé ét être où ".repeat(100);
        let chunks = chunk_text(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }
    }
}
