use std::collections::VecDeque;

pub trait RecursiveTextSplitter {
    fn split_text(&self, text: &str) -> Vec<String>;
}

/// Recursive character splitter: tries paragraph, line, sentence and word
/// boundaries in turn, merges adjacent pieces up to `chunk_size` characters and
/// carries up to `chunk_overlap` characters of the previous chunk forward.
#[derive(Debug, Clone)]
pub struct RTSplitter {
    separators: Vec<&'static str>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RTSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl RecursiveTextSplitter for RTSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if char_len(text) <= self.chunk_size {
            return vec![text.trim().to_string()];
        }

        self.recursive_split(text, 0)
    }
}

impl RTSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            separators: vec![
                "\n\n", // Paragraphs
                "\n",   // Lines
                ". ",   // Sentences
                " ",    // Words
            ],
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    fn recursive_split(&self, text: &str, separator_index: usize) -> Vec<String> {
        // Trailing separators would otherwise flush a chunk made only of overlap
        let text = text.trim();
        let Some(position) = self.separators[separator_index..]
            .iter()
            .position(|sep| text.contains(sep))
        else {
            return self.split_by_length(text);
        };

        let separator_index = separator_index + position;
        let separator = self.separators[separator_index];
        let has_finer = separator_index + 1 < self.separators.len();

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in text.split(separator) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting, separator));
                fitting.clear();
            }

            if has_finer {
                chunks.extend(self.recursive_split(piece, separator_index + 1));
            } else {
                chunks.extend(self.split_by_length(piece));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting, separator));
        }

        chunks
    }

    fn merge_pieces(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let added = if window.is_empty() {
                piece_len
            } else {
                piece_len + separator_len
            };

            if window_len + added > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window, separator);

                // Keep a tail of at most `chunk_overlap` chars that still leaves room
                while let Some(front) = window.front() {
                    let room_needed = window_len + separator_len + piece_len;
                    if window_len <= self.chunk_overlap && room_needed <= self.chunk_size {
                        break;
                    }
                    let removed = char_len(front);
                    window.pop_front();
                    window_len -= if window.is_empty() {
                        removed
                    } else {
                        removed + separator_len
                    };
                }
            }

            window_len += if window.is_empty() {
                piece_len
            } else {
                piece_len + separator_len
            };
            window.push_back(piece);
        }

        if !window.is_empty() {
            push_chunk(&mut chunks, &window, separator);
        }

        chunks
    }

    fn split_by_length(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk.trim().to_string());
            }

            if end == chars.len() {
                break;
            }

            start += step;
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text() -> String {
        let mut text = String::new();
        for paragraph in 0..12 {
            for sentence in 0..6 {
                text.push_str(&format!(
                    "Paragraph {} sentence {} talks about subfile paging and record formats. ",
                    paragraph, sentence
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_basic_splitting() {
        let splitter = RTSplitter::new(30, 0);
        let text = "This is a test.\n\nThis is another paragraph.\n\nAnd a third one.";
        let chunks = splitter.split_text(text);

        assert_eq!(
            chunks,
            vec!["This is a test.", "This is another paragraph.", "And a third one."]
        );
    }

    #[test]
    fn test_no_chunk_exceeds_chunk_size() {
        for (size, overlap) in [(50, 10), (100, 20), (200, 50), (1000, 200), (7, 3)] {
            let splitter = RTSplitter::new(size, overlap);
            for chunk in splitter.split_text(&long_text()) {
                assert!(
                    chunk.chars().count() <= size,
                    "chunk of {} chars exceeds {}",
                    chunk.chars().count(),
                    size
                );
            }
        }
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RTSplitter::new(10, 2);
        let text = "x".repeat(35);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() >= 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_multibyte_text_measured_in_chars() {
        let splitter = RTSplitter::new(20, 5);
        let text = "überprüfung größe ändern ".repeat(10);
        for chunk in splitter.split_text(&text) {
            assert!(chunk.chars().count() <= 20);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = RTSplitter::new(60, 25);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi rho sigma tau upsilon";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap();
            assert!(
                pair[1].contains(last_word),
                "expected {:?} to repeat the tail of {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_chunks_are_substrings_of_source() {
        let splitter = RTSplitter::new(120, 30);
        let text = long_text();
        for chunk in splitter.split_text(&text) {
            assert!(text.contains(&chunk));
        }
    }

    #[test]
    fn test_short_and_empty_text() {
        let splitter = RTSplitter::default();

        assert_eq!(splitter.split_text("Short text"), vec!["Short text"]);
        assert!(splitter.split_text("   \n\n ").is_empty());
    }
}
