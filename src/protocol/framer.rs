//! Line framing over an arbitrarily chunked byte stream
//!
//! The serial layer hands the reader whatever bytes happen to be buffered,
//! so a protocol line can arrive split across any number of chunks, or many
//! lines can arrive in one chunk. [`LineFramer`] carries the partial tail
//! across calls and only ever emits data that was terminated by `\r\n`.

/// The two-byte line terminator sent by the sensor firmware
const TERMINATOR: &str = "\r\n";

/// Stateful reassembler that turns byte chunks into complete text lines
///
/// `feed` splits everything up to the last terminator on runs of `\r`/`\n`,
/// so the returned fragments can include empty strings; callers filter by
/// length. A trailing fragment that never receives its terminator is never
/// emitted - acceptable for a continuously streaming sensor, but worth
/// knowing if the stream can end mid-line.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: String,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line fragment completed by it
    ///
    /// Non-ASCII bytes are replaced rather than dropped; the downstream
    /// parser rejects such lines by tag. No bytes are duplicated or lost
    /// across chunk boundaries.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let Some(idx) = self.pending.rfind(TERMINATOR) else {
            return Vec::new();
        };

        let lines = self.pending[..idx]
            .split(['\r', '\n'])
            .map(str::to_owned)
            .collect();
        self.pending.drain(..idx + TERMINATOR.len());
        lines
    }

    /// The unterminated tail retained for the next `feed`
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Discard any buffered partial line (used when a session restarts)
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn non_empty(lines: Vec<String>) -> Vec<String> {
        lines.into_iter().filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        assert_eq!(non_empty(framer.feed(b"S512\r\n")), vec!["S512"]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"S51").is_empty());
        assert_eq!(framer.pending(), "S51");
        assert_eq!(non_empty(framer.feed(b"2\r\n")), vec!["S512"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = non_empty(framer.feed(b"S10\r\nB72\r\nQ830\r\n"));
        assert_eq!(lines, vec!["S10", "B72", "Q830"]);
    }

    #[test]
    fn test_tail_after_terminator_is_retained() {
        let mut framer = LineFramer::new();
        let lines = non_empty(framer.feed(b"S10\r\nB72\r\nS1"));
        assert_eq!(lines, vec!["S10", "B72"]);
        assert_eq!(framer.pending(), "S1");
        assert_eq!(non_empty(framer.feed(b"2\r\n")), vec!["S12"]);
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"S99\r").is_empty());
        assert_eq!(non_empty(framer.feed(b"\n")), vec!["S99"]);
    }

    #[test]
    fn test_empty_fragments_are_emitted() {
        let mut framer = LineFramer::new();
        // The raw split includes the empty fragment between \r and \n;
        // downstream filters by length.
        let lines = framer.feed(b"S1\r\nS2\r\n");
        assert!(lines.iter().any(|l| l.is_empty()));
        assert_eq!(non_empty(lines), vec!["S1", "S2"]);
    }

    #[test]
    fn test_reset_discards_tail() {
        let mut framer = LineFramer::new();
        framer.feed(b"S12");
        framer.reset();
        assert!(framer.pending().is_empty());
        assert_eq!(non_empty(framer.feed(b"B60\r\n")), vec!["B60"]);
    }

    proptest! {
        /// For any stream of lines and any chunking of its bytes, the
        /// emitted non-empty fragments reconstruct the original lines in
        /// order, with no duplication and no loss.
        #[test]
        fn prop_chunking_preserves_lines(
            lines in proptest::collection::vec("[SBQT][0-9]{1,6}", 0..20),
            chunk_sizes in proptest::collection::vec(1usize..8, 0..200),
        ) {
            let stream: Vec<u8> = lines
                .iter()
                .flat_map(|l| format!("{}\r\n", l).into_bytes())
                .collect();

            let mut framer = LineFramer::new();
            let mut emitted = Vec::new();
            let mut offset = 0;
            let mut sizes = chunk_sizes.into_iter();
            while offset < stream.len() {
                let size = sizes.next().unwrap_or(1).min(stream.len() - offset);
                emitted.extend(non_empty(framer.feed(&stream[offset..offset + size])));
                offset += size;
            }

            prop_assert_eq!(emitted, lines);
            prop_assert!(framer.pending().is_empty());
        }
    }
}
