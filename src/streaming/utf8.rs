//! UTF-8 reassembly across chunk boundaries.
//!
//! Transports deliver byte chunks that can split a multi-byte character at
//! any point. The assembler withholds a trailing incomplete sequence (at
//! most 3 bytes) until the next chunk completes it, so the scrubber only
//! ever sees whole symbols. Invalid sequences decode to U+FFFD.

/// Turns transport byte chunks into decoded text.
pub struct Utf8Assembler {
    /// Leading bytes of an incomplete sequence from the previous chunk
    held: [u8; 4],
    /// Number of held bytes
    held_len: usize,
}

impl Utf8Assembler {
    /// Create an assembler with no held bytes
    pub fn new() -> Self {
        Self {
            held: [0u8; 4],
            held_len: 0,
        }
    }

    /// Decode the next chunk, combining it with any held bytes.
    ///
    /// Returns every character that is complete so far; a trailing
    /// incomplete sequence is withheld for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        let mut out = String::new();
        let mut rest = chunk;
        if self.held_len > 0 {
            rest = self.complete_held(rest, &mut out);
        }

        let split = trailing_incomplete(rest);
        let (ready, tail) = rest.split_at(split);
        out.push_str(&String::from_utf8_lossy(ready));
        self.held[..tail.len()].copy_from_slice(tail);
        self.held_len = tail.len();
        out
    }

    /// Flush at end-of-stream. A dangling incomplete sequence decodes to
    /// U+FFFD; with nothing held this returns empty.
    pub fn finish(&mut self) -> String {
        if self.held_len == 0 {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.held[..self.held_len]).into_owned();
        self.held_len = 0;
        out
    }

    /// Drop any held bytes for a new stream
    pub fn reset(&mut self) {
        self.held_len = 0;
    }

    /// Number of bytes currently withheld
    pub fn held_len(&self) -> usize {
        self.held_len
    }

    /// Try to finish the held sequence with leading bytes of the chunk.
    /// Returns the unconsumed remainder.
    fn complete_held<'a>(&mut self, chunk: &'a [u8], out: &mut String) -> &'a [u8] {
        let expected = sequence_length(self.held[0]);
        let mut len = self.held_len;
        let mut consumed = 0;
        while len < expected && consumed < chunk.len() && is_continuation(chunk[consumed]) {
            self.held[len] = chunk[consumed];
            len += 1;
            consumed += 1;
        }

        if len == expected {
            // Sequence is complete; lossy decoding catches the rare case
            // where the combined bytes still do not form a valid character
            out.push_str(&String::from_utf8_lossy(&self.held[..len]));
            self.held_len = 0;
        } else if consumed == chunk.len() {
            // Chunk exhausted, keep holding
            self.held_len = len;
        } else {
            // Next byte is not a continuation: the held sequence can never
            // complete, so it decodes to U+FFFD
            out.push_str(&String::from_utf8_lossy(&self.held[..len]));
            self.held_len = 0;
        }
        &chunk[consumed..]
    }
}

impl Default for Utf8Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Index where a trailing incomplete sequence starts, or `bytes.len()`
/// when the chunk ends on a character boundary.
fn trailing_incomplete(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let lower = len.saturating_sub(4);
    let mut i = len;
    while i > lower {
        i -= 1;
        if !is_continuation(bytes[i]) {
            let expected = sequence_length(bytes[i]);
            if expected > len - i {
                return i;
            }
            return len;
        }
    }
    // Four or more trailing continuation bytes cannot be completed by any
    // start byte; let lossy decoding turn them into U+FFFD
    len
}

/// UTF-8 continuation byte (10xxxxxx)
#[inline]
fn is_continuation(byte: u8) -> bool {
    (byte & 0b1100_0000) == 0b1000_0000
}

/// Expected sequence length from a start byte
#[inline]
fn sequence_length(first_byte: u8) -> usize {
    match first_byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        // Invalid start byte, consumed on its own
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut asm = Utf8Assembler::new();
        assert_eq!(asm.push(b"Hello, World!"), "Hello, World!");
        assert_eq!(asm.held_len(), 0);
        assert_eq!(asm.finish(), "");
    }

    #[test]
    fn test_complete_multibyte_in_one_chunk() {
        let mut asm = Utf8Assembler::new();
        assert_eq!(asm.push("思考🦀".as_bytes()), "思考🦀");
        assert_eq!(asm.finish(), "");
    }

    #[test]
    fn test_split_emoji_across_chunks() {
        // 🦀 is F0 9F A6 80
        let mut asm = Utf8Assembler::new();
        assert_eq!(asm.push(&[b'H', b'i', b' ', 0xF0, 0x9F]), "Hi ");
        assert_eq!(asm.held_len(), 2);
        assert_eq!(asm.push(&[0xA6, 0x80, b'!']), "🦀!");
        assert_eq!(asm.held_len(), 0);
    }

    #[test]
    fn test_three_way_split() {
        let bytes = "é".as_bytes(); // C3 A9
        let mut asm = Utf8Assembler::new();
        assert_eq!(asm.push(&bytes[..1]), "");
        assert_eq!(asm.push(&bytes[1..]), "é");
    }

    #[test]
    fn test_dangling_sequence_flushes_as_replacement() {
        let mut asm = Utf8Assembler::new();
        assert_eq!(asm.push(&[b'a', 0xE4, 0xB8]), "a");
        assert_eq!(asm.finish(), "\u{FFFD}");
        assert_eq!(asm.held_len(), 0);
    }

    #[test]
    fn test_broken_held_sequence_replaced() {
        let mut asm = Utf8Assembler::new();
        // Start of a 3-byte sequence, then a plain ASCII byte
        assert_eq!(asm.push(&[0xE4]), "");
        assert_eq!(asm.push(b"x"), "\u{FFFD}x");
    }

    #[test]
    fn test_invalid_bytes_inside_chunk() {
        let mut asm = Utf8Assembler::new();
        let out = asm.push(&[b'a', 0xFF, b'b']);
        assert_eq!(out, "a\u{FFFD}b");
    }

    #[test]
    fn test_reset_drops_held_bytes() {
        let mut asm = Utf8Assembler::new();
        asm.push(&[0xF0, 0x9F]);
        assert_eq!(asm.held_len(), 2);
        asm.reset();
        assert_eq!(asm.held_len(), 0);
        assert_eq!(asm.finish(), "");
    }

    proptest! {
        /// Valid text split at arbitrary byte positions reassembles
        /// exactly.
        #[test]
        fn prop_reassembles_any_byte_chunking(
            text in "[a-z思考🦀é ]{0,32}",
            cuts in prop::collection::vec(0usize..128, 0..5),
        ) {
            let bytes = text.as_bytes();
            let mut cuts: Vec<usize> = cuts
                .into_iter()
                .map(|c| c.min(bytes.len()))
                .collect();
            cuts.sort_unstable();

            let mut asm = Utf8Assembler::new();
            let mut out = String::new();
            let mut start = 0;
            for cut in cuts {
                out.push_str(&asm.push(&bytes[start..cut]));
                start = cut;
            }
            out.push_str(&asm.push(&bytes[start..]));
            out.push_str(&asm.finish());

            prop_assert_eq!(out, text);
        }
    }
}
