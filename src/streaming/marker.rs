//! Compiled marker sequences.
//!
//! A marker is a literal symbol sequence the scrubber removes from the
//! stream. Symbols are Unicode scalar values, so multi-byte text matches
//! exactly regardless of how the transport chunked it.

use crate::config::MarkerRule;

/// A configured marker, compiled for symbol-at-a-time matching.
#[derive(Clone, Debug)]
pub struct Marker {
    /// Original pattern text (for logging and rollback emission)
    text: String,
    /// Pattern as Unicode scalar values; the index is the match progress
    symbols: Vec<char>,
    /// Once this marker completes, discard the rest of the stream
    suppress_remainder: bool,
}

impl Marker {
    /// Compile a validated rule. Empty patterns are rejected at the
    /// configuration layer before this point.
    pub(crate) fn from_rule(rule: &MarkerRule) -> Self {
        debug_assert!(!rule.pattern.is_empty());
        Self {
            text: rule.pattern.clone(),
            symbols: rule.pattern.chars().collect(),
            suppress_remainder: rule.suppress_remainder,
        }
    }

    /// Original pattern text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of symbols in the pattern
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if the pattern has no symbols (never holds for compiled markers)
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol at the given match position, if any
    pub fn symbol(&self, position: usize) -> Option<char> {
        self.symbols.get(position).copied()
    }

    /// The first `len` symbols as literal text, for rollback emission
    pub fn prefix(&self, len: usize) -> String {
        self.symbols[..len].iter().collect()
    }

    /// Whether completing this marker suppresses the rest of the stream
    pub fn suppress_remainder(&self) -> bool {
        self.suppress_remainder
    }
}
