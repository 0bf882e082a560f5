//! Streaming multi-marker scrubber.
//!
//! Removes configured marker sequences from an incrementally delivered text
//! stream. The scrubber never withholds more than the longest unresolved
//! partial match: state between calls is one progress counter per marker,
//! so memory is independent of stream length.
//!
//! All positive counters describe prefixes of a single shared withheld
//! region. A marker may only extend its counter when that counter equals
//! the withheld length; markers that fall behind stall until the next
//! reset. This keeps rollback exact: the conceded prefix is precisely the
//! text being withheld.

use log::debug;

use crate::config::{ConfigError, MarkerRule};
use crate::streaming::marker::Marker;

/// Classification of what one `add` call did to the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    /// No marker was touched; the chunk passed straight through
    NoMatch,
    /// The chunk ended inside a possible marker; its tail is withheld
    PartialMatch,
    /// At least one marker completed and was removed
    FullMatch,
    /// The suppression latch is set; input is being discarded
    Suppressed,
}

impl MatchStatus {
    /// True when the stream is in suppressed state
    pub fn is_suppressed(&self) -> bool {
        matches!(self, MatchStatus::Suppressed)
    }
}

/// A marker completion observed during one `add` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerMatch {
    /// Index of the marker in declaration order
    pub index: usize,
    /// The marker's pattern text
    pub pattern: String,
}

/// Result of feeding one chunk to the scrubber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddResult {
    /// Symbols safe to forward downstream; never part of any marker
    pub emitted: String,
    /// Whether any part of the chunk was withheld or discarded
    pub intercepted: bool,
    /// What this call did to the stream
    pub status: MatchStatus,
    /// Markers that completed during this call, in completion order
    pub matches: Vec<MarkerMatch>,
}

/// Outcome of one extension attempt over all markers.
enum Extend {
    /// A marker reached its full length; holds its index
    Completed(usize),
    /// At least one marker advanced without completing
    Advanced,
    /// No marker could continue with the symbol
    None,
}

/// Sequential multi-marker scrub state machine.
///
/// One instance per stream. Calls must arrive in stream order; independent
/// streams get independent instances and need no coordination.
pub struct StreamScrubber {
    markers: Vec<Marker>,
    /// progress[i]: symbols of marker i matched by withheld input
    progress: Vec<usize>,
    /// Length of the shared withheld region; always equals max(progress)
    pending: usize,
    /// Sticky until `reset`: discard everything
    suppressed: bool,
}

impl StreamScrubber {
    /// Build a scrubber from ordered rules. Declaration order is
    /// significant: it breaks ties between simultaneously viable markers.
    ///
    /// Fails on any empty pattern; the whole configuration is rejected.
    pub fn new(rules: &[MarkerRule]) -> Result<Self, ConfigError> {
        let mut markers = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                return Err(ConfigError::EmptyPattern { index });
            }
            markers.push(Marker::from_rule(rule));
        }
        let progress = vec![0; markers.len()];
        Ok(Self {
            markers,
            progress,
            pending: 0,
            suppressed: false,
        })
    }

    /// Consume the next chunk of the stream.
    ///
    /// Returns the subsequence that is safe to emit immediately — text that
    /// can never become part of any configured marker — plus a status. An
    /// empty chunk is a valid no-op.
    pub fn add(&mut self, chunk: &str) -> AddResult {
        if self.suppressed {
            return AddResult {
                emitted: String::new(),
                intercepted: true,
                status: MatchStatus::Suppressed,
                matches: Vec::new(),
            };
        }

        let mut emitted = String::new();
        let mut matches = Vec::new();
        for symbol in chunk.chars() {
            if let Some(index) = self.consume(symbol, &mut emitted) {
                let marker = &self.markers[index];
                debug!("marker '{}' completed, removed from stream", marker.text());
                matches.push(MarkerMatch {
                    index,
                    pattern: marker.text().to_string(),
                });
                if marker.suppress_remainder() {
                    debug!("suppress-remainder marker matched, latching");
                    self.suppressed = true;
                    break;
                }
            }
        }

        let status = if self.suppressed {
            MatchStatus::Suppressed
        } else if !matches.is_empty() {
            MatchStatus::FullMatch
        } else if self.pending > 0 && !chunk.is_empty() {
            MatchStatus::PartialMatch
        } else {
            MatchStatus::NoMatch
        };
        AddResult {
            emitted,
            intercepted: status != MatchStatus::NoMatch,
            status,
            matches,
        }
    }

    /// Drain any still-withheld partial match at end-of-stream.
    ///
    /// A suppressed stream never reveals withheld content. Idempotent: a
    /// second call with no intervening `add` returns empty.
    pub fn flush(&mut self) -> String {
        if self.suppressed {
            return String::new();
        }
        let mut out = String::new();
        if self.pending > 0 {
            self.concede(&mut out);
        }
        out
    }

    /// Clear all match state and the suppression latch for a new stream.
    /// Configured markers are untouched.
    pub fn reset(&mut self) {
        self.clear_progress();
        self.suppressed = false;
    }

    /// Whether the suppression latch is set
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Number of symbols currently withheld as a possible marker prefix
    pub fn pending_len(&self) -> usize {
        self.pending
    }

    /// Number of configured markers
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Feed one symbol. Returns the index of a completed marker, if any.
    fn consume(&mut self, symbol: char, out: &mut String) -> Option<usize> {
        match self.extend(symbol) {
            Extend::Completed(index) => {
                self.clear_progress();
                return Some(index);
            }
            Extend::Advanced => {
                self.pending += 1;
                return None;
            }
            Extend::None => {}
        }

        // No marker can continue. Concede the withheld prefix, then give
        // the symbol a second chance as a fresh match start.
        if self.pending > 0 {
            self.concede(out);
        }
        match self.extend(symbol) {
            Extend::Completed(index) => {
                self.clear_progress();
                Some(index)
            }
            Extend::Advanced => {
                self.pending += 1;
                None
            }
            Extend::None => {
                out.push(symbol);
                None
            }
        }
    }

    /// Try to extend every live marker with the symbol. The first marker in
    /// declaration order to reach its full length is authoritative.
    fn extend(&mut self, symbol: char) -> Extend {
        let mut advanced = false;
        let mut completed = None;
        for (index, marker) in self.markers.iter().enumerate() {
            // Markers behind the shared withheld region are stalled
            if self.progress[index] != self.pending {
                continue;
            }
            if marker.symbol(self.pending) == Some(symbol) {
                self.progress[index] += 1;
                advanced = true;
                if completed.is_none() && self.progress[index] == marker.len() {
                    completed = Some(index);
                }
            }
        }
        match completed {
            Some(index) => Extend::Completed(index),
            None if advanced => Extend::Advanced,
            None => Extend::None,
        }
    }

    /// Emit the withheld prefix of the longest partial match (declaration
    /// order breaks ties) and reset all counters.
    fn concede(&mut self, out: &mut String) {
        debug_assert!(self.pending > 0);
        if let Some(index) = (0..self.markers.len()).find(|&i| self.progress[i] == self.pending) {
            out.push_str(&self.markers[index].prefix(self.pending));
        }
        self.clear_progress();
    }

    fn clear_progress(&mut self) {
        for p in &mut self.progress {
            *p = 0;
        }
        self.pending = 0;
    }
}
