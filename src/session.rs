//! Per-stream scrub sessions.
//!
//! A session ties the UTF-8 assembler and the scrubber together for one
//! stream: byte chunks go in, scrubbed text comes out, and audit events
//! are reported along the way. Sessions share no state; one stream, one
//! session, reusable across streams via `reset`.

use log::debug;

use crate::config::{ConfigError, ScrubConfig};
use crate::streaming::{AddResult, StreamScrubber, Utf8Assembler};
use crate::telemetry;

/// Running counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrubStats {
    /// Raw bytes received through `push_bytes`
    pub bytes_in: u64,
    /// Symbols fed to the scrubber
    pub symbols_in: u64,
    /// Symbols forwarded downstream
    pub symbols_out: u64,
    /// Markers removed from the stream
    pub markers_removed: u64,
}

/// One scrub session over one stream.
pub struct ScrubSession {
    session_id: u64,
    scrubber: StreamScrubber,
    utf8: Utf8Assembler,
    stats: ScrubStats,
    log_matches: bool,
    /// The suppression latch is reported at most once per stream
    suppression_reported: bool,
}

impl ScrubSession {
    /// Create a session from configuration. The id is only used to
    /// correlate log lines; the embedder picks it.
    pub fn new(config: &ScrubConfig, session_id: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            session_id,
            scrubber: StreamScrubber::new(&config.markers)?,
            utf8: Utf8Assembler::new(),
            stats: ScrubStats::default(),
            log_matches: config.log_matches,
            suppression_reported: false,
        })
    }

    /// Feed one decoded text fragment
    pub fn push_str(&mut self, chunk: &str) -> AddResult {
        let result = self.scrubber.add(chunk);
        self.stats.symbols_in += chunk.chars().count() as u64;
        self.stats.symbols_out += result.emitted.chars().count() as u64;
        self.stats.markers_removed += result.matches.len() as u64;

        if self.log_matches {
            for m in &result.matches {
                telemetry::marker_removed(self.session_id, &m.pattern).emit();
            }
            if self.scrubber.is_suppressed() && !self.suppression_reported {
                self.suppression_reported = true;
                let pattern = result
                    .matches
                    .last()
                    .map(|m| m.pattern.as_str())
                    .unwrap_or("");
                telemetry::stream_suppressed(self.session_id, pattern).emit();
            }
        }
        debug!(
            "[session={}] chunk: {} symbols in, {} out, status {:?}",
            self.session_id,
            chunk.chars().count(),
            result.emitted.chars().count(),
            result.status
        );
        result
    }

    /// Feed one raw transport chunk; multi-byte characters may split at
    /// any byte boundary
    pub fn push_bytes(&mut self, chunk: &[u8]) -> AddResult {
        self.stats.bytes_in += chunk.len() as u64;
        let decoded = self.utf8.push(chunk);
        self.push_str(&decoded)
    }

    /// Drain both layers at end-of-stream and return the final text
    pub fn finish(&mut self) -> String {
        let dangling = self.utf8.finish();
        let mut out = if dangling.is_empty() {
            String::new()
        } else {
            self.push_str(&dangling).emitted
        };

        let flushed = self.scrubber.flush();
        self.stats.symbols_out += flushed.chars().count() as u64;
        out.push_str(&flushed);

        if self.log_matches {
            telemetry::session_finished(
                self.session_id,
                self.stats.symbols_in,
                self.stats.symbols_out,
                self.stats.markers_removed,
            )
            .emit();
        }
        debug!("[session={}] finished: {:?}", self.session_id, self.stats);
        out
    }

    /// Reuse the session for a new, independent stream
    pub fn reset(&mut self) {
        self.scrubber.reset();
        self.utf8.reset();
        self.stats = ScrubStats::default();
        self.suppression_reported = false;
    }

    /// Whether the current stream is suppressed
    pub fn is_suppressed(&self) -> bool {
        self.scrubber.is_suppressed()
    }

    /// Counters for the current stream
    pub fn stats(&self) -> ScrubStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerRule;
    use crate::streaming::MatchStatus;

    fn config(markers: Vec<MarkerRule>) -> ScrubConfig {
        ScrubConfig {
            markers,
            log_matches: false,
        }
    }

    #[test]
    fn test_push_str_stream() {
        let cfg = config(vec![MarkerRule::new("<think>")]);
        let mut session = ScrubSession::new(&cfg, 1).unwrap();

        let mut out = String::new();
        out.push_str(&session.push_str("Hello <th").emitted);
        out.push_str(&session.push_str("ink>world").emitted);
        out.push_str(&session.finish());
        assert_eq!(out, "Hello world");

        let stats = session.stats();
        assert_eq!(stats.markers_removed, 1);
        assert_eq!(stats.symbols_out, "Hello world".chars().count() as u64);
    }

    #[test]
    fn test_push_bytes_with_split_marker_and_split_character() {
        let cfg = config(vec![MarkerRule::new("<思>")]);
        let mut session = ScrubSession::new(&cfg, 2).unwrap();

        // "a<思>b" with the marker's multi-byte character split across
        // transport chunks
        let bytes = "a<思>b".as_bytes();
        let mut out = String::new();
        out.push_str(&session.push_bytes(&bytes[..3]).emitted); // "a<" + first byte of 思
        out.push_str(&session.push_bytes(&bytes[3..5]).emitted); // rest of 思
        out.push_str(&session.push_bytes(&bytes[5..]).emitted); // ">b"
        out.push_str(&session.finish());
        assert_eq!(out, "ab");
        assert_eq!(session.stats().bytes_in, bytes.len() as u64);
    }

    #[test]
    fn test_suppression_via_session() {
        let cfg = config(vec![MarkerRule::suppressing("</think>")]);
        let mut session = ScrubSession::new(&cfg, 3).unwrap();

        let first = session.push_str("shown</think>hidden");
        assert_eq!(first.emitted, "shown");
        assert_eq!(first.status, MatchStatus::Suppressed);
        assert!(session.is_suppressed());

        assert_eq!(session.push_str("more hidden").emitted, "");
        assert_eq!(session.finish(), "");
    }

    #[test]
    fn test_reset_reuses_session() {
        let cfg = config(vec![MarkerRule::suppressing("<stop>")]);
        let mut session = ScrubSession::new(&cfg, 4).unwrap();
        session.push_str("a<stop>b");
        assert!(session.is_suppressed());

        session.reset();
        assert!(!session.is_suppressed());
        assert_eq!(session.stats(), ScrubStats::default());
        assert_eq!(session.push_str("clean").emitted, "clean");
    }

    #[test]
    fn test_finish_drains_partial_marker() {
        let cfg = config(vec![MarkerRule::new("<tag>")]);
        let mut session = ScrubSession::new(&cfg, 5).unwrap();
        assert_eq!(session.push_str("A<ta").emitted, "A");
        assert_eq!(session.finish(), "<ta");
    }

    #[test]
    fn test_finish_drains_dangling_utf8() {
        let cfg = config(vec![MarkerRule::new("<tag>")]);
        let mut session = ScrubSession::new(&cfg, 6).unwrap();
        // Chunk ends mid-character; the replacement char flows through
        // the scrubber like any other symbol
        let out1 = session.push_bytes(&[b'x', 0xE4, 0xB8]).emitted;
        assert_eq!(out1, "x");
        assert_eq!(session.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_empty_config_rejected_pattern_surfaces() {
        let cfg = config(vec![MarkerRule::new("")]);
        assert!(ScrubSession::new(&cfg, 7).is_err());
    }
}
