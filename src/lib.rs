//! Streaming marker scrubber for AI model output.
//!
//! Removes configured marker sequences — reasoning tags like `<think>`,
//! tool-call wrappers, stop markers — from an incrementally delivered text
//! stream. The scrubber decides symbol by symbol, so it never withholds
//! more than the longest unresolved partial match, and a marker split
//! across any number of chunks is still removed.
//!
//! A stream passes through three layers:
//! - [`Utf8Assembler`] turns transport byte chunks into decoded text
//! - [`StreamScrubber`] removes configured markers symbol by symbol
//! - [`ScrubSession`] ties both together per stream and reports audit
//!   events through the `log` facade
//!
//! Callers that already hold decoded text can use [`StreamScrubber`]
//! directly; callers with a fully buffered response can use
//! [`scrub_complete`]. Sessions are independent and sequential: feed
//! chunks in stream order, never concurrently against the same session.

pub mod config;
pub mod session;
pub mod streaming;
pub mod telemetry;

pub use config::{ConfigError, MarkerRule, ScrubConfig};
pub use session::{ScrubSession, ScrubStats};
pub use streaming::{AddResult, MarkerMatch, MatchStatus, StreamScrubber, Utf8Assembler};

/// Run a complete, already-buffered text through a fresh scrubber.
///
/// Equivalent to one `add` of the whole text followed by `flush`.
pub fn scrub_complete(config: &ScrubConfig, text: &str) -> Result<String, ConfigError> {
    let mut scrubber = StreamScrubber::new(&config.markers)?;
    let mut out = scrubber.add(text).emitted;
    out.push_str(&scrubber.flush());
    Ok(out)
}
