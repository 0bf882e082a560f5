//! Streaming primitives for chunked text scrubbing
//!
//! This module provides the pieces a stream passes through:
//! - UTF-8 reassembly across transport chunk boundaries
//! - Compiled marker sequences
//! - The multi-marker scrub state machine

pub mod marker;
pub mod scrubber;
pub mod utf8;

pub use marker::Marker;
pub use scrubber::{AddResult, MarkerMatch, MatchStatus, StreamScrubber};
pub use utf8::Utf8Assembler;
