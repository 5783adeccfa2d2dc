//! Result types
//!
//! - Chord segments and the full transcription
//! - Run metadata

pub mod metadata;
pub mod result;
