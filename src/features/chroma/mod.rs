//! Chroma extraction modules
//!
//! Extract bass/treble pitch-class distributions (2 x 12 semitones) from audio:
//! - Spectral whitening of constant-Q magnitudes
//! - Pitch-class folding and register normalization
//! - Beat-synchronous median aggregation

pub mod extractor;
pub mod sync;
pub mod whitening;

pub use extractor::{extract_chroma, ChromaFrame, CHROMA_SIZE};
