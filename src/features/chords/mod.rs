//! Chord recognition modules
//!
//! Recognize chords on the sub-beat grid using:
//! - A transposed chord template bank (bass-aware, with a "no chord" entry)
//! - An exponentiated similarity observation model
//! - HMM Viterbi decoding with a metrical self-transition bias
//! - Segment building from the decoded path

pub mod hmm;
pub mod observation;
pub mod segments;
pub mod templates;

pub use hmm::ChordHmm;
pub use observation::ObservationModel;
pub use segments::{build_segments, frames_to_time};
pub use templates::{ChordTemplate, TemplateBank, DEFAULT_CHORD_DICTIONARY, NO_CHORD_LABEL};
