//! Onset detection modules
//!
//! Onset strength for beat tracking:
//! - Spectral flux envelope on the CQT frame grid

pub mod spectral_flux;

pub use spectral_flux::onset_strength_envelope;
