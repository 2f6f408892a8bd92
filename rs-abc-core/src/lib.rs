//! Character-level ABC tune generation library.
//!
//! This crate provides the sequence-modeling pipeline behind the generator:
//! - Deterministic vocabulary and symbol ↔ index mapping
//! - Fixed-window training set extraction
//! - A pluggable sequence model seam, with a back-off n-gram implementation
//! - Autoregressive, temperature-controlled sampling
//! - A high-level `Generator` tying them together, with checkpoint caching
//!
//! Rendering the generated ABC text to MIDI and playing it back are left to
//! external tools.

/// Configuration structures (window, sampling, model), loadable from JSON.
pub mod config;

/// Error type shared by every operation of the crate.
pub mod error;

/// High-level training and generation interface.
pub mod generator;

/// Corpus loading, concatenation and output helpers.
pub mod io;

/// Vocabulary, windowing, models and sampling.
pub mod model;

pub use error::{Error, Result};
