//! Sequence-modeling components, leaves first:
//! - `Vocabulary`: sorted alphabet and symbol ↔ index mapping
//! - `TrainingSet`: encoded (window, next symbol) pairs
//! - `SequenceModel` / `Trainer`: the model seam
//! - `NGramModel`: a count-based model behind that seam
//! - `Sampler`: the autoregressive generation loop

/// Symbol alphabet of a corpus and its index mapping.
pub mod vocabulary;

/// Fixed-length window / label extraction.
pub mod windower;

/// Traits any fitted model and its trainer implement.
pub mod sequence_model;

/// Back-off n-gram model and its trainer.
///
/// Supports parallel fitting and merging of partial models.
pub mod ngram_model;

/// Per-context transition counts. Not exposed publicly.
mod state;

/// Temperature rescaling, weighted draws and the generation loop.
pub mod sampler;
