use thiserror::Error;

/// Errors raised by the generation pipeline.
///
/// None of these are transient: the core performs no network I/O, so nothing
/// here is retried. Callers surface the variant unchanged.
#[derive(Debug, Error)]
pub enum Error {
	/// The corpus contains no symbol, no vocabulary can be built from it.
	#[error("corpus is empty")]
	EmptyCorpus,

	/// A symbol outside the supplied vocabulary was met while encoding.
	#[error("unknown symbol {symbol:?} at position {position}")]
	UnknownSymbol { symbol: char, position: usize },

	/// A window length, stride, temperature or seed failed validation.
	#[error("invalid parameter: {0}")]
	InvalidParameter(String),

	/// A sampled index has no symbol in the vocabulary.
	///
	/// The model distribution and the vocabulary are out of sync; this is a
	/// defect, never a user error.
	#[error("index {0} has no symbol in the vocabulary")]
	Decode(usize),

	/// Windowing produced no example, there is nothing to train on.
	#[error("training set is empty (corpus shorter than the window)")]
	EmptyTrainingSet,

	/// Two models that cannot be combined (different order, window or vocabulary).
	#[error("model mismatch: {0}")]
	ModelMismatch(String),

	/// A probability distribution could not be sampled from.
	#[error("invalid distribution: {0}")]
	Distribution(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("checkpoint serialization failed: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("invalid configuration file: {0}")]
	Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
