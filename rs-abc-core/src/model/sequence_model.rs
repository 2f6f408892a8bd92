use crate::error::Result;
use super::windower::TrainingSet;

/// A fitted model predicting the next symbol from a fixed-length context.
///
/// The sampler only relies on this contract, so any architecture (count
/// based, recurrent network behind FFI, remote service) can be plugged in.
pub trait SequenceModel {
	/// Number of indices a window passed to `predict` must hold.
	fn window_len(&self) -> usize;

	/// Length of the distributions returned by `predict`.
	fn vocabulary_size(&self) -> usize;

	/// Probability of each vocabulary index following `window`.
	///
	/// The returned vector has `vocabulary_size()` non-negative entries summing
	/// to 1 (up to floating-point error). The sampler does not check the sum.
	fn predict(&self, window: &[usize]) -> Result<Vec<f32>>;
}

/// Produces a fitted `SequenceModel` from a training set.
pub trait Trainer {
	type Model: SequenceModel;

	/// Fits a model. Errors are returned to the caller unchanged.
	fn fit(&self, training_set: &TrainingSet) -> Result<Self::Model>;
}
