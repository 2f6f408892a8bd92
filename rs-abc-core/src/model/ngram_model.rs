use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::NGramConfig;
use crate::error::{Error, Result};
use super::sequence_model::{SequenceModel, Trainer};
use super::state::State;
use super::windower::{TrainingExample, TrainingSet};

/// Below this many examples, fitting stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Back-off n-gram model over encoded windows.
///
/// For every context length `k` in `0..=order` the model keeps one `State`
/// per distinct "last `k` symbols of a window". Prediction uses the longest
/// context of the query window that was observed during fitting.
///
/// # Invariants
/// - `order <= window_len`
/// - Each key of `states` has a length in `0..=order`
/// - Once fitted, the unigram state (empty key) exists
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	window_len: usize,
	vocabulary_size: usize,
	/// Longest context kept.
	order: usize,
	smoothing: f64,
	states: HashMap<Vec<usize>, State>,
}

impl NGramModel {
	/// Creates an empty model. `order` is capped by `window_len`.
	pub fn new(window_len: usize, vocabulary_size: usize, config: &NGramConfig) -> Self {
		Self {
			window_len,
			vocabulary_size,
			order: config.max_order.min(window_len),
			smoothing: config.smoothing,
			states: HashMap::new(),
		}
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts observed, all orders included.
	pub fn state_count(&self) -> usize {
		self.states.len()
	}

	/// Records one training example under each of its contexts.
	pub fn add_example(&mut self, example: &TrainingExample) {
		let window = &example.window;
		for k in 0..=self.order.min(window.len()) {
			let context = &window[window.len() - k..];
			match self.states.get_mut(context) {
				Some(state) => state.add_transition(example.label),
				None => {
					let mut state = State::new(context);
					state.add_transition(example.label);
					self.states.insert(context.to_vec(), state);
				}
			}
		}
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Both models must share window length, vocabulary size and order.
	/// - Occurrence counts for matching contexts are summed.
	///
	/// # Errors
	/// Returns `Error::ModelMismatch` if the models are not compatible.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.window_len != other.window_len
			|| self.vocabulary_size != other.vocabulary_size
			|| self.order != other.order
		{
			return Err(Error::ModelMismatch(format!(
				"window/vocabulary/order ({}, {}, {}) vs ({}, {}, {})",
				self.window_len, self.vocabulary_size, self.order,
				other.window_len, other.vocabulary_size, other.order
			)));
		}

		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state)?;
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}

		Ok(())
	}
}

impl SequenceModel for NGramModel {
	fn window_len(&self) -> usize {
		self.window_len
	}

	fn vocabulary_size(&self) -> usize {
		self.vocabulary_size
	}

	fn predict(&self, window: &[usize]) -> Result<Vec<f32>> {
		if window.len() != self.window_len {
			return Err(Error::InvalidParameter(format!(
				"window has {} symbols, the model expects {}",
				window.len(),
				self.window_len
			)));
		}

		for k in (0..=self.order).rev() {
			if let Some(state) = self.states.get(&window[window.len() - k..]) {
				return Ok(state.distribution(self.vocabulary_size, self.smoothing));
			}
		}

		// Unfitted model
		Ok(State::new(&[]).distribution(self.vocabulary_size, 0.0))
	}
}

/// Fits `NGramModel`s.
#[derive(Clone, Debug, Default)]
pub struct NGramTrainer {
	pub config: NGramConfig,
}

impl NGramTrainer {
	pub fn new(config: NGramConfig) -> Self {
		Self { config }
	}

	/// Splits the examples into chunks, fits a partial model per chunk on a
	/// worker thread, then merges the partial models.
	fn fit_parallel(&self, training_set: &TrainingSet) -> Result<NGramModel> {
		let examples = training_set.examples();
		let chunks = num_cpus::get().max(1);
		let chunk_size = examples.len().div_ceil(chunks);

		let partial_models: Vec<NGramModel> = thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for chunk in examples.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial_model = self.empty_model(training_set);
					for example in chunk {
						partial_model.add_example(example);
					}
					// The receiver outlives every worker of this scope.
					let _ = tx.send(partial_model);
				});
			}
			drop(tx);
			rx.iter().collect()
		});

		let mut final_model = self.empty_model(training_set);
		for partial_model in &partial_models {
			final_model.merge(partial_model)?;
		}
		Ok(final_model)
	}

	fn empty_model(&self, training_set: &TrainingSet) -> NGramModel {
		NGramModel::new(training_set.window_len(), training_set.vocabulary_size(), &self.config)
	}
}

impl Trainer for NGramTrainer {
	type Model = NGramModel;

	/// # Errors
	/// - `Error::EmptyTrainingSet` if there is no example
	/// - `Error::InvalidParameter` if the configuration is invalid
	fn fit(&self, training_set: &TrainingSet) -> Result<NGramModel> {
		self.config.validate()?;
		if training_set.is_empty() {
			return Err(Error::EmptyTrainingSet);
		}

		let model = if training_set.len() < PARALLEL_THRESHOLD {
			let mut model = self.empty_model(training_set);
			for example in training_set.examples() {
				model.add_example(example);
			}
			model
		} else {
			self.fit_parallel(training_set)?
		};

		debug!(
			"fitted order-{} model on {} examples, {} contexts",
			model.order,
			training_set.len(),
			model.state_count()
		);
		Ok(model)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::WindowConfig;
	use crate::model::vocabulary::Vocabulary;

	fn training_set(corpus: &str, window_len: usize, stride: usize) -> (Vocabulary, TrainingSet) {
		let vocabulary = Vocabulary::build(corpus).unwrap();
		let set = TrainingSet::build(corpus, &vocabulary, &WindowConfig { window_len, stride }).unwrap();
		(vocabulary, set)
	}

	#[test]
	fn learns_a_deterministic_cycle() {
		let (vocabulary, set) = training_set("ABCABCABCABC", 3, 1);
		let trainer = NGramTrainer::new(NGramConfig { max_order: 3, smoothing: 0.0 });
		let model = trainer.fit(&set).unwrap();

		let window = vocabulary.encode("CAB").unwrap();
		let p = model.predict(&window).unwrap();
		assert_eq!(p.len(), vocabulary.len());
		assert_eq!(p[vocabulary.index_of('C').unwrap()], 1.0);
	}

	#[test]
	fn backs_off_to_shorter_context() {
		let (vocabulary, set) = training_set("ABCABCABCABC", 3, 1);
		let trainer = NGramTrainer::new(NGramConfig { max_order: 3, smoothing: 0.0 });
		let model = trainer.fit(&set).unwrap();

		// "BBA" never occurs, but "A" alone is always followed by "B".
		let window = vocabulary.encode("BBA").unwrap();
		let p = model.predict(&window).unwrap();
		assert_eq!(p[vocabulary.index_of('B').unwrap()], 1.0);
	}

	#[test]
	fn distributions_sum_to_one() {
		let (vocabulary, set) = training_set("X:1\nK:G\n|:GABc dedB|dedB dedB|c2ec B2dB|", 4, 1);
		let model = NGramTrainer::default().fit(&set).unwrap();
		for example in set.examples() {
			let p = model.predict(&example.window).unwrap();
			assert_eq!(p.len(), vocabulary.len());
			assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-4);
			assert!(p.iter().all(|&x| x >= 0.0));
		}
	}

	#[test]
	fn order_is_capped_by_window() {
		let (_, set) = training_set("ABCABCABC", 2, 1);
		let model = NGramTrainer::new(NGramConfig { max_order: 10, smoothing: 0.1 }).fit(&set).unwrap();
		assert_eq!(model.order(), 2);
	}

	#[test]
	fn wrong_window_length_rejected() {
		let (_, set) = training_set("ABCABCABC", 3, 1);
		let model = NGramTrainer::default().fit(&set).unwrap();
		assert!(matches!(model.predict(&[0, 1]), Err(Error::InvalidParameter(_))));
	}

	#[test]
	fn empty_training_set_rejected() {
		let (_, set) = training_set("ABC", 3, 1);
		assert!(matches!(NGramTrainer::default().fit(&set), Err(Error::EmptyTrainingSet)));
	}

	#[test]
	fn parallel_fit_matches_sequential() {
		let corpus = "|:GABc dedB|dedB dedB|c2ec B2dB|c2ec B2dB|".repeat(800);
		let (_, set) = training_set(&corpus, 5, 1);
		assert!(set.len() >= PARALLEL_THRESHOLD);

		let trainer = NGramTrainer::default();
		let parallel = trainer.fit(&set).unwrap();

		let mut sequential = trainer.empty_model(&set);
		for example in set.examples() {
			sequential.add_example(example);
		}
		assert_eq!(parallel, sequential);
	}

	#[test]
	fn merge_rejects_incompatible_models() {
		let mut a = NGramModel::new(3, 4, &NGramConfig::default());
		let b = NGramModel::new(4, 4, &NGramConfig::default());
		assert!(matches!(a.merge(&b), Err(Error::ModelMismatch(_))));
	}
}
