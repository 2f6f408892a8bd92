use std::sync::mpsc;
use std::thread;

use log::debug;

use crate::config::WindowConfig;
use crate::error::{Error, Result};
use super::vocabulary::Vocabulary;

/// Below this many examples, windowing stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// One encoded window and the index of the symbol that follows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingExample {
	pub window: Vec<usize>,
	pub label: usize,
}

/// Every (window, next symbol) pair of a corpus, in corpus order.
///
/// # Invariants
/// - every `window` has exactly `window_len` indices
/// - every index (window or label) is `< vocabulary_size`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingSet {
	window_len: usize,
	stride: usize,
	vocabulary_size: usize,
	examples: Vec<TrainingExample>,
}

impl TrainingSet {
	/// Slides a window of `config.window_len` symbols over `corpus` with a step
	/// of `config.stride`.
	///
	/// For each start `i` in `0, S, 2S, …` with `i + W < N`, the example is
	/// `corpus[i..i+W]` labelled with `corpus[i+W]`. A corpus of `W` symbols or
	/// fewer gives an empty set, which is not an error here.
	///
	/// # Errors
	/// - `Error::InvalidParameter` if the window length or stride is zero
	/// - `Error::UnknownSymbol` for the first window or label symbol (in corpus
	///   order) missing from `vocabulary`
	pub fn build(corpus: &str, vocabulary: &Vocabulary, config: &WindowConfig) -> Result<Self> {
		config.validate()?;
		let window_len = config.window_len;
		let stride = config.stride;

		let symbols: Vec<char> = corpus.chars().collect();
		let count = Self::example_count(symbols.len(), window_len, stride);

		// Unknown symbols stay `None` and only fail if a window touches them.
		let encoded: Vec<Option<usize>> = symbols.iter().map(|c| vocabulary.index_of(*c)).collect();

		let examples = if count < PARALLEL_THRESHOLD {
			Self::window_range(&symbols, &encoded, 0..count, window_len, stride)?
		} else {
			Self::window_parallel(&symbols, &encoded, count, window_len, stride)?
		};

		debug!("windowed {} symbols into {} examples (W={}, S={})", symbols.len(), examples.len(), window_len, stride);

		Ok(Self { window_len, stride, vocabulary_size: vocabulary.len(), examples })
	}

	/// Number of examples produced for a corpus of `len` symbols.
	pub fn example_count(len: usize, window_len: usize, stride: usize) -> usize {
		if stride == 0 || len <= window_len {
			return 0;
		}
		(len - window_len - 1) / stride + 1
	}

	/// Builds examples `range` (example `k` starts at `k * stride`).
	fn window_range(
		symbols: &[char],
		encoded: &[Option<usize>],
		range: std::ops::Range<usize>,
		window_len: usize,
		stride: usize,
	) -> Result<Vec<TrainingExample>> {
		let mut examples = Vec::with_capacity(range.len());
		for k in range {
			let start = k * stride;
			let mut window = Vec::with_capacity(window_len);
			for position in start..start + window_len {
				window.push(Self::lookup(symbols, encoded, position)?);
			}
			let label = Self::lookup(symbols, encoded, start + window_len)?;
			examples.push(TrainingExample { window, label });
		}
		Ok(examples)
	}

	/// Same as `window_range` over all examples, split across worker threads.
	///
	/// Chunks are reassembled by their position so the output (and the first
	/// reported error) matches the sequential version.
	fn window_parallel(
		symbols: &[char],
		encoded: &[Option<usize>],
		count: usize,
		window_len: usize,
		stride: usize,
	) -> Result<Vec<TrainingExample>> {
		let chunks = num_cpus::get().max(1);
		let chunk_size = count.div_ceil(chunks);

		let mut parts: Vec<(usize, Result<Vec<TrainingExample>>)> = thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for (chunk_index, chunk_start) in (0..count).step_by(chunk_size).enumerate() {
				let tx = tx.clone();
				let range = chunk_start..(chunk_start + chunk_size).min(count);
				scope.spawn(move || {
					let part = Self::window_range(symbols, encoded, range, window_len, stride);
					// The receiver outlives every worker of this scope.
					let _ = tx.send((chunk_index, part));
				});
			}
			drop(tx);
			rx.iter().collect()
		});
		parts.sort_by_key(|(chunk_index, _)| *chunk_index);

		let mut examples = Vec::with_capacity(count);
		for (_, part) in parts {
			examples.extend(part?);
		}
		Ok(examples)
	}

	fn lookup(symbols: &[char], encoded: &[Option<usize>], position: usize) -> Result<usize> {
		encoded[position].ok_or(Error::UnknownSymbol { symbol: symbols[position], position })
	}

	pub fn window_len(&self) -> usize {
		self.window_len
	}

	pub fn stride(&self) -> usize {
		self.stride
	}

	/// Size of the vocabulary the examples were encoded with.
	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary_size
	}

	pub fn len(&self) -> usize {
		self.examples.len()
	}

	pub fn is_empty(&self) -> bool {
		self.examples.is_empty()
	}

	pub fn examples(&self) -> &[TrainingExample] {
		&self.examples
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(window_len: usize, stride: usize) -> WindowConfig {
		WindowConfig { window_len, stride }
	}

	#[test]
	fn abc_scenario() {
		let corpus = "ABCABCABCABC";
		let vocabulary = Vocabulary::build(corpus).unwrap();
		let set = TrainingSet::build(corpus, &vocabulary, &config(3, 1)).unwrap();

		let first = &set.examples()[0];
		assert_eq!(vocabulary.decode(&first.window).unwrap(), "ABC");
		assert_eq!(vocabulary.symbol_at(first.label), Some('A'));

		let second = &set.examples()[1];
		assert_eq!(vocabulary.decode(&second.window).unwrap(), "BCA");
		assert_eq!(vocabulary.symbol_at(second.label), Some('B'));

		assert_eq!(set.len(), 9);
	}

	#[test]
	fn count_matches_formula_and_labels_follow_windows() {
		let corpus = "X:1\nK:D\n|:d2fd Adfd|e2ge cege|";
		let symbols: Vec<char> = corpus.chars().collect();
		let n = symbols.len();
		let vocabulary = Vocabulary::build(corpus).unwrap();

		for window_len in 1..6 {
			for stride in 1..5 {
				let set = TrainingSet::build(corpus, &vocabulary, &config(window_len, stride)).unwrap();
				assert_eq!(set.len(), (n - window_len - 1) / stride + 1);
				for (k, example) in set.examples().iter().enumerate() {
					let start = k * stride;
					assert_eq!(example.window.len(), window_len);
					let window: String = symbols[start..start + window_len].iter().collect();
					assert_eq!(vocabulary.decode(&example.window).unwrap(), window);
					assert_eq!(vocabulary.symbol_at(example.label), Some(symbols[start + window_len]));
				}
			}
		}
	}

	#[test]
	fn short_corpus_gives_empty_set() {
		let vocabulary = Vocabulary::build("ABC").unwrap();
		assert!(TrainingSet::build("ABC", &vocabulary, &config(3, 1)).unwrap().is_empty());
		assert!(TrainingSet::build("AB", &vocabulary, &config(3, 1)).unwrap().is_empty());
		assert_eq!(TrainingSet::build("ABCA", &vocabulary, &config(3, 1)).unwrap().len(), 1);
	}

	#[test]
	fn zero_parameters_rejected() {
		let vocabulary = Vocabulary::build("ABC").unwrap();
		assert!(matches!(TrainingSet::build("ABC", &vocabulary, &config(0, 1)), Err(Error::InvalidParameter(_))));
		assert!(matches!(TrainingSet::build("ABC", &vocabulary, &config(1, 0)), Err(Error::InvalidParameter(_))));
	}

	#[test]
	fn unknown_symbol_in_window() {
		let vocabulary = Vocabulary::build("AB").unwrap();
		match TrainingSet::build("ABABZAB", &vocabulary, &config(2, 1)) {
			Err(Error::UnknownSymbol { symbol, position }) => {
				assert_eq!(symbol, 'Z');
				assert_eq!(position, 4);
			}
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn unknown_symbol_outside_every_window_is_ignored() {
		// W=2, S=3 over 7 symbols: windows [0,2)+2 and [3,5)+5, position 6 is never read.
		let vocabulary = Vocabulary::build("AB").unwrap();
		let set = TrainingSet::build("ABABABZ", &vocabulary, &config(2, 3)).unwrap();
		assert_eq!(set.len(), 2);
	}

	#[test]
	fn parallel_matches_sequential() {
		let corpus: String = "|:GABc dedB|dedB dedB|c2ec B2dB|".repeat(1200);
		let symbols: Vec<char> = corpus.chars().collect();
		let vocabulary = Vocabulary::build(&corpus).unwrap();
		let encoded: Vec<Option<usize>> = symbols.iter().map(|c| vocabulary.index_of(*c)).collect();

		let count = TrainingSet::example_count(symbols.len(), 7, 2);
		assert!(count >= PARALLEL_THRESHOLD);

		let sequential = TrainingSet::window_range(&symbols, &encoded, 0..count, 7, 2).unwrap();
		let parallel = TrainingSet::window_parallel(&symbols, &encoded, count, 7, 2).unwrap();
		assert_eq!(sequential, parallel);
	}
}
