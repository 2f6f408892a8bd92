use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Next-symbol statistics of one context.
///
/// A `State` corresponds to a fixed context (the last `k` indices of a window)
/// and counts every symbol observed right after it.
///
/// ## Invariants
/// - All transitions belong to the same `context`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// Encoded context, oldest symbol first. Empty for the unigram state.
	context: Vec<usize>,
	/// Next symbol index → number of observations.
	transitions: HashMap<usize, usize>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(context: &[usize]) -> Self {
		Self {
			context: context.to_vec(),
			transitions: HashMap::new(),
		}
	}

	/// Records one occurrence of `next` after this context.
	pub fn add_transition(&mut self, next: usize) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	/// Total number of observations.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	pub fn count(&self, next: usize) -> usize {
		self.transitions.get(&next).copied().unwrap_or(0)
	}

	/// Smoothed probability of each of the `vocabulary_size` symbols.
	///
	/// `p(i) = (count(i) + smoothing) / (total + smoothing * vocabulary_size)`.
	/// Falls back to uniform when the state holds nothing and smoothing is 0.
	pub fn distribution(&self, vocabulary_size: usize, smoothing: f64) -> Vec<f32> {
		let denominator = self.total() as f64 + smoothing * vocabulary_size as f64;
		if denominator <= 0.0 {
			return vec![1.0 / vocabulary_size as f32; vocabulary_size];
		}
		(0..vocabulary_size)
			.map(|i| ((self.count(i) as f64 + smoothing) / denominator) as f32)
			.collect()
	}

	/// Merges another state into this one, summing transition counts.
	///
	/// # Errors
	/// Returns an error if the contexts differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.context != other.context {
			return Err(Error::ModelMismatch(format!(
				"context mismatch: {:?} vs {:?}",
				self.context, other.context
			)));
		}

		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(*next).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_and_distribution() {
		let mut state = State::new(&[1, 2]);
		state.add_transition(0);
		state.add_transition(0);
		state.add_transition(2);
		assert_eq!(state.total(), 3);

		let p = state.distribution(3, 0.0);
		assert!((p[0] - 2.0 / 3.0).abs() < 1e-6);
		assert_eq!(p[1], 0.0);
		assert!((p[2] - 1.0 / 3.0).abs() < 1e-6);
	}

	#[test]
	fn smoothing_keeps_unseen_symbols_possible() {
		let mut state = State::new(&[]);
		state.add_transition(1);
		let p = state.distribution(4, 0.5);
		assert!(p.iter().all(|&x| x > 0.0));
		assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
	}

	#[test]
	fn empty_state_is_uniform() {
		let p = State::new(&[3]).distribution(4, 0.0);
		assert_eq!(p, vec![0.25; 4]);
	}

	#[test]
	fn merge_sums_counts() {
		let mut a = State::new(&[1]);
		a.add_transition(2);
		let mut b = State::new(&[1]);
		b.add_transition(2);
		b.add_transition(0);
		a.merge(&b).unwrap();
		assert_eq!(a.count(2), 2);
		assert_eq!(a.count(0), 1);

		assert!(matches!(a.merge(&State::new(&[2])), Err(Error::ModelMismatch(_))));
	}
}
