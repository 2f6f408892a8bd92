use std::collections::VecDeque;

use log::{debug, info};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use super::sequence_model::SequenceModel;
use super::vocabulary::Vocabulary;

/// Floor added to every probability before taking its logarithm.
pub const EPSILON: f64 = 1e-8;

/// Receives progress events from a sampling run.
///
/// Events are a side channel: an observer cannot change the generated text.
/// `should_stop` is polled between two steps, never during a model query.
pub trait GenerationObserver {
	/// Called after symbol `step` (1-based) of `total` has been appended.
	fn on_step(&mut self, _step: usize, _total: usize, _symbol: char) {}

	/// Returning `true` ends the run early with the text generated so far.
	fn should_stop(&self) -> bool {
		false
	}
}

/// Observer ignoring every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

/// Rescales a distribution by `temperature`.
///
/// Computes `exp(ln(p_i + EPSILON) / temperature)` and renormalizes. The
/// largest log value is subtracted before dividing by the temperature, so the
/// most likely symbol always weighs `exp(0) = 1` and tiny temperatures
/// cannot turn every weight into NaN. Negative or NaN inputs count as 0.
///
/// The result is non-negative and sums to 1. `temperature` must be > 0;
/// callers validate it.
pub fn rescale_distribution(probabilities: &[f32], temperature: f64) -> Vec<f64> {
	let logs: Vec<f64> = probabilities
		.iter()
		.map(|&p| (p.max(0.0) as f64 + EPSILON).ln())
		.collect();
	let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let weights: Vec<f64> = logs.iter().map(|l| ((l - max) / temperature).exp()).collect();
	let sum: f64 = weights.iter().sum();
	weights.into_iter().map(|w| w / sum).collect()
}

/// Autoregressive, temperature-controlled sampler.
///
/// Owns its random generator: two samplers created with the same seed
/// produce the same text from the same model.
#[derive(Clone, Debug)]
pub struct Sampler {
	rng: StdRng,
}

impl Sampler {
	/// Creates a sampler, seeded when `rng_seed` is set, from OS entropy otherwise.
	pub fn new(rng_seed: Option<u64>) -> Self {
		let rng = match rng_seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Self { rng }
	}

	/// Draws one index with probability proportional to its weight.
	///
	/// # Errors
	/// Returns `Error::Distribution` if the weights are empty, all zero, or not finite.
	pub fn draw_index(&mut self, weights: &[f64]) -> Result<usize> {
		let distribution = WeightedIndex::new(weights).map_err(|e| Error::Distribution(e.to_string()))?;
		Ok(distribution.sample(&mut self.rng))
	}

	/// Extends `seed` by `config.length` sampled symbols.
	///
	/// The window starts as the last `W` seed symbols (unknown symbols become
	/// index 0). Each step queries `model`, rescales the distribution by the
	/// temperature, draws an index, appends its symbol and slides the window.
	/// With a length of 0 the model is never queried.
	///
	/// The result starts with `seed` verbatim and holds `len(seed) + length`
	/// symbols, unless `observer` stopped the run early.
	///
	/// # Errors
	/// - `Error::InvalidParameter`: temperature not > 0, or seed shorter than the window
	/// - `Error::Decode`: the model produced an index the vocabulary does not have
	/// - any error of `model.predict`, unchanged
	pub fn generate<M: SequenceModel + ?Sized>(
		&mut self,
		model: &M,
		vocabulary: &Vocabulary,
		seed: &str,
		config: &SamplingConfig,
		observer: &mut dyn GenerationObserver,
	) -> Result<String> {
		config.validate()?;
		let window_len = model.window_len();
		if window_len == 0 {
			return Err(Error::InvalidParameter("model window length must be > 0".to_owned()));
		}
		let seed_len = seed.chars().count();
		if seed_len < window_len {
			return Err(Error::InvalidParameter(format!(
				"seed must hold at least {} symbols, got {}",
				window_len, seed_len
			)));
		}

		let context: String = seed.chars().skip(seed_len - window_len).collect();
		let mut window: VecDeque<usize> = vocabulary.encode_lossy(&context).into();
		let mut output = String::from(seed);

		debug!("sampling {} symbols at temperature {}", config.length, config.temperature);

		for step in 0..config.length {
			if observer.should_stop() {
				info!("generation stopped after {} of {} symbols", step, config.length);
				break;
			}

			let probabilities = model.predict(window.make_contiguous())?;
			let rescaled = rescale_distribution(&probabilities, config.temperature);
			let index = self.draw_index(&rescaled)?;
			let symbol = vocabulary.symbol_at(index).ok_or(Error::Decode(index))?;

			output.push(symbol);
			window.pop_front();
			window.push_back(index);

			observer.on_step(step + 1, config.length, symbol);
		}

		Ok(output)
	}
}
