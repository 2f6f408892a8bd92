use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default context length, in symbols.
pub const DEFAULT_WINDOW_LEN: usize = 40;

/// Default distance between two consecutive training windows.
pub const DEFAULT_STRIDE: usize = 3;

/// Default number of symbols generated after the seed.
pub const DEFAULT_LENGTH: usize = 400;

/// Default sampling temperature (the model distribution, unchanged).
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Default upper bound on the number of symbols one run may generate.
pub const DEFAULT_MAX_LENGTH: usize = 100_000;

/// How the corpus is sliced into training windows.
///
/// # Invariants
/// - `window_len > 0`
/// - `stride > 0`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
	/// Number of symbols in one window (the model context length).
	pub window_len: usize,
	/// Offset between the starts of two consecutive windows.
	pub stride: usize,
}

impl Default for WindowConfig {
	fn default() -> Self {
		Self { window_len: DEFAULT_WINDOW_LEN, stride: DEFAULT_STRIDE }
	}
}

impl WindowConfig {
	/// Checks the invariants.
	///
	/// # Errors
	/// Returns `Error::InvalidParameter` if the window length or the stride is zero.
	pub fn validate(&self) -> Result<()> {
		if self.window_len == 0 {
			return Err(Error::InvalidParameter("window length must be > 0".to_owned()));
		}
		if self.stride == 0 {
			return Err(Error::InvalidParameter("stride must be > 0".to_owned()));
		}
		Ok(())
	}
}

/// Parameters of one sampling run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
	/// Number of symbols appended to the seed.
	pub length: usize,
	/// Temperature applied to the model distribution, must be > 0.
	/// Below 1 sharpens, above 1 flattens.
	pub temperature: f64,
	/// Seed of the random generator. `None` draws one from the OS.
	pub rng_seed: Option<u64>,
}

impl Default for SamplingConfig {
	fn default() -> Self {
		Self { length: DEFAULT_LENGTH, temperature: DEFAULT_TEMPERATURE, rng_seed: None }
	}
}

impl SamplingConfig {
	/// # Errors
	/// Returns `Error::InvalidParameter` if the temperature is not a finite positive number.
	pub fn validate(&self) -> Result<()> {
		if !self.temperature.is_finite() || self.temperature <= 0.0 {
			return Err(Error::InvalidParameter(format!(
				"temperature must be a finite value > 0, got {}",
				self.temperature
			)));
		}
		Ok(())
	}
}

/// Parameters of the back-off n-gram model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NGramConfig {
	/// Longest context (in symbols) the model keeps statistics for.
	/// Capped by the window length at fit time.
	pub max_order: usize,
	/// Additive smoothing applied to every symbol of a context.
	pub smoothing: f64,
}

impl Default for NGramConfig {
	fn default() -> Self {
		Self { max_order: 8, smoothing: 0.01 }
	}
}

impl NGramConfig {
	/// # Errors
	/// Returns `Error::InvalidParameter` if the smoothing is negative or not finite.
	pub fn validate(&self) -> Result<()> {
		if !self.smoothing.is_finite() || self.smoothing < 0.0 {
			return Err(Error::InvalidParameter(format!(
				"smoothing must be a finite value >= 0, got {}",
				self.smoothing
			)));
		}
		Ok(())
	}
}

/// Full configuration of a training + generation session.
///
/// Every field has a default, so a JSON file only needs the values it overrides:
///
/// ```json
/// { "window": { "window_len": 20 }, "sampling": { "temperature": 0.7 } }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
	pub window: WindowConfig,
	pub sampling: SamplingConfig,
	pub model: NGramConfig,
	/// Reuse (and write) the `.bin` checkpoint next to the corpus.
	pub use_cache: bool,
	/// Largest `length` a sampling request may ask for.
	pub max_length: usize,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			window: WindowConfig::default(),
			sampling: SamplingConfig::default(),
			model: NGramConfig::default(),
			use_cache: true,
			max_length: DEFAULT_MAX_LENGTH,
		}
	}
}

impl GeneratorConfig {
	/// Parses a configuration from a JSON string and validates it.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads a JSON configuration file.
	///
	/// # Errors
	/// I/O errors, malformed JSON, and values failing validation.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}

	pub fn validate(&self) -> Result<()> {
		self.window.validate()?;
		self.validate_sampling(&self.sampling)?;
		self.model.validate()
	}

	/// Validates a sampling request against this configuration.
	///
	/// # Errors
	/// Returns `Error::InvalidParameter` for an invalid temperature or a
	/// length above `max_length`.
	pub fn validate_sampling(&self, sampling: &SamplingConfig) -> Result<()> {
		sampling.validate()?;
		if sampling.length > self.max_length {
			return Err(Error::InvalidParameter(format!(
				"length must be at most {}, got {}",
				self.max_length, sampling.length
			)));
		}
		Ok(())
	}
}
