use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{GeneratorConfig, NGramConfig, SamplingConfig, WindowConfig};
use crate::error::{Error, Result};
use crate::io;
use crate::model::ngram_model::{NGramModel, NGramTrainer};
use crate::model::sampler::{GenerationObserver, Sampler};
use crate::model::sequence_model::{SequenceModel, Trainer};
use crate::model::vocabulary::Vocabulary;
use crate::model::windower::TrainingSet;

/// A fitted model together with everything needed to trust it again later.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
	vocabulary: Vocabulary,
	window: WindowConfig,
	model_config: NGramConfig,
	model: NGramModel,
}

/// High-level pipeline: corpus → vocabulary → training set → fitted model → text.
///
/// # Responsibilities
/// - Train (or reload) a model for a corpus
/// - Keep the vocabulary the model was fitted against
/// - Generate tunes from a seed, the start of the corpus by default
#[derive(Debug)]
pub struct Generator {
	corpus: String,
	vocabulary: Vocabulary,
	model: NGramModel,
	config: GeneratorConfig,
	corpus_names: Vec<String>,
}

impl Generator {
	/// Trains a generator on an in-memory corpus.
	///
	/// # Errors
	/// - `Error::EmptyCorpus` for an empty corpus
	/// - `Error::EmptyTrainingSet` if the corpus is not longer than the window
	/// - `Error::InvalidParameter` for an invalid configuration
	pub fn train(corpus: String, config: &GeneratorConfig) -> Result<Self> {
		config.validate()?;
		let vocabulary = Vocabulary::build(&corpus)?;
		let model = Self::fit(&corpus, &vocabulary, config)?;
		Ok(Self { corpus, vocabulary, model, config: config.clone(), corpus_names: Vec::new() })
	}

	fn fit(corpus: &str, vocabulary: &Vocabulary, config: &GeneratorConfig) -> Result<NGramModel> {
		let training_set = TrainingSet::build(corpus, vocabulary, &config.window)?;
		if training_set.is_empty() {
			return Err(Error::EmptyTrainingSet);
		}
		info!(
			"training on {} symbols, vocabulary of {}, {} examples",
			corpus.chars().count(),
			vocabulary.len(),
			training_set.len()
		);
		NGramTrainer::new(config.model.clone()).fit(&training_set)
	}

	/// Loads a generator for a corpus file.
	///
	/// If `config.use_cache` is set and a checkpoint (`.bin` next to the corpus)
	/// exists and still matches the corpus and configuration, it is loaded.
	/// Otherwise the model is trained and, with `use_cache`, the checkpoint is
	/// (re)written.
	pub fn load_or_train<P: AsRef<Path>>(corpus_path: P, config: &GeneratorConfig) -> Result<Self> {
		config.validate()?;
		let corpus_path = corpus_path.as_ref();
		let corpus = io::read_corpus(corpus_path)?;
		let vocabulary = Vocabulary::build(&corpus)?;
		let checkpoint_path = io::build_output_path(corpus_path, "bin")?;
		let corpus_names = vec![io::get_filename(corpus_path)?];

		if config.use_cache && checkpoint_path.exists() {
			match Self::read_checkpoint(&checkpoint_path) {
				Ok(checkpoint)
					if checkpoint.vocabulary == vocabulary
						&& checkpoint.window == config.window
						&& checkpoint.model_config == config.model =>
				{
					info!("loaded checkpoint {}", checkpoint_path.display());
					return Ok(Self { corpus, vocabulary, model: checkpoint.model, config: config.clone(), corpus_names });
				}
				Ok(_) => info!("checkpoint {} is stale, retraining", checkpoint_path.display()),
				Err(e) => warn!("cannot read checkpoint {}: {e}, retraining", checkpoint_path.display()),
			}
		}

		let model = Self::fit(&corpus, &vocabulary, config)?;
		let generator = Self { corpus, vocabulary, model, config: config.clone(), corpus_names };
		if config.use_cache {
			generator.save_checkpoint(&checkpoint_path)?;
		}
		Ok(generator)
	}

	/// Trains a generator on the concatenation of several corpus files.
	///
	/// Missing files are skipped. No checkpoint is used.
	pub fn from_files<P: AsRef<Path>>(corpus_paths: &[P], config: &GeneratorConfig) -> Result<Self> {
		let corpus = io::concat_corpora(corpus_paths)?;
		let mut generator = Self::train(corpus, config)?;
		generator.corpus_names = corpus_paths
			.iter()
			.filter(|path| path.as_ref().is_file())
			.map(io::get_filename)
			.collect::<std::io::Result<Vec<_>>>()?;
		Ok(generator)
	}

	fn read_checkpoint(path: &Path) -> Result<Checkpoint> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Serializes the vocabulary and the fitted model with `postcard`.
	pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let checkpoint = Checkpoint {
			vocabulary: self.vocabulary.clone(),
			window: self.config.window.clone(),
			model_config: self.config.model.clone(),
			model: self.model.clone(),
		};
		let bytes = postcard::to_stdvec(&checkpoint)?;
		std::fs::write(path.as_ref(), bytes)?;
		info!("wrote checkpoint {}", path.as_ref().display());
		Ok(())
	}

	/// The first `window_len` symbols of the corpus.
	pub fn default_seed(&self) -> String {
		self.corpus.chars().take(self.window_len()).collect()
	}

	/// Generates `sampling.length` symbols after `seed` (or `default_seed()`).
	///
	/// # Errors
	/// See `Sampler::generate`.
	pub fn generate(
		&self,
		sampling: &SamplingConfig,
		seed: Option<&str>,
		observer: &mut dyn GenerationObserver,
	) -> Result<String> {
		let default_seed;
		let seed = match seed {
			Some(seed) => seed,
			None => {
				default_seed = self.default_seed();
				default_seed.as_str()
			}
		};
		Sampler::new(sampling.rng_seed).generate(&self.model, &self.vocabulary, seed, sampling, observer)
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn model(&self) -> &NGramModel {
		&self.model
	}

	pub fn window_len(&self) -> usize {
		self.model.window_len()
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	/// Names (file stems) of the corpus files this generator was trained on.
	pub fn corpus_names(&self) -> &[String] {
		&self.corpus_names
	}
}
