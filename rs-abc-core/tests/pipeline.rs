use rs_abc_core::config::{NGramConfig, SamplingConfig, WindowConfig};
use rs_abc_core::model::ngram_model::NGramTrainer;
use rs_abc_core::model::sampler::{NoopObserver, Sampler};
use rs_abc_core::model::sequence_model::{SequenceModel, Trainer};
use rs_abc_core::model::vocabulary::Vocabulary;
use rs_abc_core::model::windower::TrainingSet;
use rs_abc_core::{Error, Result};

const CORPUS: &str = "X:1\nT:Drowsy Maggie\nR:reel\nM:4/4\nK:Edor\n\
|:E2BE dEBE|E2BE AFDF|E2BE dEBE|BABc dAFD:|\n\
|:d2fd c2ec|defg afge|d2fd c2ec|BABc dAFA|\n";

#[test]
fn corpus_to_text() {
	let vocabulary = Vocabulary::build(CORPUS).unwrap();
	let window = WindowConfig { window_len: 12, stride: 3 };
	let training_set = TrainingSet::build(CORPUS, &vocabulary, &window).unwrap();
	let n = CORPUS.chars().count();
	assert_eq!(training_set.len(), (n - 12 - 1) / 3 + 1);

	let model = NGramTrainer::new(NGramConfig::default()).fit(&training_set).unwrap();
	assert_eq!(model.window_len(), 12);
	assert_eq!(model.vocabulary_size(), vocabulary.len());

	let seed: String = CORPUS.chars().take(12).collect();
	let sampling = SamplingConfig { length: 200, temperature: 0.7, rng_seed: Some(2024) };
	let text = Sampler::new(sampling.rng_seed)
		.generate(&model, &vocabulary, &seed, &sampling, &mut NoopObserver)
		.unwrap();

	assert!(text.starts_with(&seed));
	assert_eq!(text.chars().count(), 12 + 200);
	assert!(text.chars().all(|c| vocabulary.index_of(c).is_some()));
}

#[test]
fn mapping_reused_on_a_foreign_corpus_fails() {
	let vocabulary = Vocabulary::build("ABC").unwrap();
	let result = TrainingSet::build(CORPUS, &vocabulary, &WindowConfig { window_len: 4, stride: 1 });
	assert!(matches!(result, Err(Error::UnknownSymbol { symbol: 'X', position: 0 })));
}

/// A model failing on purpose, to check errors reach the caller unchanged.
struct BrokenModel;

impl SequenceModel for BrokenModel {
	fn window_len(&self) -> usize {
		2
	}

	fn vocabulary_size(&self) -> usize {
		3
	}

	fn predict(&self, _window: &[usize]) -> Result<Vec<f32>> {
		Err(Error::ModelMismatch("shape".to_owned()))
	}
}

#[test]
fn model_errors_propagate() {
	let vocabulary = Vocabulary::build("ABC").unwrap();
	let sampling = SamplingConfig { length: 3, temperature: 1.0, rng_seed: Some(1) };
	let result = Sampler::new(Some(1)).generate(&BrokenModel, &vocabulary, "AB", &sampling, &mut NoopObserver);
	assert!(matches!(result, Err(Error::ModelMismatch(_))));

	// No query at all when nothing has to be generated.
	let sampling = SamplingConfig { length: 0, ..sampling };
	let text = Sampler::new(Some(1)).generate(&BrokenModel, &vocabulary, "AB", &sampling, &mut NoopObserver).unwrap();
	assert_eq!(text, "AB");
}

#[test]
fn low_temperature_follows_the_corpus() {
	let corpus = "ABCDABCDABCDABCDABCD";
	let vocabulary = Vocabulary::build(corpus).unwrap();
	let training_set = TrainingSet::build(corpus, &vocabulary, &WindowConfig { window_len: 3, stride: 1 }).unwrap();
	let model = NGramTrainer::new(NGramConfig { max_order: 3, smoothing: 0.01 }).fit(&training_set).unwrap();

	let sampling = SamplingConfig { length: 12, temperature: 0.01, rng_seed: Some(8) };
	let text = Sampler::new(sampling.rng_seed)
		.generate(&model, &vocabulary, "ABC", &sampling, &mut NoopObserver)
		.unwrap();
	assert_eq!(text, "ABCDABCDABCDABC");
}
