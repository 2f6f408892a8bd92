use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Deserialize;

use rs_abc_core::config::GeneratorConfig;
use rs_abc_core::generator::Generator;
use rs_abc_core::io::write_text;
use rs_abc_core::model::sampler::GenerationObserver;

/// Command-line settings, read from the JSON file given as first argument.
///
/// Generator settings (`window`, `sampling`, `model`, `use_cache`) sit at the
/// top level next to the CLI-only fields:
///
/// ```json
/// {
///     "corpora": ["data/reels.txt"],
///     "seed": null,
///     "output": "generated.abc",
///     "sampling": { "length": 400, "temperature": 0.8 }
/// }
/// ```
#[derive(Deserialize, Debug)]
#[serde(default)]
struct CliConfig {
    /// One file uses the checkpoint cache, several are concatenated.
    corpora: Vec<PathBuf>,
    /// Defaults to the start of the corpus.
    seed: Option<String>,
    /// Where to save the tune as `.abc`, if anywhere.
    output: Option<PathBuf>,
    #[serde(flatten)]
    generator: GeneratorConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            corpora: vec![PathBuf::from("dataset-combined.txt")],
            seed: None,
            output: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl CliConfig {
    fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.generator.validate()?;
        if config.corpora.is_empty() {
            return Err("at least one corpus file is required".into());
        }
        Ok(config)
    }
}

/// Draws generation progress on the terminal.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(total: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(ProgressStyle::with_template("Generating [{bar:50}] {pos}/{len}")?.progress_chars("#-"));
        Ok(Self { bar })
    }
}

impl GenerationObserver for ProgressObserver {
    fn on_step(&mut self, step: usize, _total: usize, _symbol: char) {
        self.bar.set_position(step as u64);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: rs-abc-cli [config.json]
    let config = match std::env::args().nth(1) {
        Some(path) => CliConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CliConfig::default(),
    };

    // A single corpus reuses (or writes) the `.bin` checkpoint next to it
    let generator = if config.corpora.len() == 1 {
        Generator::load_or_train(&config.corpora[0], &config.generator)?
    } else {
        Generator::from_files(config.corpora.as_slice(), &config.generator)?
    };

    let sampling = &config.generator.sampling;
    let mut progress = ProgressObserver::new(sampling.length)?;
    let tune = generator.generate(sampling, config.seed.as_deref(), &mut progress)?;
    progress.bar.finish_and_clear();

    println!("{tune}");

    if let Some(output) = &config.output {
        write_text(output, &tune)?;
        info!("tune saved to {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_generator_settings() {
        let config = CliConfig::from_json(
            r#"{ "corpora": ["a.txt", "b.txt"], "output": "out.abc", "window": { "window_len": 16 } }"#,
        )
        .unwrap();
        assert_eq!(config.corpora.len(), 2);
        assert_eq!(config.output, Some(PathBuf::from("out.abc")));
        assert_eq!(config.generator.window.window_len, 16);
        assert_eq!(config.generator.window.stride, 3);
        assert!(config.seed.is_none());
    }

    #[test]
    fn defaults_to_combined_dataset() {
        let config = CliConfig::from_json("{}").unwrap();
        assert_eq!(config.corpora, vec![PathBuf::from("dataset-combined.txt")]);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(CliConfig::from_json(r#"{ "corpora": [] }"#).is_err());
        assert!(CliConfig::from_json(r#"{ "sampling": { "temperature": -1.0 } }"#).is_err());
    }
}
