use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, middleware, put, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info, warn};
use serde::Deserialize;

use rs_abc_core::config::{GeneratorConfig, SamplingConfig};
use rs_abc_core::generator::Generator;
use rs_abc_core::io::list_files;
use rs_abc_core::model::sampler::NoopObserver;
use rs_abc_core::Error;

const DATA_FOLDER: &str = "./data";
const CONFIG_FILE: &str = "./config.json";

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
	temperature: Option<f64>,
	rng_seed: Option<u64>,
	seed: Option<String> // none -> start of the corpus
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>
}

struct SharedData {
	config: GeneratorConfig,
	generator: Option<Generator>
}

impl GenerateParams {
	/// Overlays the query on the configured sampling defaults.
	fn sampling(&self, defaults: &SamplingConfig) -> SamplingConfig {
		SamplingConfig {
			length: self.length.unwrap_or(defaults.length),
			temperature: self.temperature.unwrap_or(defaults.temperature),
			rng_seed: self.rng_seed.or(defaults.rng_seed),
		}
	}

	fn seed(&self) -> Option<&str> {
		match &self.seed {
			Some(s) if !s.is_empty() => Some(s.as_str()),
			_ => None,
		}
	}
}

/// Maps a core error to a response: caller mistakes are 400, missing corpora
/// 404, the rest 500.
fn error_response(e: Error) -> HttpResponse {
	match e {
		Error::InvalidParameter(_)
		| Error::EmptyCorpus
		| Error::EmptyTrainingSet
		| Error::UnknownSymbol { .. } => HttpResponse::BadRequest().body(e.to_string()),
		Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
			HttpResponse::NotFound().body(e.to_string())
		}
		_ => {
			error!("request failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Extends the seed (or the start of the corpus) with sampled symbols.
/// Returns the generated ABC text as the response body.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	let generator = match &shared_data.generator {
		Some(g) => g,
		None => return HttpResponse::Conflict().body("No corpus loaded"),
	};

	let sampling = query.sampling(&shared_data.config.sampling);
	if let Err(e) = shared_data.config.validate_sampling(&sampling) {
		return error_response(e);
	}
	match generator.generate(&sampling, query.seed(), &mut NoopObserver) {
		Ok(result) => HttpResponse::Ok().body(result),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/v1/seed`, the default seed of the loaded corpus.
#[get("/v1/seed")]
async fn get_seed(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	match &shared_data.generator {
		Some(g) => HttpResponse::Ok().body(g.default_seed()),
		None => HttpResponse::Conflict().body("No corpus loaded"),
	}
}

#[get("/v1/vocabulary")]
async fn get_vocabulary(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	match &shared_data.generator {
		Some(g) => HttpResponse::Ok().json(g.vocabulary().symbols()),
		None => HttpResponse::Conflict().body("No corpus loaded"),
	}
}

/// One corpus name per line, `.txt` suffix removed.
fn corpus_listing(files: &[String]) -> String {
	files
		.iter()
		.map(|file| file.strip_suffix(".txt").unwrap_or(file))
		.collect::<Vec<_>>()
		.join("\n")
}

#[get("/v1/corpora")]
async fn get_corpora() -> impl Responder {
	match list_files(DATA_FOLDER, "txt") {
		Ok(files) => HttpResponse::Ok().body(corpus_listing(&files)),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora")
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	let names = shared_data.generator.as_ref().map(|g| g.corpus_names().join("\n")).unwrap_or_default();
	HttpResponse::Ok().body(names)
}

/// HTTP PUT endpoint `/v1/load_corpora?names=a,b`
///
/// A single corpus goes through the checkpoint cache; several corpora are
/// concatenated and trained from scratch.
#[put("/v1/load_corpora")]
async fn put_corpora(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let paths: Vec<PathBuf> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(|name| Path::new(DATA_FOLDER).join(format!("{name}.txt")))
		.collect();

	let loaded = if paths.len() == 1 {
		Generator::load_or_train(&paths[0], &shared_data.config)
	} else {
		Generator::from_files(paths.as_slice(), &shared_data.config)
	};

	match loaded {
		Ok(generator) => {
			info!("loaded corpora: {}", generator.corpus_names().join(", "));
			shared_data.generator = Some(generator);
			HttpResponse::Ok().body("Corpora loaded successfully")
		}
		Err(e) => error_response(e)
	}
}

/// Reads `./config.json` if present, defaults otherwise.
fn load_config() -> std::io::Result<GeneratorConfig> {
	if !Path::new(CONFIG_FILE).exists() {
		warn!("{CONFIG_FILE} not found, using default configuration");
		return Ok(GeneratorConfig::default());
	}
	GeneratorConfig::from_file(CONFIG_FILE)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

/// Main entry point for the server.
///
/// Starts with no corpus loaded; `PUT /v1/load_corpora` trains or loads one.
/// The generator is wrapped in a `Mutex` and shared between workers.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Logging is controlled by `RUST_LOG` (defaults to `info`).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let shared_data = SharedData {
		config: load_config()?,
		generator: None,
	};
	let shared_generator = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_generator.clone())
			.service(get_generated)
			.service(get_seed)
			.service(get_vocabulary)
			.service(get_corpora)
			.service(get_loaded_corpora)
			.service(put_corpora)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
