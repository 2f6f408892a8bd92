use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

/// Reads a whole corpus file.
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	fs::read_to_string(filename)
}

/// Concatenates several corpus files, appending a newline after each one.
///
/// Missing files are skipped with a warning; any other I/O error is returned.
/// Useful when tunes are spread across numbered dataset files.
pub fn concat_corpora<P: AsRef<Path>>(filenames: &[P]) -> io::Result<String> {
	let mut corpus = String::new();
	for filename in filenames {
		let filename = filename.as_ref();
		match fs::read_to_string(filename) {
			Ok(content) => {
				corpus.push_str(&content);
				corpus.push('\n');
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				warn!("corpus file {} not found, skipped", filename.display());
			}
			Err(e) => return Err(e),
		}
	}
	Ok(corpus)
}

/// Writes generated text (e.g. an `.abc` tune) to a file.
pub fn write_text<P: AsRef<Path>>(filename: P, text: &str) -> io::Result<()> {
	fs::write(filename, text)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/reels.txt` + `"bin"` → `data/reels.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/reels.txt"` → `"reels"`
/// - `"reels.txt"` → `"reels"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}
