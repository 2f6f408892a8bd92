use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Index substituted for a seed symbol the vocabulary does not know.
pub const FALLBACK_INDEX: usize = 0;

/// The alphabet of a corpus and its symbol ↔ index mapping.
///
/// Symbols are sorted by code point, so the same corpus always yields the
/// same indices and a model fitted earlier stays valid against it.
///
/// # Invariants
/// - `symbols` is sorted and holds no duplicate
/// - `index[symbols[i]] == i` for every `i < symbols.len()`
///
/// Only `symbols` is serialized; the reverse index is rebuilt (and the
/// ordering checked) on load.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "Vec<char>", into = "Vec<char>")]
pub struct Vocabulary {
	/// Index → symbol.
	symbols: Vec<char>,
	/// Symbol → index.
	index: HashMap<char, usize>,
}

impl TryFrom<Vec<char>> for Vocabulary {
	type Error = Error;

	/// Rebuilds a vocabulary from its symbol list.
	///
	/// # Errors
	/// Returns `Error::InvalidParameter` unless the symbols are sorted and distinct.
	fn try_from(symbols: Vec<char>) -> Result<Self> {
		if !symbols.windows(2).all(|pair| pair[0] < pair[1]) {
			return Err(Error::InvalidParameter("vocabulary symbols must be sorted and distinct".to_owned()));
		}
		Ok(Self::from_sorted(symbols))
	}
}

impl From<Vocabulary> for Vec<char> {
	fn from(vocabulary: Vocabulary) -> Self {
		vocabulary.symbols
	}
}

impl Vocabulary {
	/// Builds the vocabulary of a corpus.
	///
	/// # Errors
	/// Returns `Error::EmptyCorpus` if `corpus` has no symbol.
	pub fn build(corpus: &str) -> Result<Self> {
		if corpus.is_empty() {
			return Err(Error::EmptyCorpus);
		}
		let distinct: BTreeSet<char> = corpus.chars().collect();
		Ok(Self::from_sorted(distinct.into_iter().collect()))
	}

	fn from_sorted(symbols: Vec<char>) -> Self {
		let index = symbols.iter().enumerate().map(|(i, c)| (*c, i)).collect();
		Self { symbols, index }
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	/// Sorted symbols, position = index.
	pub fn symbols(&self) -> &[char] {
		&self.symbols
	}

	pub fn index_of(&self, symbol: char) -> Option<usize> {
		self.index.get(&symbol).copied()
	}

	pub fn symbol_at(&self, index: usize) -> Option<char> {
		self.symbols.get(index).copied()
	}

	/// Encodes every symbol of `text`.
	///
	/// # Errors
	/// Returns `Error::UnknownSymbol` with the character position of the first
	/// symbol absent from the vocabulary.
	pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
		text.chars()
			.enumerate()
			.map(|(position, symbol)| self.index_of(symbol).ok_or(Error::UnknownSymbol { symbol, position }))
			.collect()
	}

	/// Encodes `text`, replacing unknown symbols by `FALLBACK_INDEX`.
	///
	/// Used for generation seeds only: a typo in a seed must not prevent
	/// generation, and it only affects the initial context.
	pub fn encode_lossy(&self, text: &str) -> Vec<usize> {
		text.chars()
			.map(|symbol| self.index_of(symbol).unwrap_or(FALLBACK_INDEX))
			.collect()
	}

	/// Decodes indices back into text.
	///
	/// # Errors
	/// Returns `Error::Decode` for an index outside the vocabulary.
	pub fn decode(&self, indices: &[usize]) -> Result<String> {
		indices
			.iter()
			.map(|&i| self.symbol_at(i).ok_or(Error::Decode(i)))
			.collect()
	}
}
