use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LingoError, Result, SymbolizeError};
use crate::io::read_text;

/// One normalized character, as stored in the count table.
pub type Symbol = u8;

/// Terminates every symbolized word.
pub const END: Symbol = 0;

/// Marks a failed conversion. Never part of a stored word.
pub const FAIL: Symbol = Symbol::MAX;

/// Largest number of distinct symbols an alphabet can hold (everything
/// between the two sentinels).
pub const MAX_SYMBOLS: usize = (FAIL - 1) as usize;

/// A symbolized word, terminated by [`END`].
pub type Word = Vec<Symbol>;

/// Conversions may expand into characters that are converted again.
const MAX_CONVERSION_DEPTH: usize = 8;

/// Character tables used to turn text into symbols.
///
/// - `charset`: each known character and the symbol it maps to; several
///   spellings may share a symbol (`a` and `A`)
/// - `ignore`: characters dropped silently (apostrophes, hyphens, ...)
/// - `conversion`: characters rewritten into other text before lookup
///   (`ß` → `ss`)
///
/// Ordered maps keep the serialized form stable, which the wordbook cache
/// relies on to detect alphabet changes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Alphabet {
	charset: BTreeMap<char, Symbol>,
	ignore: BTreeSet<char>,
	conversion: BTreeMap<char, String>,
	symbols: usize,
}

impl Alphabet {
	/// Creates an empty alphabet.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads the three alphabet tables from disk.
	///
	/// # Errors
	/// Returns an error if a file cannot be read or contains an invalid line.
	pub fn from_files<C, I, V>(charset: C, ignore: I, conversion: V) -> Result<Self>
	where
		C: AsRef<Path>,
		I: AsRef<Path>,
		V: AsRef<Path>,
	{
		let alphabet = Self::from_text(
			&read_text(charset)?,
			&read_text(ignore)?,
			&read_text(conversion)?,
		)?;
		log::info!(
			"Alphabet loaded: {} symbols, {} ignored characters, {} conversions",
			alphabet.symbols,
			alphabet.ignore.len(),
			alphabet.conversion.len()
		);
		Ok(alphabet)
	}

	/// Parses the alphabet tables from their textual form.
	///
	/// # Formats
	/// - charset: one symbol per line, spellings separated by `:` (`a:A:á`).
	///   Blank lines are skipped; the n-th non-blank line becomes symbol n.
	/// - ignore: one character per line.
	/// - conversion: `source:replacement` per line, the replacement may be empty.
	pub fn from_text(charset: &str, ignore: &str, conversion: &str) -> Result<Self> {
		let mut alphabet = Self::new();

		for (number, line) in numbered_lines(charset) {
			let spellings = line
				.split(':')
				.filter(|part| !part.is_empty())
				.map(|part| single_char(part, "charset", number))
				.collect::<Result<Vec<char>>>()?;
			if !spellings.is_empty() {
				alphabet.add_symbol(&spellings)?;
			}
		}

		for (number, line) in numbered_lines(ignore) {
			alphabet.add_ignored(single_char(line, "ignore", number)?);
		}

		for (number, line) in numbered_lines(conversion) {
			let (source, replacement) = line.split_once(':').ok_or_else(|| {
				LingoError::Alphabet(format!("conversion line {number}: expected 'source:replacement'"))
			})?;
			alphabet.add_conversion(single_char(source, "conversion", number)?, replacement)?;
		}

		Ok(alphabet)
	}

	/// Registers a new symbol with all its spellings and returns it.
	///
	/// # Errors
	/// Returns an error if a spelling is already known or the alphabet is full.
	pub fn add_symbol(&mut self, spellings: &[char]) -> Result<Symbol> {
		if self.symbols >= MAX_SYMBOLS {
			return Err(LingoError::Alphabet(format!("more than {MAX_SYMBOLS} symbols")));
		}
		if let Some(c) = spellings.iter().find(|c| self.charset.contains_key(c)) {
			return Err(LingoError::Alphabet(format!("character '{c}' is mapped twice")));
		}

		self.symbols += 1;
		// Symbols start at 1, END is reserved
		let symbol = self.symbols as Symbol;
		for c in spellings {
			self.charset.insert(*c, symbol);
		}
		Ok(symbol)
	}

	/// Marks `c` as silently dropped during symbolization.
	pub fn add_ignored(&mut self, c: char) {
		self.ignore.insert(c);
	}

	/// Registers a rewrite of `source` into `replacement`.
	///
	/// # Errors
	/// Returns an error if the replacement contains `source` itself.
	pub fn add_conversion(&mut self, source: char, replacement: &str) -> Result<()> {
		if replacement.contains(source) {
			return Err(LingoError::Alphabet(format!("conversion of '{source}' refers to itself")));
		}
		self.conversion.insert(source, replacement.to_owned());
		Ok(())
	}

	/// Number of known symbols, sentinels excluded.
	pub fn symbol_count(&self) -> usize {
		self.symbols
	}

	/// Symbol of a charset character, `None` for anything else.
	pub fn symbol_of(&self, c: char) -> Option<Symbol> {
		self.charset.get(&c).copied()
	}
}

/// Non-blank lines with their 1-based line numbers, `\r` stripped.
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
	text.lines()
		.map(|line| line.trim_end_matches('\r'))
		.enumerate()
		.filter(|(_, line)| !line.is_empty())
		.map(|(i, line)| (i + 1, line))
}

fn single_char(text: &str, table: &str, line: usize) -> Result<char> {
	let mut chars = text.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => Ok(c),
		_ => Err(LingoError::Alphabet(format!(
			"{table} line {line}: expected a single character, got '{text}'"
		))),
	}
}

/// Converts text into [`Word`]s using an [`Alphabet`] and word length bounds.
///
/// Length bounds count symbols, the terminator excluded. A bound of 0
/// means "no bound" for the maximum.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Symbolizer {
	alphabet: Alphabet,
	min_length: usize,
	max_length: usize,
}

impl Symbolizer {
	/// Creates a symbolizer.
	///
	/// # Parameters
	/// - `alphabet`: character tables
	/// - `min_length`: shortest accepted word, in symbols
	/// - `max_length`: longest accepted word, in symbols (0 = unbounded)
	pub fn new(alphabet: Alphabet, min_length: usize, max_length: usize) -> Self {
		Self { alphabet, min_length, max_length }
	}

	/// The character tables.
	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	/// Converts `text` into a terminated symbol sequence.
	///
	/// Characters are resolved in order: charset, ignore list, conversion
	/// (whose output is resolved again), otherwise the word is rejected.
	/// With `enforce_bounds`, empty words and words outside the configured
	/// length bounds are rejected too.
	pub fn symbolize(&self, text: &str, enforce_bounds: bool) -> std::result::Result<Word, SymbolizeError> {
		let mut word = Word::with_capacity(text.len() + 1);
		for c in text.chars() {
			self.push_char(c, &mut word, 0)?;
		}

		if enforce_bounds {
			let min = self.min_length.max(1);
			if word.len() < min {
				return Err(SymbolizeError::TooShort { len: word.len(), min });
			}
			if self.max_length > 0 && word.len() > self.max_length {
				return Err(SymbolizeError::TooLong { len: word.len(), max: self.max_length });
			}
		}

		word.push(END);
		Ok(word)
	}

	fn push_char(&self, c: char, word: &mut Word, depth: usize) -> std::result::Result<(), SymbolizeError> {
		if let Some(symbol) = self.alphabet.symbol_of(c) {
			word.push(symbol);
		} else if self.alphabet.ignore.contains(&c) {
			// Dropped
		} else if let Some(replacement) = self.alphabet.conversion.get(&c) {
			if depth >= MAX_CONVERSION_DEPTH {
				return Err(SymbolizeError::ConversionLoop(c));
			}
			for r in replacement.chars() {
				self.push_char(r, word, depth + 1)?;
			}
		} else {
			return Err(SymbolizeError::Unrecognized(c));
		}
		Ok(())
	}
}
