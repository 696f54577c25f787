use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the recognizer and its components.
///
/// Conversion failures of single words are reported separately through
/// [`SymbolizeError`], since they are expected while loading wordbooks and
/// only counted, not propagated.
#[derive(Error, Debug)]
pub enum LingoError {
	#[error("failed to access {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("failed to parse configuration: {0}")]
	ConfigParse(#[from] toml::de::Error),

	#[error("invalid alphabet: {0}")]
	Alphabet(String),

	#[error("wordbook '{language}' contains no usable words")]
	EmptyWordbook { language: String },

	#[error("wordbook '{language}' has {size} words, more than the sampler can index ({max})")]
	WordbookTooLarge { language: String, size: usize, max: usize },

	#[error("sequence is empty")]
	EmptySequence,

	#[error("sequence contains the conversion failure symbol")]
	FailedSequence,

	#[error("language index {index} out of range, {count} languages are loaded")]
	UnknownLanguage { index: usize, count: usize },

	#[error("pattern length {len} out of range 1..={max}")]
	PatternLength { len: usize, max: usize },

	#[error("invalid tuning parameters: {0}")]
	Tuning(String),

	#[error("trial pool is empty, initialize it with a size of at least the language count")]
	EmptyTrialPool,

	#[error("slice position must start at 1")]
	SlicePosition,

	#[error(transparent)]
	Symbolize(#[from] SymbolizeError),

	#[error("wordbook cache error: {0}")]
	Cache(#[from] postcard::Error),
}

impl LingoError {
	/// Wraps an I/O error with the path it happened on.
	pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}
}

/// Reasons a piece of text cannot be turned into a symbol sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolizeError {
	#[error("unrecognized character '{0}'")]
	Unrecognized(char),

	#[error("conversion of '{0}' does not terminate")]
	ConversionLoop(char),

	#[error("word has {len} symbols, fewer than the minimum of {min}")]
	TooShort { len: usize, min: usize },

	#[error("word has {len} symbols, more than the maximum of {max}")]
	TooLong { len: usize, max: usize },
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, LingoError>;
