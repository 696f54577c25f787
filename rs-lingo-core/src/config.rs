use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LingoError, Result};
use crate::io::read_text;

/// Recognizer settings.
///
/// Loaded from a TOML file; every field is optional and falls back to
/// [`Config::default`]. Lengths use `0` for "unbounded" (except
/// `min_length`, where 0 means "at least one symbol").
///
/// ```toml
/// languages = ["fre", "ger", "ita"]
/// max_length = 12
/// max_pattern_len = 4
/// data_dir = "wordbooks"
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
	/// Shortest accepted wordbook word, in symbols.
	pub min_length: usize,
	/// Longest accepted wordbook word, in symbols.
	pub max_length: usize,
	/// Longest n-gram used by the model.
	pub max_pattern_len: usize,
	/// Wordbook names, resolved as `<data_dir>/<name>.txt`.
	pub languages: Vec<String>,
	pub data_dir: PathBuf,
	pub charset_file: PathBuf,
	pub ignore_file: PathBuf,
	pub conversion_file: PathBuf,
	/// Progress is logged every `polling_rate` words of a bulk operation.
	pub polling_rate: usize,
	/// Keep symbolized wordbooks next to their sources (`<name>.bin`).
	pub cache_wordbooks: bool,
	/// Fixed sampler seed; seeded from the clock when absent.
	pub seed: Option<u64>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			min_length: 0,
			max_length: 0,
			max_pattern_len: 0,
			languages: ["afr", "cze", "esp", "fre", "ger", "ita", "lat", "nla", "pol", "swe"]
				.iter()
				.map(|s| (*s).to_owned())
				.collect(),
			data_dir: PathBuf::from("wordbooks"),
			charset_file: PathBuf::from("util/charset.txt"),
			ignore_file: PathBuf::from("util/ignore.txt"),
			conversion_file: PathBuf::from("util/conversion.txt"),
			polling_rate: 10_000,
			cache_wordbooks: true,
			seed: None,
		}
	}
}

impl Config {
	/// Reads and validates a TOML configuration file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_toml(&read_text(path)?)
	}

	/// Parses and validates a TOML document.
	pub fn from_toml(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks settings that cannot be expressed by the types alone.
	pub fn validate(&self) -> Result<()> {
		if self.languages.is_empty() {
			return Err(LingoError::Config("at least one language is required".to_owned()));
		}
		let mut seen = HashSet::new();
		if let Some(duplicate) = self.languages.iter().find(|l| !seen.insert(l.as_str())) {
			return Err(LingoError::Config(format!("language '{duplicate}' is listed twice")));
		}
		if self.max_length > 0 && self.min_length > self.max_length {
			return Err(LingoError::Config(format!(
				"min_length {} exceeds max_length {}",
				self.min_length, self.max_length
			)));
		}
		if self.polling_rate == 0 {
			return Err(LingoError::Config("polling_rate must be at least 1".to_owned()));
		}
		Ok(())
	}

	/// Path of a language's wordbook.
	pub fn wordbook_path(&self, language: &str) -> PathBuf {
		self.data_dir.join(format!("{language}.txt"))
	}
}
