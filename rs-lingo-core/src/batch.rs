//! Training and testing on free text.
//!
//! Text is split on whitespace; each token is symbolized on its own.
//! Tokens that fail to convert are skipped silently.

use std::path::Path;

use crate::alphabet::{Symbolizer, Word};
use crate::error::{LingoError, Result};
use crate::io::read_text;
use crate::model::{argmax, LanguageModel};

/// Averaged verdict over every word of a text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextVerdict {
	/// Number of words scored.
	pub words: usize,
	/// Mean rating per language.
	pub ratings: Vec<f64>,
	pub choice: usize,
}

/// Trains `model` on every word of `text` that passes the symbolizer's
/// length bounds, and returns how many were used.
///
/// # Errors
/// Returns an error if `language` is unknown to the model.
pub fn train_on_text(
	model: &mut LanguageModel,
	symbolizer: &Symbolizer,
	text: &str,
	language: usize,
	polling_rate: usize,
) -> Result<usize> {
	if language >= model.languages() {
		return Err(LingoError::UnknownLanguage { index: language, count: model.languages() });
	}

	let mut trained = 0;
	for (line, content) in text.lines().enumerate() {
		for token in content.split_whitespace() {
			let Ok(word) = symbolizer.symbolize(token, true) else {
				continue;
			};
			model.observe(&word, language)?;
			trained += 1;
			if polling_rate > 0 && trained % polling_rate == 0 {
				log::info!("{} lines and {trained} words trained", line + 1);
			}
		}
	}
	log::info!("{trained} words trained");
	Ok(trained)
}

/// Scores every convertible word of `text`, ignoring length bounds, and
/// averages the ratings.
///
/// Words are cut to `truncate_to` symbols (no cut for 0). Returns `None`
/// when the text holds no convertible word.
pub fn test_on_text(
	model: &LanguageModel,
	symbolizer: &Symbolizer,
	text: &str,
	truncate_to: usize,
	polling_rate: usize,
) -> Result<Option<TextVerdict>> {
	let mut sums = vec![0.0; model.languages()];
	let mut tested = 0;
	for (line, content) in text.lines().enumerate() {
		for token in content.split_whitespace() {
			let Ok(mut word) = symbolizer.symbolize(token, false) else {
				continue;
			};
			clip(&mut word, truncate_to);
			for (sum, rating) in sums.iter_mut().zip(model.score(&word)?) {
				*sum += rating;
			}
			tested += 1;
			if polling_rate > 0 && tested % polling_rate == 0 {
				log::info!("{} lines and {tested} words tested", line + 1);
			}
		}
	}
	log::info!("{tested} words tested");

	if tested == 0 {
		return Ok(None);
	}
	let ratings: Vec<f64> = sums.iter().map(|sum| sum / tested as f64).collect();
	Ok(Some(TextVerdict { words: tested, choice: argmax(&ratings), ratings }))
}

/// Reads a UTF-8 file and trains on it, see [`train_on_text`].
pub fn train_on_file<P: AsRef<Path>>(
	model: &mut LanguageModel,
	symbolizer: &Symbolizer,
	path: P,
	language: usize,
	polling_rate: usize,
) -> Result<usize> {
	log::info!("Starting training on {}", path.as_ref().display());
	let text = read_text(path)?;
	train_on_text(model, symbolizer, &text, language, polling_rate)
}

/// Reads a UTF-8 file and tests on it, see [`test_on_text`].
pub fn test_on_file<P: AsRef<Path>>(
	model: &LanguageModel,
	symbolizer: &Symbolizer,
	path: P,
	truncate_to: usize,
	polling_rate: usize,
) -> Result<Option<TextVerdict>> {
	log::info!("Starting test on {}", path.as_ref().display());
	let text = read_text(path)?;
	test_on_text(model, symbolizer, &text, truncate_to, polling_rate)
}

/// Cuts `word` to its first `len` symbols; 0 keeps it whole.
pub(crate) fn clip(word: &mut Word, len: usize) {
	if len > 0 {
		word.truncate(len);
	}
}
