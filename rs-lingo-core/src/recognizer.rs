use std::path::Path;

use crate::alphabet::{Alphabet, Symbolizer};
use crate::batch::{self, TextVerdict};
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::{LingoError, Result};
use crate::model::{argmax, LanguageModel, PatternLimit};
use crate::sampling::{HitReport, Sampler, TrialPool};
use crate::tuner::{self, ScalePoint};

/// Ratings of a single word, one per language.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
	pub ratings: Vec<f64>,
	/// Index of the highest rating.
	pub choice: usize,
}

/// High-level language recognizer.
///
/// # Responsibilities
/// - Load the alphabet and the wordbooks described by a [`Config`]
/// - Own the model, the random source and the current trial pool
/// - Expose training, testing, tuning and inspection by language index
#[derive(Debug)]
pub struct Recognizer {
	config: Config,
	symbolizer: Symbolizer,
	corpus: Corpus,
	model: LanguageModel,
	sampler: Sampler,
	trial: Option<TrialPool>,
}

impl Recognizer {
	/// Loads the alphabet files and every wordbook of `config`.
	///
	/// # Errors
	/// - Returns an error if the configuration is invalid.
	/// - Returns an error if an alphabet file or a wordbook cannot be loaded.
	/// - Returns an error if a wordbook ends up empty or too large.
	pub fn new(config: Config) -> Result<Self> {
		config.validate()?;
		let alphabet = Alphabet::from_files(&config.charset_file, &config.ignore_file, &config.conversion_file)?;
		let symbolizer = Symbolizer::new(alphabet, config.min_length, config.max_length);
		let corpus = Corpus::load(&config, &symbolizer)?;
		let recognizer = Self::from_parts(config, symbolizer, corpus)?;
		log::info!("Initialization done");
		Ok(recognizer)
	}

	/// Assembles a recognizer around an already loaded corpus.
	///
	/// # Notes
	/// - `config.languages` is not consulted; languages come from the corpus.
	/// - The sampler uses `config.seed` when set, the clock otherwise.
	pub fn from_parts(config: Config, symbolizer: Symbolizer, corpus: Corpus) -> Result<Self> {
		let model = LanguageModel::new(
			corpus.language_count(),
			PatternLimit::from_max(config.max_pattern_len),
			corpus.longest_word(),
		)?;
		let sampler = config.seed.map_or_else(Sampler::from_clock, Sampler::seeded);
		Ok(Self { config, symbolizer, corpus, model, sampler, trial: None })
	}

	/// Settings the recognizer was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The loaded wordbooks.
	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	/// The underlying model.
	///
	/// # Notes
	/// Read only; training and scale edits go through the recognizer.
	pub fn model(&self) -> &LanguageModel {
		&self.model
	}

	/// Symbolizer used for wordbooks, classified words and text files.
	pub fn symbolizer(&self) -> &Symbolizer {
		&self.symbolizer
	}

	/// Language names, by index.
	pub fn languages(&self) -> Vec<&str> {
		self.corpus.languages().collect()
	}

	/// Trains on `count` random corpus words.
	pub fn train_bulk(&mut self, count: usize) -> Result<()> {
		self.sampler
			.train_random_bulk(&mut self.model, &self.corpus, count, self.config.polling_rate)
	}

	/// Tests on `count` random corpus words.
	pub fn test_bulk(&mut self, count: usize) -> Result<HitReport> {
		self.sampler
			.test_random_bulk(&self.model, &self.corpus, count, self.config.polling_rate)
	}

	/// Tests on `count` random corpus words without progress output.
	pub fn test_bulk_rate(&mut self, count: usize) -> Result<Option<f64>> {
		self.sampler.test_random_bulk_silent(&self.model, &self.corpus, count)
	}

	/// Replaces the trial pool with `size` freshly drawn words and returns
	/// the number actually frozen.
	pub fn init_trial(&mut self, size: usize) -> Result<usize> {
		let pool = TrialPool::build(&self.corpus, size, &mut self.sampler)?;
		let len = pool.len();
		self.trial = Some(pool);
		Ok(len)
	}

	/// Hit rate of the current model on the trial pool.
	///
	/// # Errors
	/// Returns [`LingoError::EmptyTrialPool`] before [`Recognizer::init_trial`].
	pub fn trial_rate(&self) -> Result<f64> {
		self.trial.as_ref().ok_or(LingoError::EmptyTrialPool)?.evaluate(&self.model)
	}

	/// Draws a new trial pool of `pool_size` words, then runs
	/// [`tuner::auto_tune`] on it.
	pub fn auto_tune(&mut self, pool_size: usize, len_min: usize, len_max: usize, step: f64) -> Result<Vec<ScalePoint>> {
		self.init_trial(pool_size)?;
		let pool = self.trial.as_ref().ok_or(LingoError::EmptyTrialPool)?;
		tuner::auto_tune(&mut self.model, pool, len_min, len_max, step)
	}

	/// Draws a new trial pool of `pool_size` words, then runs
	/// [`tuner::scan`] on it.
	pub fn scan(
		&mut self,
		pool_size: usize,
		len_min: usize,
		len_max: usize,
		step: f64,
		scale_min: f64,
		scale_max: f64,
	) -> Result<Vec<ScalePoint>> {
		self.init_trial(pool_size)?;
		let pool = self.trial.as_ref().ok_or(LingoError::EmptyTrialPool)?;
		tuner::scan(&mut self.model, pool, len_min, len_max, step, scale_min, scale_max)
	}

	/// Scale of the 1-based `pattern_len`.
	pub fn scale(&self, pattern_len: usize) -> Result<f64> {
		self.model.scales().get(pattern_len)
	}

	/// Overrides the scale of the 1-based `pattern_len`.
	///
	/// # Parameters
	/// - `pattern_len`: pattern length, between 1 and the model's `pattern_len`
	/// - `value`: any finite scale, negative values included
	///
	/// # Errors
	/// Returns an error for an out of range length or a non-finite value.
	pub fn set_scale(&mut self, pattern_len: usize, value: f64) -> Result<()> {
		self.model.set_scale(pattern_len, value)
	}

	/// Rates a single word.
	///
	/// Length bounds do not apply; the word is cut to the longest corpus word.
	///
	/// # Errors
	/// Returns an error if the word contains an unrecognized character.
	pub fn classify(&self, text: &str) -> Result<Verdict> {
		let mut word = self.symbolizer.symbolize(text, false)?;
		batch::clip(&mut word, self.corpus.longest_word());
		let ratings = self.model.score(&word)?;
		Ok(Verdict { choice: argmax(&ratings), ratings })
	}

	/// Raw frequencies of the slice `text` at the 1-based `position`.
	///
	/// Returns `None` if the slice was never observed there.
	///
	/// # Errors
	/// - Returns [`LingoError::SlicePosition`] if `position` is 0.
	/// - Returns an error if the slice contains an unrecognized character.
	pub fn inspect_slice(&self, text: &str, position: usize) -> Result<Option<Vec<f64>>> {
		if position == 0 {
			return Err(LingoError::SlicePosition);
		}
		let mut slice = self.symbolizer.symbolize(text, false)?;
		// Slices match anywhere in a word, not only at its end
		slice.pop();
		Ok(self.model.inspect(position - 1, &slice))
	}

	/// Trains the 0-based `language` on every valid word of a text file.
	pub fn train_on_file<P: AsRef<Path>>(&mut self, path: P, language: usize) -> Result<usize> {
		batch::train_on_file(&mut self.model, &self.symbolizer, path, language, self.config.polling_rate)
	}

	/// Averages the ratings of every word of a text file.
	pub fn test_on_file<P: AsRef<Path>>(&self, path: P) -> Result<Option<TextVerdict>> {
		batch::test_on_file(
			&self.model,
			&self.symbolizer,
			path,
			self.corpus.longest_word(),
			self.config.polling_rate,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use std::path::PathBuf;

	/// Writes an alphabet and two wordbooks ("left": a-words, "right": b-words).
	fn workspace(dir: &Path) -> Config {
		let util = dir.join("util");
		let books = dir.join("books");
		fs::create_dir_all(&util).unwrap();
		fs::create_dir_all(&books).unwrap();
		fs::write(util.join("charset.txt"), "a:A\nb:B\nc:C\n").unwrap();
		fs::write(util.join("ignore.txt"), "-\n").unwrap();
		fs::write(util.join("conversion.txt"), "á:a\n").unwrap();
		fs::write(books.join("left.txt"), "a\naa\naca\nAáa\nxyz\n").unwrap();
		fs::write(books.join("right.txt"), "b\nbb\nbcb\nb-b\n").unwrap();

		Config {
			languages: vec!["left".to_owned(), "right".to_owned()],
			data_dir: books,
			charset_file: util.join("charset.txt"),
			ignore_file: util.join("ignore.txt"),
			conversion_file: util.join("conversion.txt"),
			max_pattern_len: 3,
			polling_rate: 50,
			cache_wordbooks: false,
			seed: Some(99),
			..Config::default()
		}
	}

	fn trained(dir: &Path) -> Recognizer {
		let mut recognizer = Recognizer::new(workspace(dir)).unwrap();
		recognizer.train_bulk(400).unwrap();
		recognizer
	}

	#[test]
	fn loads_corpus_from_config() {
		let dir = tempfile::tempdir().unwrap();
		let recognizer = Recognizer::new(workspace(dir.path())).unwrap();

		assert_eq!(recognizer.languages(), vec!["left", "right"]);
		assert_eq!(recognizer.corpus().wordbook(0).unwrap().len(), 4);
		assert_eq!(recognizer.corpus().discarded(), 1);
		assert_eq!(recognizer.model().pattern_len(), 3);
		assert_eq!(recognizer.corpus().longest_word(), 4);
	}

	#[test]
	fn missing_wordbook_aborts_loading() {
		let dir = tempfile::tempdir().unwrap();
		let mut config = workspace(dir.path());
		config.languages.push("missing".to_owned());
		assert!(matches!(Recognizer::new(config), Err(LingoError::Io { .. })));
	}

	#[test]
	fn classifies_trained_words() {
		let dir = tempfile::tempdir().unwrap();
		let recognizer = trained(dir.path());

		assert_eq!(recognizer.classify("aa").unwrap().choice, 0);
		assert_eq!(recognizer.classify("bb").unwrap().choice, 1);
		// longer than any corpus word, cut before scoring
		let verdict = recognizer.classify("bbbbbbbb").unwrap();
		assert_eq!(verdict.ratings.len(), 2);
		assert_eq!(verdict.choice, 1);
		assert!(matches!(recognizer.classify("abz"), Err(LingoError::Symbolize(_))));
	}

	#[test]
	fn bulk_test_reports_hits() {
		let dir = tempfile::tempdir().unwrap();
		let mut recognizer = trained(dir.path());

		let report = recognizer.test_bulk(100).unwrap();
		assert_eq!(report.overall_rate(), Some(100.0));
		assert_eq!(recognizer.test_bulk_rate(10).unwrap(), Some(100.0));
	}

	#[test]
	fn slices_are_inspected_at_one_based_positions() {
		let dir = tempfile::tempdir().unwrap();
		let recognizer = trained(dir.path());

		let chances = recognizer.inspect_slice("c", 2).unwrap().unwrap();
		assert!(chances[0] > 0.0 && chances[1] > 0.0);
		assert!((chances.iter().sum::<f64>() - 1.0).abs() < 1e-12);
		assert_eq!(recognizer.inspect_slice("a", 1).unwrap(), Some(vec![1.0, 0.0]));
		assert_eq!(recognizer.inspect_slice("c", 1).unwrap(), None);
		assert!(matches!(recognizer.inspect_slice("a", 0), Err(LingoError::SlicePosition)));
	}

	#[test]
	fn trial_pool_must_be_initialized() {
		let dir = tempfile::tempdir().unwrap();
		let mut recognizer = trained(dir.path());

		assert!(matches!(recognizer.trial_rate(), Err(LingoError::EmptyTrialPool)));
		assert_eq!(recognizer.init_trial(11).unwrap(), 10);
		assert_eq!(recognizer.trial_rate().unwrap(), 100.0);
	}

	#[test]
	fn tuning_runs_on_a_fresh_pool() {
		let dir = tempfile::tempdir().unwrap();
		let mut recognizer = trained(dir.path());

		let trace = recognizer.auto_tune(20, 1, 3, 0.5).unwrap();
		assert!(trace.len() >= 6);

		recognizer.set_scale(2, 0.75).unwrap();
		let trace = recognizer.scan(20, 2, 2, 0.25, 0.0, 1.0).unwrap();
		assert_eq!(trace.len(), 5);
		assert_eq!(recognizer.scale(2).unwrap(), 0.75);
		assert!(recognizer.set_scale(4, 1.0).is_err());
	}

	#[test]
	fn trains_and_tests_on_files() {
		let dir = tempfile::tempdir().unwrap();
		let mut recognizer = Recognizer::new(workspace(dir.path())).unwrap();
		let text: PathBuf = dir.path().join("text.txt");
		fs::write(&text, "bcb bb zzz\nb\n").unwrap();

		assert_eq!(recognizer.train_on_file(&text, 1).unwrap(), 3);
		let verdict = recognizer.test_on_file(&text).unwrap().unwrap();
		assert_eq!(verdict.words, 3);
		assert_eq!(verdict.choice, 1);
		assert!(recognizer.train_on_file(&text, 5).is_err());
	}
}
