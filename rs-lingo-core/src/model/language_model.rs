use super::count_table::CountTable;
use super::scales::Scales;
use crate::alphabet::{Symbol, FAIL};
use crate::error::{LingoError, Result};

/// Upper bound on the n-gram length used for training and scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternLimit {
	/// Patterns are at most this long.
	Fixed(usize),
	/// Patterns may be as long as the longest word ever observed.
	Unbounded,
}

impl PatternLimit {
	/// Maps the configuration convention (`0` = unbounded) to a limit.
	pub fn from_max(max_pattern_len: usize) -> Self {
		if max_pattern_len == 0 { Self::Unbounded } else { Self::Fixed(max_pattern_len) }
	}
}

/// Positional n-gram language model.
///
/// Training counts every n-gram of a word at its start position, per
/// language. Scoring averages, per pattern length, how often each n-gram of
/// a word was seen in each language, stretches that mean around 0.5 with the
/// length's scale, and averages over all lengths.
///
/// # Invariants
/// - `scales.len() == pattern_len`
/// - `pattern_len >= 1`
#[derive(Clone, Debug)]
pub struct LanguageModel {
	table: CountTable,
	scales: Scales,
	limit: PatternLimit,
	/// Effective maximum pattern length.
	pattern_len: usize,
	/// Rating given to every language for n-grams never seen.
	default_rating: f64,
}

impl LanguageModel {
	/// Creates an empty model.
	///
	/// With [`PatternLimit::Unbounded`] the effective pattern length starts at
	/// `longest_word` (terminator included) and grows with longer trained words.
	///
	/// # Errors
	/// Returns an error if `languages` is 0 or the fixed limit is 0.
	pub fn new(languages: usize, limit: PatternLimit, longest_word: usize) -> Result<Self> {
		if languages == 0 {
			return Err(LingoError::Config("a model needs at least one language".to_owned()));
		}
		let pattern_len = match limit {
			PatternLimit::Fixed(0) => {
				return Err(LingoError::Config("fixed pattern length must be at least 1".to_owned()));
			}
			PatternLimit::Fixed(n) => n,
			PatternLimit::Unbounded => longest_word.max(1),
		};

		Ok(Self {
			table: CountTable::new(languages),
			scales: Scales::new(pattern_len),
			limit,
			pattern_len,
			default_rating: 1.0 / languages as f64,
		})
	}

	/// Number of languages the model rates.
	pub fn languages(&self) -> usize {
		self.table.languages()
	}

	/// Effective maximum pattern length.
	pub fn pattern_len(&self) -> usize {
		self.pattern_len
	}

	/// The pattern length limit the model was built with.
	pub fn limit(&self) -> PatternLimit {
		self.limit
	}

	/// Raw counts, for inspection.
	pub fn table(&self) -> &CountTable {
		&self.table
	}

	/// Per pattern length scales, read only.
	///
	/// # Notes
	/// - Always holds exactly [`LanguageModel::pattern_len`] values; edits go
	///   through [`LanguageModel::set_scale`] so that cannot change.
	pub fn scales(&self) -> &Scales {
		&self.scales
	}

	/// Overrides the scale of the 1-based `pattern_len`.
	///
	/// # Errors
	/// Returns an error if `pattern_len` is 0 or beyond
	/// [`LanguageModel::pattern_len`], or if `value` is not finite.
	pub fn set_scale(&mut self, pattern_len: usize, value: f64) -> Result<()> {
		self.scales.set(pattern_len, value)
	}

	/// Trains the model on one word of the 0-based `language`.
	///
	/// For every pattern length up to the effective maximum and every start
	/// position, the n-gram's total and language count are incremented,
	/// rescaling counters that reached their maximum first.
	///
	/// # Errors
	/// Returns an error, leaving the model untouched, if the word is empty,
	/// contains [`FAIL`], or the language is unknown.
	pub fn observe(&mut self, word: &[Symbol], language: usize) -> Result<()> {
		Self::check_word(word)?;
		if language >= self.languages() {
			return Err(LingoError::UnknownLanguage { index: language, count: self.languages() });
		}

		if self.limit == PatternLimit::Unbounded && word.len() > self.pattern_len {
			self.pattern_len = word.len();
			self.scales.ensure_len(self.pattern_len);
		}

		let plen = self.pattern_len.min(word.len());
		for i in 1..=plen {
			for (j, gram) in word.windows(i).enumerate() {
				self.table.record(j, gram, language);
			}
		}
		Ok(())
	}

	/// Rates how much `word` looks like each language.
	///
	/// Returns one confidence per language. Higher is more likely; values
	/// are comparable with each other but do not sum to 1.
	///
	/// # Errors
	/// Returns an error if the word is empty or contains [`FAIL`].
	pub fn score(&self, word: &[Symbol]) -> Result<Vec<f64>> {
		Self::check_word(word)?;

		let languages = self.languages();
		let plen = self.pattern_len.min(word.len());
		let mut ratings = vec![0.0; languages];
		let mut per_pattern = vec![0.0; languages];

		for i in 1..=plen {
			per_pattern.fill(0.0);
			for (j, gram) in word.windows(i).enumerate() {
				match self.table.get(j, gram) {
					Some(counts) if counts.total() > 0 => {
						for (k, rating) in per_pattern.iter_mut().enumerate() {
							*rating += counts.frequency(k);
						}
					}
					_ => per_pattern.iter_mut().for_each(|rating| *rating += self.default_rating),
				}
			}

			let positions = (word.len() - i + 1) as f64;
			let scale = self.scales.get(i)?;
			for (rating, sum) in ratings.iter_mut().zip(&per_pattern) {
				let mean = sum / positions;
				*rating += scale * (mean - 0.5) + 0.5;
			}
		}

		for rating in &mut ratings {
			*rating /= plen as f64;
		}
		Ok(ratings)
	}

	/// Raw per-language frequencies of `gram` at the 0-based `position`.
	///
	/// No scaling and no default rating: returns `None` if the n-gram was
	/// never observed there.
	pub fn inspect(&self, position: usize, gram: &[Symbol]) -> Option<Vec<f64>> {
		let counts = self.table.get(position, gram).filter(|counts| counts.total() > 0)?;
		Some((0..self.languages()).map(|k| counts.frequency(k)).collect())
	}

	fn check_word(word: &[Symbol]) -> Result<()> {
		if word.is_empty() {
			return Err(LingoError::EmptySequence);
		}
		if word.contains(&FAIL) {
			return Err(LingoError::FailedSequence);
		}
		Ok(())
	}
}

/// Index of the highest rating. Ties go to the lowest index.
pub fn argmax(ratings: &[f64]) -> usize {
	let mut choice = 0;
	for (i, rating) in ratings.iter().enumerate() {
		if *rating > ratings[choice] {
			choice = i;
		}
	}
	choice
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::alphabet::END;
	use crate::model::count_vector::{Count, CountVector};

	fn assert_close(actual: &[f64], expected: &[f64]) {
		assert_eq!(actual.len(), expected.len());
		for (a, e) in actual.iter().zip(expected) {
			assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
		}
	}

	fn snapshot(model: &LanguageModel) -> Vec<(usize, Vec<Symbol>, CountVector)> {
		let mut entries: Vec<_> = model
			.table()
			.iter()
			.map(|(p, g, c)| (p, g.symbols().to_vec(), c.clone()))
			.collect();
		entries.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
		entries
	}

	fn assert_sums(model: &LanguageModel) {
		for (position, gram, counts) in model.table().iter() {
			let sum: Count = counts.per_language().iter().sum();
			assert_eq!(counts.total(), sum, "at {position} {gram:?}");
		}
	}

	#[test]
	fn observe_increments_every_slice_once() {
		let mut model = LanguageModel::new(3, PatternLimit::Fixed(8), 0).unwrap();
		let word = [4, 5, 4, 6, END];
		model.observe(&word, 1).unwrap();
		let before = snapshot(&model);

		model.observe(&word, 2).unwrap();

		// n + (n-1) + ... + 1 slices, each at its own position
		assert_eq!(model.table().len(), 15);
		for i in 1..=word.len() {
			for (j, gram) in word.windows(i).enumerate() {
				let old = &before.iter().find(|(p, g, _)| *p == j && g == gram).unwrap().2;
				let new = model.table().get(j, gram).unwrap();
				assert_eq!(new.total(), old.total() + 1);
				assert_eq!(new.count(2), old.count(2) + 1);
				assert_eq!(new.count(0), old.count(0));
				assert_eq!(new.count(1), old.count(1));
			}
		}
	}

	#[test]
	fn fixed_limit_caps_pattern_length() {
		let mut model = LanguageModel::new(1, PatternLimit::Fixed(2), 0).unwrap();
		model.observe(&[1, 2, 3, END], 0).unwrap();
		assert!(model.table().get(0, &[1, 2]).is_some());
		assert!(model.table().get(0, &[1, 2, 3]).is_none());
		assert_eq!(model.table().len(), 4 + 3);
	}

	#[test]
	fn sums_hold_across_observations_and_rescales() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(3), 0).unwrap();
		let words: [&[Symbol]; 3] = [&[1, 2, END], &[2, 1, 1, END], &[1, END]];
		for round in 0..20 {
			for (n, word) in words.iter().enumerate() {
				model.observe(word, (n + round) % 2).unwrap();
			}
			if round % 3 == 0 {
				model.table.entry(0, &[1]).rescale();
				model.table.entry(1, &[2, END]).rescale();
			}
			assert_sums(&model);
		}
	}

	#[test]
	fn observe_rescales_saturated_counts() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(1), 0).unwrap();
		*model.table.entry(0, &[1]) = CountVector::from_counts(&[Count::MAX - 9, 9]).unwrap();

		model.observe(&[1, END], 0).unwrap();

		let counts = model.table().get(0, &[1]).unwrap();
		assert_eq!(counts.count(0), (Count::MAX - 9) / 2 + 1);
		assert_eq!(counts.count(1), 9 / 2);
		assert_eq!(counts.total(), (Count::MAX - 9) / 2 + 9 / 2 + 1);
	}

	#[test]
	fn observe_rejects_invalid_input_without_side_effects() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(3), 0).unwrap();
		assert!(matches!(model.observe(&[], 0), Err(LingoError::EmptySequence)));
		assert!(matches!(model.observe(&[1, FAIL, END], 0), Err(LingoError::FailedSequence)));
		assert!(matches!(
			model.observe(&[1, END], 2),
			Err(LingoError::UnknownLanguage { index: 2, count: 2 })
		));
		assert!(model.table().is_empty());
	}

	#[test]
	fn score_is_deterministic() {
		let mut model = LanguageModel::new(3, PatternLimit::Fixed(3), 0).unwrap();
		model.observe(&[1, 2, 3, END], 0).unwrap();
		model.observe(&[3, 2, 1, END], 1).unwrap();
		model.observe(&[1, 2, 1, END], 2).unwrap();
		model.set_scale(2, 1.7).unwrap();

		let word = [1, 2, 2, 1, END];
		let first = model.score(&word).unwrap();
		let second = model.score(&word).unwrap();
		assert_eq!(
			first.iter().map(|r| r.to_bits()).collect::<Vec<_>>(),
			second.iter().map(|r| r.to_bits()).collect::<Vec<_>>()
		);
	}

	#[test]
	fn unseen_ngrams_fall_back_to_the_prior() {
		let model = LanguageModel::new(2, PatternLimit::Fixed(1), 0).unwrap();
		assert_close(&model.score(&[7]).unwrap(), &[0.5, 0.5]);

		let mut model = LanguageModel::new(4, PatternLimit::Fixed(2), 0).unwrap();
		model.set_scale(1, 3.0).unwrap();
		// length 1: 3 * (0.25 - 0.5) + 0.5, length 2: 0.25
		let expected = (3.0 * (0.25 - 0.5) + 0.5 + 0.25) / 2.0;
		assert_close(&model.score(&[7, 8, END]).unwrap(), &[expected; 4]);
	}

	#[test]
	fn trained_word_ranks_its_language_first() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(2), 0).unwrap();
		let ab = [1, 2, END];
		model.observe(&ab, 0).unwrap();

		let ratings = model.score(&ab).unwrap();
		assert_close(&ratings, &[1.0, 0.0]);
		assert!(ratings[0] > ratings[1]);
		assert_eq!(argmax(&ratings), 0);
	}

	#[test]
	fn positions_beyond_the_table_use_the_prior() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(1), 0).unwrap();
		model.observe(&[1, END], 1).unwrap();
		// position 0 votes fully for language 1, positions 1 and 2 are unknown
		let ratings = model.score(&[1, 1, END]).unwrap();
		assert_close(&ratings, &[(0.0 + 0.5 + 0.5) / 3.0, (1.0 + 0.5 + 0.5) / 3.0]);
	}

	#[test]
	fn score_rejects_empty_words() {
		let model = LanguageModel::new(2, PatternLimit::Unbounded, 4).unwrap();
		assert!(matches!(model.score(&[]), Err(LingoError::EmptySequence)));
	}

	#[test]
	fn unbounded_limit_follows_the_longest_word() {
		let mut model = LanguageModel::new(1, PatternLimit::Unbounded, 3).unwrap();
		assert_eq!(model.pattern_len(), 3);
		model.observe(&[1, 2, 3, 4, END], 0).unwrap();
		assert_eq!(model.pattern_len(), 5);
		assert_eq!(model.scales().len(), 5);
		assert!(model.table().get(0, &[1, 2, 3, 4, END]).is_some());
	}

	#[test]
	fn inspect_reports_raw_frequencies() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(2), 0).unwrap();
		model.observe(&[1, 2, END], 0).unwrap();
		model.observe(&[1, 3, END], 1).unwrap();
		model.observe(&[1, 3, END], 1).unwrap();
		model.set_scale(1, 5.0).unwrap();

		assert_close(&model.inspect(0, &[1]).unwrap(), &[1.0 / 3.0, 2.0 / 3.0]);
		assert_close(&model.inspect(1, &[3, END]).unwrap(), &[0.0, 1.0]);
		assert_eq!(model.inspect(1, &[1]), None);
		assert_eq!(model.inspect(9, &[1]), None);
	}

	#[test]
	fn construction_validates_arguments() {
		assert!(LanguageModel::new(0, PatternLimit::Fixed(2), 0).is_err());
		assert!(LanguageModel::new(2, PatternLimit::Fixed(0), 0).is_err());
		assert_eq!(PatternLimit::from_max(0), PatternLimit::Unbounded);
		assert_eq!(PatternLimit::from_max(4), PatternLimit::Fixed(4));
	}

	#[test]
	fn scale_edits_keep_scoring_total() {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(3), 0).unwrap();
		let word = [1, 2, END];
		model.observe(&word, 0).unwrap();

		assert!(model.set_scale(0, 2.0).is_err());
		assert!(model.set_scale(4, 2.0).is_err());
		assert!(model.set_scale(2, f64::INFINITY).is_err());
		model.set_scale(3, 0.25).unwrap();
		model.set_scale(1, -1.0).unwrap();

		assert_eq!(model.scales().len(), model.pattern_len());
		assert_eq!(model.scales().as_slice(), &[-1.0, 1.0, 0.25]);
		let ratings = model.score(&word).unwrap();
		assert_eq!(ratings.len(), 2);
		assert!(ratings.iter().all(|r| r.is_finite()));
	}

	#[test]
	fn argmax_prefers_the_first_maximum() {
		assert_eq!(argmax(&[0.2, 0.7, 0.7]), 1);
		assert_eq!(argmax(&[0.5, 0.5]), 0);
	}
}
