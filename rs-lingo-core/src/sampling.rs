use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::alphabet::{Symbol, Word};
use crate::corpus::Corpus;
use crate::error::{LingoError, Result};
use crate::model::{argmax, LanguageModel};

/// Random source for drawing words out of a [`Corpus`].
///
/// Owns its generator, so runs built on a fixed seed are reproducible.
/// Also drives the bulk training and testing loops.
#[derive(Clone, Debug)]
pub struct Sampler {
	rng: StdRng,
}

/// Result of classifying one drawn word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestOutcome {
	/// Language the word was drawn from.
	pub language: usize,
	/// Language with the highest score.
	pub choice: usize,
}

impl TestOutcome {
	/// Whether the model chose the right language.
	pub fn hit(&self) -> bool {
		self.language == self.choice
	}
}

impl Sampler {
	/// Seeds the generator from the wall clock.
	pub fn from_clock() -> Self {
		let seed = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_nanos() as u64)
			.unwrap_or_default();
		log::debug!("Sampler seeded with {seed}");
		Self::seeded(seed)
	}

	/// Creates a reproducible sampler.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}

	/// Picks a language uniformly.
	pub fn pick_language(&mut self, corpus: &Corpus) -> usize {
		self.rng.random_range(0..corpus.language_count())
	}

	/// Draws a word of `language` uniformly.
	///
	/// # Errors
	/// Returns an error if `language` is not part of the corpus.
	pub fn draw<'c>(&mut self, corpus: &'c Corpus, language: usize) -> Result<&'c [Symbol]> {
		let wordbook = corpus.wordbook(language).ok_or(LingoError::UnknownLanguage {
			index: language,
			count: corpus.language_count(),
		})?;
		// Corpus guarantees 1..=u32::MAX words
		let index = self.rng.random_range(0..wordbook.len() as u32) as usize;
		Ok(&wordbook.words()[index])
	}

	/// Draws a language, then one of its words.
	pub fn draw_any<'c>(&mut self, corpus: &'c Corpus) -> Result<(usize, &'c [Symbol])> {
		let language = self.pick_language(corpus);
		Ok((language, self.draw(corpus, language)?))
	}

	/// Trains on one random word of a random language and returns the language.
	pub fn train_random(&mut self, model: &mut LanguageModel, corpus: &Corpus) -> Result<usize> {
		let (language, word) = self.draw_any(corpus)?;
		model.observe(word, language)?;
		Ok(language)
	}

	/// Trains on one random word of `language`.
	pub fn train_random_in(&mut self, model: &mut LanguageModel, corpus: &Corpus, language: usize) -> Result<()> {
		let word = self.draw(corpus, language)?;
		model.observe(word, language)
	}

	/// Trains on `count` random words, logging progress every `polling_rate` words.
	pub fn train_random_bulk(
		&mut self,
		model: &mut LanguageModel,
		corpus: &Corpus,
		count: usize,
		polling_rate: usize,
	) -> Result<()> {
		log::info!("Starting training on {count} words");
		for i in 0..count {
			self.train_random(model, corpus)?;
			log_progress(i, count, polling_rate);
		}
		log::info!("100% done");
		Ok(())
	}

	/// Classifies one random word of a random language.
	pub fn test_random(&mut self, model: &LanguageModel, corpus: &Corpus) -> Result<TestOutcome> {
		let (language, word) = self.draw_any(corpus)?;
		Ok(TestOutcome { language, choice: argmax(&model.score(word)?) })
	}

	/// Classifies one random word of `language`.
	pub fn test_random_in(&mut self, model: &LanguageModel, corpus: &Corpus, language: usize) -> Result<TestOutcome> {
		let word = self.draw(corpus, language)?;
		Ok(TestOutcome { language, choice: argmax(&model.score(word)?) })
	}

	/// Classifies `count` random words, logging progress every `polling_rate` words.
	pub fn test_random_bulk(
		&mut self,
		model: &LanguageModel,
		corpus: &Corpus,
		count: usize,
		polling_rate: usize,
	) -> Result<HitReport> {
		log::info!("Starting testing on {count} words");
		let report = self.run_tests(model, corpus, count, Some(polling_rate))?;
		log::info!("100% done");
		Ok(report)
	}

	/// Classifies `count` random words quietly and returns the overall hit rate.
	pub fn test_random_bulk_silent(
		&mut self,
		model: &LanguageModel,
		corpus: &Corpus,
		count: usize,
	) -> Result<Option<f64>> {
		Ok(self.run_tests(model, corpus, count, None)?.overall_rate())
	}

	fn run_tests(
		&mut self,
		model: &LanguageModel,
		corpus: &Corpus,
		count: usize,
		polling_rate: Option<usize>,
	) -> Result<HitReport> {
		let mut report = HitReport::new(corpus.language_count());
		for i in 0..count {
			report.record(self.test_random(model, corpus)?);
			if let Some(polling_rate) = polling_rate {
				log_progress(i, count, polling_rate);
			}
		}
		Ok(report)
	}
}

fn log_progress(i: usize, count: usize, polling_rate: usize) {
	if polling_rate > 0 && i % polling_rate == 0 {
		log::info!("{:.1}% done", i as f64 * 100.0 / count as f64);
	}
}

/// Hit counts of a test run, bucketed by the true language.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HitReport {
	attempts: Vec<usize>,
	hits: Vec<usize>,
}

impl HitReport {
	/// Creates an empty report for `languages` languages.
	pub fn new(languages: usize) -> Self {
		Self { attempts: vec![0; languages], hits: vec![0; languages] }
	}

	/// Adds one outcome to the bucket of its true language.
	///
	/// Returns `false`, leaving the report untouched, if that language is
	/// outside the report.
	pub fn record(&mut self, outcome: TestOutcome) -> bool {
		let (Some(attempts), Some(hits)) =
			(self.attempts.get_mut(outcome.language), self.hits.get_mut(outcome.language))
		else {
			return false;
		};
		*attempts += 1;
		if outcome.hit() {
			*hits += 1;
		}
		true
	}

	/// Number of language buckets.
	pub fn languages(&self) -> usize {
		self.attempts.len()
	}

	/// Words drawn from `language`, 0 for an unknown language.
	pub fn attempts(&self, language: usize) -> usize {
		self.attempts.get(language).copied().unwrap_or_default()
	}

	/// Words of `language` classified correctly, 0 for an unknown language.
	pub fn hits(&self, language: usize) -> usize {
		self.hits.get(language).copied().unwrap_or_default()
	}

	/// Hit percentage of `language`, `None` if it was never drawn.
	pub fn rate(&self, language: usize) -> Option<f64> {
		percentage(self.hits(language), self.attempts(language))
	}

	/// Hit percentage over all languages, `None` without attempts.
	pub fn overall_rate(&self) -> Option<f64> {
		percentage(self.hits.iter().sum(), self.attempts.iter().sum())
	}
}

fn percentage(hits: usize, attempts: usize) -> Option<f64> {
	(attempts > 0).then(|| 100.0 * hits as f64 / attempts as f64)
}

/// Frozen sample of the corpus used for comparable hit rates.
///
/// Built once per tuning session; evaluating it twice against the same model
/// gives the same rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialPool {
	words: Vec<Vec<Word>>,
}

impl TrialPool {
	/// Draws `size / L` words (with replacement) from each of the `L` languages.
	pub fn build(corpus: &Corpus, size: usize, sampler: &mut Sampler) -> Result<Self> {
		let per_language = size / corpus.language_count();
		let mut words = Vec::with_capacity(corpus.language_count());
		for language in 0..corpus.language_count() {
			let drawn = (0..per_language)
				.map(|_| sampler.draw(corpus, language).map(<[Symbol]>::to_vec))
				.collect::<Result<Vec<Word>>>()?;
			words.push(drawn);
		}
		Ok(Self { words })
	}

	/// Number of frozen words.
	pub fn len(&self) -> usize {
		self.words.iter().map(Vec::len).sum()
	}

	/// Whether no word was frozen.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Frozen words of `language`.
	pub fn words(&self, language: usize) -> &[Word] {
		self.words.get(language).map_or(&[], Vec::as_slice)
	}

	/// Classifies every frozen word and returns the overall hit percentage.
	///
	/// # Errors
	/// Returns an error if the pool is empty.
	pub fn evaluate(&self, model: &LanguageModel) -> Result<f64> {
		let mut hits = 0;
		let mut amount = 0;
		for (language, words) in self.words.iter().enumerate() {
			for word in words {
				if argmax(&model.score(word)?) == language {
					hits += 1;
				}
				amount += 1;
			}
		}
		percentage(hits, amount).ok_or(LingoError::EmptyTrialPool)
	}
}
