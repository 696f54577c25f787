//! Scale search over a frozen trial pool.
//!
//! Both searches work one pattern length at a time and measure every
//! candidate against the same [`TrialPool`], so rates are comparable.

use crate::error::{LingoError, Result};
use crate::model::LanguageModel;
use crate::sampling::TrialPool;

/// Hit rate measured for one scale of one pattern length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePoint {
	pub pattern_len: usize,
	pub scale: f64,
	/// Overall trial pool hit percentage.
	pub hit_rate: f64,
}

/// Raises each pattern length's scale by `step` while the hit rate strictly
/// improves, keeping the last improving value.
///
/// Lengths are processed from `len_min` to `len_max`, each on top of the
/// values already kept for shorter ones. Only upward moves are tried.
/// Returns every measured point, in order.
///
/// # Errors
/// Returns an error on an invalid length range, a non-positive step or an
/// empty pool.
pub fn auto_tune(
	model: &mut LanguageModel,
	pool: &TrialPool,
	len_min: usize,
	len_max: usize,
	step: f64,
) -> Result<Vec<ScalePoint>> {
	check_lengths(model, len_min, len_max)?;
	check_step(step)?;
	if pool.is_empty() {
		return Err(LingoError::EmptyTrialPool);
	}

	let mut trace = Vec::new();
	for pattern_len in len_min..=len_max {
		let mut best_scale = model.scales().get(pattern_len)?;
		let mut best_rate = pool.evaluate(model)?;
		trace.push(ScalePoint { pattern_len, scale: best_scale, hit_rate: best_rate });

		loop {
			let candidate = best_scale + step;
			model.set_scale(pattern_len, candidate)?;
			let hit_rate = pool.evaluate(model)?;
			trace.push(ScalePoint { pattern_len, scale: candidate, hit_rate });
			if hit_rate > best_rate {
				best_scale = candidate;
				best_rate = hit_rate;
			} else {
				break;
			}
		}

		model.set_scale(pattern_len, best_scale)?;
		log::info!("{pattern_len}-patterns {best_scale}-scaled ({best_rate:.2}%)");
	}
	Ok(trace)
}

/// Measures the hit rate of every scale from `scale_min` to `scale_max`
/// (in `step` increments) for each pattern length, then restores the
/// original scales.
///
/// # Errors
/// Returns an error on an invalid length range, a non-positive step, an
/// inverted scale range or an empty pool.
pub fn scan(
	model: &mut LanguageModel,
	pool: &TrialPool,
	len_min: usize,
	len_max: usize,
	step: f64,
	scale_min: f64,
	scale_max: f64,
) -> Result<Vec<ScalePoint>> {
	check_lengths(model, len_min, len_max)?;
	check_step(step)?;
	if !(scale_min.is_finite() && scale_max.is_finite()) || scale_min > scale_max {
		return Err(LingoError::Tuning(format!("invalid scale range {scale_min}..={scale_max}")));
	}
	if pool.is_empty() {
		return Err(LingoError::EmptyTrialPool);
	}

	// Absorbs rounding of the last step
	let limit = scale_max + step * 1e-9;
	let mut trace = Vec::new();
	for pattern_len in len_min..=len_max {
		let original = model.scales().get(pattern_len)?;
		let mut result = Ok(());

		for k in 0_u64.. {
			let scale = scale_min + k as f64 * step;
			if scale > limit {
				break;
			}
			result = model
				.set_scale(pattern_len, scale)
				.and_then(|()| pool.evaluate(model))
				.map(|hit_rate| trace.push(ScalePoint { pattern_len, scale, hit_rate }));
			if result.is_err() {
				break;
			}
		}

		model.set_scale(pattern_len, original)?;
		result?;
	}
	Ok(trace)
}

fn check_lengths(model: &LanguageModel, len_min: usize, len_max: usize) -> Result<()> {
	let max = model.pattern_len();
	if len_min == 0 || len_min > max {
		return Err(LingoError::PatternLength { len: len_min, max });
	}
	if len_max < len_min || len_max > max {
		return Err(LingoError::PatternLength { len: len_max, max });
	}
	Ok(())
}

fn check_step(step: f64) -> Result<()> {
	if !step.is_finite() || step <= 0.0 {
		return Err(LingoError::Tuning(format!("step must be a positive number, got {step}")));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::alphabet::{Word, END};
	use crate::corpus::{Corpus, Wordbook};
	use crate::model::PatternLimit;
	use crate::sampling::Sampler;
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	/// Two languages sharing symbols with different preferences.
	fn overlapping() -> Corpus {
		let mut rng = StdRng::seed_from_u64(17);
		let mut book = |language: &str, favourite: u8| {
			let words = (0..150)
				.map(|_| {
					let len = rng.random_range(1..6);
					let mut word: Word = (0..len)
						.map(|_| if rng.random_bool(0.6) { favourite } else { rng.random_range(1..=4) })
						.collect();
					word.push(END);
					word
				})
				.collect();
			Wordbook::new(language, words)
		};
		let first = book("first", 1);
		let second = book("second", 2);
		Corpus::from_wordbooks(vec![first, second]).unwrap()
	}

	fn trained(corpus: &Corpus) -> LanguageModel {
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(3), corpus.longest_word()).unwrap();
		let mut sampler = Sampler::seeded(23);
		sampler.train_random_bulk(&mut model, corpus, 120, 1000).unwrap();
		model
	}

	#[test]
	fn auto_tune_never_keeps_a_worse_scale() {
		let corpus = overlapping();
		let mut model = trained(&corpus);
		let pool = TrialPool::build(&corpus, 200, &mut Sampler::seeded(29)).unwrap();

		let trace = auto_tune(&mut model, &pool, 1, 3, 0.5).unwrap();

		for pattern_len in 1..=3 {
			let points: Vec<&ScalePoint> = trace.iter().filter(|p| p.pattern_len == pattern_len).collect();
			let baseline = points[0].hit_rate;
			let kept = model.scales().get(pattern_len).unwrap();
			let kept_point = points.iter().find(|p| p.scale == kept).unwrap();
			assert!(kept_point.hit_rate >= baseline);

			// strictly improving run, then one non-improving probe
			let (last, run) = points.split_last().unwrap();
			assert!(run.windows(2).all(|w| w[1].hit_rate > w[0].hit_rate));
			assert!(last.hit_rate <= run.last().unwrap().hit_rate);
		}

		let best_of_last = trace
			.iter()
			.filter(|p| p.pattern_len == 3)
			.map(|p| p.hit_rate)
			.fold(f64::MIN, f64::max);
		assert_eq!(pool.evaluate(&model).unwrap(), best_of_last);
	}

	#[test]
	fn auto_tune_keeps_scale_without_improvement() {
		let corpus = overlapping();
		// untrained: every word scores the prior, rates never move
		let mut model = LanguageModel::new(2, PatternLimit::Fixed(2), corpus.longest_word()).unwrap();
		let pool = TrialPool::build(&corpus, 20, &mut Sampler::seeded(1)).unwrap();

		let trace = auto_tune(&mut model, &pool, 1, 2, 0.25).unwrap();

		assert_eq!(trace.len(), 4);
		assert_eq!(model.scales().as_slice(), &[1.0, 1.0]);
	}

	#[test]
	fn scan_restores_scales() {
		let corpus = overlapping();
		let mut model = trained(&corpus);
		model.set_scale(2, 1.3).unwrap();
		let before = model.scales().clone();
		let pool = TrialPool::build(&corpus, 50, &mut Sampler::seeded(2)).unwrap();

		let trace = scan(&mut model, &pool, 1, 2, 0.5, 0.0, 2.0).unwrap();

		assert_eq!(model.scales(), &before);
		assert_eq!(trace.len(), 10);
		let scales: Vec<f64> = trace.iter().filter(|p| p.pattern_len == 2).map(|p| p.scale).collect();
		assert_eq!(scales, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
	}

	#[test]
	fn scan_includes_the_upper_bound_despite_rounding() {
		let corpus = overlapping();
		let mut model = trained(&corpus);
		let pool = TrialPool::build(&corpus, 10, &mut Sampler::seeded(3)).unwrap();

		let trace = scan(&mut model, &pool, 1, 1, 0.1, 0.0, 0.3).unwrap();
		assert_eq!(trace.len(), 4);
	}

	#[test]
	fn parameters_are_validated() {
		let corpus = overlapping();
		let mut model = trained(&corpus);
		let pool = TrialPool::build(&corpus, 10, &mut Sampler::seeded(4)).unwrap();
		let empty = TrialPool::default();

		assert!(matches!(auto_tune(&mut model, &pool, 0, 2, 0.1), Err(LingoError::PatternLength { .. })));
		assert!(matches!(auto_tune(&mut model, &pool, 1, 4, 0.1), Err(LingoError::PatternLength { .. })));
		assert!(matches!(auto_tune(&mut model, &pool, 3, 2, 0.1), Err(LingoError::PatternLength { .. })));
		assert!(matches!(auto_tune(&mut model, &pool, 1, 2, 0.0), Err(LingoError::Tuning(_))));
		assert!(matches!(auto_tune(&mut model, &pool, 1, 2, f64::NAN), Err(LingoError::Tuning(_))));
		assert!(matches!(auto_tune(&mut model, &empty, 1, 2, 0.1), Err(LingoError::EmptyTrialPool)));
		assert!(matches!(scan(&mut model, &pool, 1, 2, 0.1, 2.0, 1.0), Err(LingoError::Tuning(_))));
		assert!(matches!(scan(&mut model, &empty, 1, 2, 0.1, 0.0, 1.0), Err(LingoError::EmptyTrialPool)));
		assert_eq!(model.scales().as_slice(), &[1.0, 1.0, 1.0]);
	}
}
