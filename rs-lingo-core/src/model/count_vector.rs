/// Observation counter type.
pub type Count = u32;

/// Observation counts of one n-gram at one position.
///
/// Slot 0 holds the total, slots `1..=L` the per-language counts.
///
/// # Invariants
/// - `total == sum(per-language counts)`, also after [`CountVector::rescale`]
/// - the total never wraps: [`CountVector::record`] rescales first when the
///   next increment would overflow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountVector {
	counts: Box<[Count]>,
}

impl CountVector {
	/// Creates a zeroed vector for `languages` languages.
	pub fn new(languages: usize) -> Self {
		Self { counts: vec![0; languages + 1].into_boxed_slice() }
	}

	/// Builds a vector from per-language counts, deriving the total.
	///
	/// Returns `None` if the counts do not fit the counter type.
	pub fn from_counts(per_language: &[Count]) -> Option<Self> {
		let total = per_language.iter().try_fold(0 as Count, |sum, c| sum.checked_add(*c))?;
		let mut counts = Vec::with_capacity(per_language.len() + 1);
		counts.push(total);
		counts.extend_from_slice(per_language);
		Some(Self { counts: counts.into_boxed_slice() })
	}

	/// Occurrences over every language.
	pub fn total(&self) -> Count {
		self.counts[0]
	}

	/// Count for the 0-based `language`.
	pub fn count(&self, language: usize) -> Count {
		self.counts[language + 1]
	}

	/// Counts indexed by the 0-based language.
	pub fn per_language(&self) -> &[Count] {
		&self.counts[1..]
	}

	/// Number of language slots.
	pub fn languages(&self) -> usize {
		self.counts.len() - 1
	}

	/// Relative frequency of `language` among all observations.
	pub fn frequency(&self, language: usize) -> f64 {
		f64::from(self.count(language)) / f64::from(self.total())
	}

	/// Whether one more observation would overflow the total.
	pub fn would_overflow(&self) -> bool {
		self.total() == Count::MAX
	}

	/// Halves every language count (truncating) and recomputes the total.
	///
	/// Keeps the relative distribution roughly intact; truncation may drop
	/// the total slightly below half.
	pub fn rescale(&mut self) {
		let mut sum: Count = 0;
		for count in &mut self.counts[1..] {
			*count /= 2;
			sum += *count;
		}
		self.counts[0] = sum;
	}

	/// Records one observation for the 0-based `language`.
	pub fn record(&mut self, language: usize) {
		if self.would_overflow() {
			self.rescale();
		}
		self.counts[0] += 1;
		self.counts[language + 1] += 1;
	}
}
