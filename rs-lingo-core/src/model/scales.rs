use crate::error::{LingoError, Result};

/// Per pattern length multipliers applied to rating deviations from 0.5.
///
/// Pattern lengths are 1-based in this API: `get(1)` is the scale of
/// single-symbol patterns.
#[derive(Clone, Debug, PartialEq)]
pub struct Scales {
	values: Vec<f64>,
}

impl Scales {
	/// Scale of a pattern length that was never tuned.
	pub const DEFAULT: f64 = 1.0;

	/// Creates `pattern_lengths` neutral scales.
	pub fn new(pattern_lengths: usize) -> Self {
		Self { values: vec![Self::DEFAULT; pattern_lengths] }
	}

	/// Longest pattern length with a scale.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Whether no pattern length has a scale.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Scale of `pattern_len`.
	///
	/// # Errors
	/// Returns an error if `pattern_len` is 0 or beyond [`Scales::len`].
	pub fn get(&self, pattern_len: usize) -> Result<f64> {
		self.check(pattern_len)?;
		Ok(self.values[pattern_len - 1])
	}

	/// Overrides the scale of `pattern_len`.
	///
	/// # Errors
	/// Returns an error if `pattern_len` is out of range or `value` is not finite.
	pub fn set(&mut self, pattern_len: usize, value: f64) -> Result<()> {
		self.check(pattern_len)?;
		if !value.is_finite() {
			return Err(LingoError::Tuning(format!("scale must be finite, got {value}")));
		}
		self.values[pattern_len - 1] = value;
		Ok(())
	}

	/// Grows to `pattern_lengths` entries, new ones neutral.
	pub(crate) fn ensure_len(&mut self, pattern_lengths: usize) {
		if pattern_lengths > self.values.len() {
			self.values.resize(pattern_lengths, Self::DEFAULT);
		}
	}

	/// Scales in pattern length order, index 0 holding length 1.
	pub fn as_slice(&self) -> &[f64] {
		&self.values
	}

	fn check(&self, pattern_len: usize) -> Result<()> {
		if pattern_len == 0 || pattern_len > self.values.len() {
			return Err(LingoError::PatternLength { len: pattern_len, max: self.values.len() });
		}
		Ok(())
	}
}
