use std::borrow::Borrow;
use std::fmt;

use crate::alphabet::Symbol;

/// A contiguous slice of a word, used as a count table key.
///
/// N-grams of every length share one map, so the key owns its symbols
/// and compares, orders and hashes by full content. `Hash` and `Eq` agree
/// with `[Symbol]`, which lets the table be queried with borrowed slices
/// without allocating.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NGram(Box<[Symbol]>);

impl NGram {
	/// The symbols of the slice, terminator included when the slice
	/// reaches the end of its word.
	pub fn symbols(&self) -> &[Symbol] {
		&self.0
	}

	/// The pattern length.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false` for n-grams built by the model.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<&[Symbol]> for NGram {
	fn from(symbols: &[Symbol]) -> Self {
		Self(symbols.into())
	}
}

impl Borrow<[Symbol]> for NGram {
	fn borrow(&self) -> &[Symbol] {
		&self.0
	}
}

impl fmt::Debug for NGram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NGram{:?}", &self.0)
	}
}
