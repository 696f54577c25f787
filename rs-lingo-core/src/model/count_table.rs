use std::collections::HashMap;

use super::count_vector::CountVector;
use super::ngram::NGram;
use crate::alphabet::Symbol;

/// Positional n-gram counts.
///
/// Indexed first by the start position of the n-gram inside its word,
/// then by the n-gram itself. Positions are added as longer words are
/// observed; entries are created zeroed on first use and never removed.
#[derive(Clone, Debug)]
pub struct CountTable {
	languages: usize,
	positions: Vec<HashMap<NGram, CountVector>>,
}

impl CountTable {
	/// Creates an empty table for `languages` languages.
	///
	/// No position exists until the first observation.
	pub fn new(languages: usize) -> Self {
		Self { languages, positions: Vec::new() }
	}

	/// Number of languages every count vector holds.
	pub fn languages(&self) -> usize {
		self.languages
	}

	/// Number of positions that hold at least one entry slot.
	pub fn positions(&self) -> usize {
		self.positions.len()
	}

	/// Total number of (position, n-gram) entries.
	pub fn len(&self) -> usize {
		self.positions.iter().map(HashMap::len).sum()
	}

	/// Whether nothing was recorded yet.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Looks up the counts of `gram` starting at `position`.
	pub fn get(&self, position: usize, gram: &[Symbol]) -> Option<&CountVector> {
		self.positions.get(position)?.get(gram)
	}

	/// Records one observation of `gram` at `position` for the 0-based
	/// `language`.
	///
	/// # Notes
	/// - The key is only allocated when the n-gram is new at this position.
	/// - Counts are rescaled first when the total would overflow.
	pub fn record(&mut self, position: usize, gram: &[Symbol], language: usize) {
		let languages = self.languages;
		let grams = self.position_mut(position);
		match grams.get_mut(gram) {
			Some(counts) => counts.record(language),
			None => {
				let mut counts = CountVector::new(languages);
				counts.record(language);
				grams.insert(NGram::from(gram), counts);
			}
		}
	}

	/// Returns the counts of `gram` at `position`, creating a zeroed vector
	/// (and the position) if needed.
	///
	/// # Notes
	/// - Always builds an owned key; training goes through
	///   [`CountTable::record`] instead.
	pub fn entry(&mut self, position: usize, gram: &[Symbol]) -> &mut CountVector {
		let languages = self.languages;
		self.position_mut(position)
			.entry(NGram::from(gram))
			.or_insert_with(|| CountVector::new(languages))
	}

	fn position_mut(&mut self, position: usize) -> &mut HashMap<NGram, CountVector> {
		if position >= self.positions.len() {
			self.positions.resize_with(position + 1, HashMap::new);
		}
		&mut self.positions[position]
	}

	/// Iterates over every entry as `(position, n-gram, counts)`.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &NGram, &CountVector)> {
		self.positions
			.iter()
			.enumerate()
			.flat_map(|(position, grams)| grams.iter().map(move |(gram, counts)| (position, gram, counts)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn entry_creates_zeroed_vectors_lazily() {
		let mut table = CountTable::new(2);
		assert!(table.get(3, &[1, 2]).is_none());

		let vector = table.entry(3, &[1, 2]);
		assert_eq!(vector.total(), 0);
		assert_eq!(vector.languages(), 2);
		vector.record(1);

		assert_eq!(table.positions(), 4);
		assert_eq!(table.len(), 1);
		assert_eq!(table.get(3, &[1, 2]).map(CountVector::total), Some(1));
		assert!(table.get(2, &[1, 2]).is_none());
		assert!(table.get(10, &[1, 2]).is_none());
	}

	#[test]
	fn record_creates_then_updates_in_place() {
		let mut table = CountTable::new(3);
		table.record(2, &[4, 5], 1);
		table.record(2, &[4, 5], 1);
		table.record(2, &[4, 5], 2);

		assert_eq!(table.len(), 1);
		assert_eq!(table.positions(), 3);
		let counts = table.get(2, &[4, 5]).unwrap();
		assert_eq!(counts.total(), 3);
		assert_eq!(counts.per_language(), &[0, 2, 1]);
		assert!(table.get(0, &[4, 5]).is_none());
	}

	#[test]
	fn record_and_entry_share_vectors() {
		let mut table = CountTable::new(2);
		table.entry(0, &[1]).record(0);
		table.record(0, &[1], 1);
		assert_eq!(table.len(), 1);
		assert_eq!(table.get(0, &[1]).unwrap().per_language(), &[1, 1]);
	}

	#[test]
	fn iter_visits_every_entry_with_its_position() {
		let mut table = CountTable::new(1);
		table.entry(0, &[1]).record(0);
		table.entry(1, &[1]).record(0);
		table.entry(1, &[1, 0]).record(0);

		let mut seen: Vec<(usize, Vec<Symbol>)> =
			table.iter().map(|(p, g, _)| (p, g.symbols().to_vec())).collect();
		seen.sort();
		assert_eq!(seen, vec![(0, vec![1]), (1, vec![1]), (1, vec![1, 0])]);
	}
}
