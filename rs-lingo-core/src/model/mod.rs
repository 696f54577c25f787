//! Statistical core of the recognizer.
//!
//! - Positional n-gram keys (`NGram`)
//! - Overflow-safe observation counters (`CountVector`)
//! - The positional count table (`CountTable`)
//! - Per pattern length scales (`Scales`)
//! - Training and scoring (`LanguageModel`)

/// Variable-length n-gram keys.
pub mod ngram;

/// Per-language observation counters with overflow rescaling.
pub mod count_vector;

/// Position → n-gram → counts table.
///
/// Grows lazily, never shrinks.
pub mod count_table;

/// Per pattern length scale factors.
pub mod scales;

/// Training engine and inference engine over the count table.
pub mod language_model;

pub use count_table::CountTable;
pub use count_vector::{Count, CountVector};
pub use language_model::{argmax, LanguageModel, PatternLimit};
pub use ngram::NGram;
pub use scales::Scales;
