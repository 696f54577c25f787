use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::alphabet::{Symbolizer, Word, FAIL};
use crate::config::Config;
use crate::error::{LingoError, Result, SymbolizeError};
use crate::io::{build_output_path, list_stems, read_lines};

/// File of the data directory listing characters no alphabet table knows,
/// one per line, rewritten on every load that finds any.
pub const UNIDENTIFIED_FILE: &str = "unidentified.txt";

/// Largest wordbook the sampler can index.
pub const MAX_WORDBOOK_SIZE: usize = u32::MAX as usize;

/// Symbolized words of one language.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Wordbook {
	language: String,
	words: Vec<Word>,
}

impl Wordbook {
	/// Wraps already symbolized words.
	pub fn new(language: &str, words: Vec<Word>) -> Self {
		Self { language: language.to_owned(), words }
	}

	/// Wordbook name, e.g. `fre`.
	pub fn language(&self) -> &str {
		&self.language
	}

	/// Words in file order.
	pub fn words(&self) -> &[Word] {
		&self.words
	}

	/// Number of words.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	/// Whether the wordbook holds no word.
	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}
}

/// Result of symbolizing the lines of one wordbook.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
struct Conversion {
	words: Vec<Word>,
	discarded: usize,
	unidentified: BTreeSet<char>,
}

impl Conversion {
	fn append(&mut self, mut other: Conversion) {
		self.words.append(&mut other.words);
		self.discarded += other.discarded;
		self.unidentified.append(&mut other.unidentified);
	}
}

/// On-disk form of a symbolized wordbook.
///
/// `fingerprint` is the serialized symbolizer; a cache built with other
/// alphabet tables or length bounds is ignored.
#[derive(Serialize, Deserialize)]
struct WordbookCache {
	fingerprint: Vec<u8>,
	conversion: Conversion,
}

/// All loaded wordbooks, indexed by language.
///
/// # Invariants
/// - at least one wordbook
/// - every wordbook holds between 1 and [`MAX_WORDBOOK_SIZE`] words
#[derive(Clone, Debug)]
pub struct Corpus {
	wordbooks: Vec<Wordbook>,
	longest_word: usize,
	discarded: usize,
	unidentified: BTreeSet<char>,
}

impl Corpus {
	/// Loads and symbolizes every wordbook listed in `config`.
	///
	/// Each file is read once, split into chunks and symbolized on worker
	/// threads. With `cache_wordbooks`, the result is stored as
	/// `<language>.bin` and reused while it is newer than the wordbook and
	/// was built with the same symbolizer.
	///
	/// # Errors
	/// Returns an error if a wordbook cannot be read, ends up empty, or is
	/// too large for the sampler.
	pub fn load(config: &Config, symbolizer: &Symbolizer) -> Result<Self> {
		let symbolizer = Arc::new(symbolizer.clone());
		let mut wordbooks = Vec::with_capacity(config.languages.len());
		let mut discarded = 0;
		let mut unidentified = BTreeSet::new();

		for language in &config.languages {
			let path = config.wordbook_path(language);
			let mut conversion = load_wordbook(&path, &symbolizer, config.cache_wordbooks)?;
			log::info!("Language {} has {} words", language, conversion.words.len());

			discarded += conversion.discarded;
			unidentified.append(&mut conversion.unidentified);
			wordbooks.push(Wordbook::new(language, conversion.words));
		}

		if discarded > 0 {
			log::warn!("{discarded} words were discarded for unknown characters or invalid length");
		}
		if !unidentified.is_empty() {
			let list: String = unidentified.iter().map(|c| format!("{c} ")).collect();
			log::warn!("Unidentified characters: {}", list.trim_end());
			let path = config.data_dir.join(UNIDENTIFIED_FILE);
			if let Err(e) = write_unidentified(&path, &unidentified) {
				log::warn!("Could not write unidentified characters: {e}");
			}
		}

		let mut corpus = Self::from_wordbooks(wordbooks)?;
		corpus.discarded = discarded;
		corpus.unidentified = unidentified;
		Ok(corpus)
	}

	/// Builds a corpus from already symbolized wordbooks.
	///
	/// # Errors
	/// Returns an error if there is no wordbook, a wordbook is empty or too
	/// large, or a word is empty or contains [`FAIL`].
	pub fn from_wordbooks(wordbooks: Vec<Wordbook>) -> Result<Self> {
		if wordbooks.is_empty() {
			return Err(LingoError::Config("at least one language is required".to_owned()));
		}

		let mut longest_word = 0;
		for wordbook in &wordbooks {
			check_capacity(wordbook.language(), wordbook.len())?;
			for word in wordbook.words() {
				if word.is_empty() {
					return Err(LingoError::EmptySequence);
				}
				if word.contains(&FAIL) {
					return Err(LingoError::FailedSequence);
				}
				longest_word = longest_word.max(word.len());
			}
		}

		Ok(Self { wordbooks, longest_word, discarded: 0, unidentified: BTreeSet::new() })
	}

	/// Number of wordbooks.
	pub fn language_count(&self) -> usize {
		self.wordbooks.len()
	}

	/// Wordbook names, by index.
	pub fn languages(&self) -> impl Iterator<Item = &str> {
		self.wordbooks.iter().map(Wordbook::language)
	}

	/// Name of the wordbook at `index`.
	pub fn language(&self, index: usize) -> Option<&str> {
		self.wordbooks.get(index).map(Wordbook::language)
	}

	/// Wordbook at `index`, `None` past the last one.
	pub fn wordbook(&self, index: usize) -> Option<&Wordbook> {
		self.wordbooks.get(index)
	}

	/// Every wordbook, in load order.
	pub fn wordbooks(&self) -> &[Wordbook] {
		&self.wordbooks
	}

	/// Total word count over all languages.
	pub fn word_count(&self) -> usize {
		self.wordbooks.iter().map(Wordbook::len).sum()
	}

	/// Length of the longest word, terminator included.
	pub fn longest_word(&self) -> usize {
		self.longest_word
	}

	/// Number of wordbook lines rejected by the symbolizer.
	pub fn discarded(&self) -> usize {
		self.discarded
	}

	/// Characters that made wordbook lines fail to convert.
	pub fn unidentified(&self) -> &BTreeSet<char> {
		&self.unidentified
	}
}

/// Names of the wordbooks (`<name>.txt`) found in `dir`, sorted.
///
/// The unidentified characters file is not a wordbook and is left out.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn available_wordbooks<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
	let unidentified = Path::new(UNIDENTIFIED_FILE).file_stem();
	let mut stems = list_stems(dir, "txt")?;
	stems.retain(|stem| Some(std::ffi::OsStr::new(stem)) != unidentified);
	Ok(stems)
}

fn check_capacity(language: &str, size: usize) -> Result<()> {
	if size == 0 {
		return Err(LingoError::EmptyWordbook { language: language.to_owned() });
	}
	if size > MAX_WORDBOOK_SIZE {
		return Err(LingoError::WordbookTooLarge {
			language: language.to_owned(),
			size,
			max: MAX_WORDBOOK_SIZE,
		});
	}
	Ok(())
}

/// Loads a wordbook from its cache if usable, otherwise symbolizes the
/// text file (and refreshes the cache).
fn load_wordbook(path: &Path, symbolizer: &Arc<Symbolizer>, use_cache: bool) -> Result<Conversion> {
	let fingerprint = postcard::to_stdvec(symbolizer.as_ref())?;
	let cache_path = build_output_path(path, "bin")?;

	if use_cache && is_fresh(&cache_path, path) {
		match read_cache(&cache_path) {
			Ok(cache) if cache.fingerprint == fingerprint => {
				log::debug!("Using cached wordbook {}", cache_path.display());
				return Ok(cache.conversion);
			}
			Ok(_) => log::debug!("Cache {} was built with other settings", cache_path.display()),
			Err(e) => log::debug!("Ignoring cache {}: {e}", cache_path.display()),
		}
	}

	let conversion = symbolize_lines(read_lines(path)?, symbolizer)
		.ok_or_else(|| LingoError::io(path, io::Error::other("a symbolizer thread failed")))?;

	if !use_cache {
		return Ok(conversion);
	}
	let cache = WordbookCache { fingerprint, conversion };
	if let Err(e) = write_cache(&cache_path, &cache) {
		log::warn!("Could not write wordbook cache: {e}");
	}
	Ok(cache.conversion)
}

fn write_unidentified(path: &Path, unidentified: &BTreeSet<char>) -> Result<()> {
	let text: String = unidentified.iter().map(|c| format!("{c}\n")).collect();
	fs::write(path, text).map_err(|e| LingoError::io(path, e))
}

fn read_cache(path: &Path) -> Result<WordbookCache> {
	let bytes = fs::read(path).map_err(|e| LingoError::io(path, e))?;
	Ok(postcard::from_bytes(&bytes)?)
}

fn write_cache(path: &Path, cache: &WordbookCache) -> Result<()> {
	let bytes = postcard::to_stdvec(cache)?;
	fs::write(path, bytes).map_err(|e| LingoError::io(path, e))
}

/// Whether `cache` exists and is at least as recent as `source`.
fn is_fresh(cache: &Path, source: &Path) -> bool {
	let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
	match (modified(cache), modified(source)) {
		(Some(cache), Some(source)) => cache >= source,
		_ => false,
	}
}

/// Symbolizes lines in parallel chunks, keeping the line order.
///
/// Returns `None` if a worker died before reporting.
fn symbolize_lines(lines: Vec<String>, symbolizer: &Arc<Symbolizer>) -> Option<Conversion> {
	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks).max(1);

	let (tx, rx) = mpsc::channel();
	let mut spawned = 0;
	for (index, chunk) in lines.chunks(chunk_size).enumerate() {
		let tx = tx.clone();
		let chunk: Vec<String> = chunk.to_vec();
		let symbolizer = Arc::clone(symbolizer);

		thread::spawn(move || {
			// The receiver lives until every worker reported
			let _ = tx.send((index, symbolize_chunk(&chunk, &symbolizer)));
		});
		spawned += 1;
	}
	drop(tx);

	let mut partials: Vec<(usize, Conversion)> = rx.iter().collect();
	if partials.len() != spawned {
		return None;
	}
	partials.sort_by_key(|(index, _)| *index);

	let mut conversion = Conversion::default();
	for (_, partial) in partials {
		conversion.append(partial);
	}
	Some(conversion)
}

fn symbolize_chunk(lines: &[String], symbolizer: &Symbolizer) -> Conversion {
	let mut conversion = Conversion::default();
	for line in lines {
		let text = line.trim();
		if text.is_empty() {
			continue;
		}
		match symbolizer.symbolize(text, true) {
			Ok(word) => conversion.words.push(word),
			Err(SymbolizeError::Unrecognized(c)) => {
				conversion.unidentified.insert(c);
				conversion.discarded += 1;
			}
			Err(_) => conversion.discarded += 1,
		}
	}
	conversion
}
