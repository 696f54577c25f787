//! Interactive text menu.
//!
//! Every prompt reads one line. Unparsable answers are asked again,
//! end of input leaves the menu. Recognizer errors are printed and the
//! menu goes on; only I/O errors on the terminal abort it.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use rs_lingo_core::Recognizer;
use rs_lingo_core::tuner::ScalePoint;

const MAIN_MENU: &str = "1 Train for x-times\n\
	2 Test success rate for x-words\n\
	3 Ask for language of a single word\n\
	4 Get chances for word-slice\n\
	5 Pattern scaling, etc.\n\
	6 Exit\n";

const SCALING_MENU: &str = "1 Evaluate and set optimal scaling\n\
	2 Print success per scaling steps\n\
	3 Manually set scaling values\n\
	4 Train on custom file\n\
	5 Test on custom file\n\
	6 Return\n";

enum Step {
	Continue,
	Leave,
}

/// Interactive text menu over a [`Recognizer`].
///
/// Reads choices line by line from `input` and writes prompts and
/// results to `output`.
pub struct Menu<'a, R, W> {
	recognizer: &'a mut Recognizer,
	input: R,
	output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
	/// Creates a menu borrowing `recognizer` for its whole run.
	pub fn new(recognizer: &'a mut Recognizer, input: R, output: W) -> Self {
		Self { recognizer, input, output }
	}

	/// Runs the main menu until "Exit" or end of input.
	pub fn run(&mut self) -> io::Result<()> {
		loop {
			write!(self.output, "{MAIN_MENU}")?;
			let Some(choice) = self.ask::<String>("Decision: ")? else {
				return Ok(());
			};
			writeln!(self.output)?;

			let step = match choice.as_str() {
				"1" => self.train()?,
				"2" => self.test()?,
				"3" => self.classify()?,
				"4" => self.slice()?,
				"5" => self.scaling()?,
				"6" => return Ok(()),
				_ => {
					writeln!(self.output, "\nPlease repeat!\n")?;
					Step::Continue
				}
			};
			if let Step::Leave = step {
				return Ok(());
			}
		}
	}

	fn scaling(&mut self) -> io::Result<Step> {
		loop {
			write!(self.output, "{SCALING_MENU}")?;
			let Some(choice) = self.ask::<String>("Decision: ")? else {
				return Ok(Step::Leave);
			};
			writeln!(self.output)?;

			let step = match choice.as_str() {
				"1" => self.auto_tune()?,
				"2" => self.scan()?,
				"3" => self.set_scales()?,
				"4" => self.train_on_file()?,
				"5" => self.test_on_file()?,
				"6" => return Ok(Step::Continue),
				_ => {
					writeln!(self.output, "\nPlease repeat!\n")?;
					Step::Continue
				}
			};
			if let Step::Leave = step {
				return Ok(Step::Leave);
			}
		}
	}

	fn train(&mut self) -> io::Result<Step> {
		let Some(count) = self.ask::<usize>("How many random words to train on? : ")? else {
			return Ok(Step::Leave);
		};
		let result = self.recognizer.train_bulk(count);
		self.report(result)?;
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn test(&mut self) -> io::Result<Step> {
		let Some(count) = self.ask::<usize>("How many random words to test on? : ")? else {
			return Ok(Step::Leave);
		};
		let result = self.recognizer.test_bulk(count);
		if let Some(report) = self.report(result)? {
			for (i, language) in self.recognizer.languages().iter().enumerate() {
				match report.rate(i) {
					Some(rate) => writeln!(self.output, "{language} success: {rate}%")?,
					None => writeln!(self.output, "{language} success: untested")?,
				}
			}
			if let Some(rate) = report.overall_rate() {
				writeln!(self.output, "Overall: {rate}%")?;
			}
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn classify(&mut self) -> io::Result<Step> {
		let Some(word) = self.ask::<String>("Which word to test on? : ")? else {
			return Ok(Step::Leave);
		};
		writeln!(self.output)?;
		let result = self.recognizer.classify(&word);
		if let Some(verdict) = self.report(result)? {
			let languages = self.recognizer.languages();
			for (language, rating) in languages.iter().zip(&verdict.ratings) {
				writeln!(self.output, "{language} success: {}%", rating * 100.0)?;
			}
			writeln!(self.output, "\n I choose {} !", languages[verdict.choice])?;
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn slice(&mut self) -> io::Result<Step> {
		let Some(slice) = self.ask::<String>("Which slice to test on? : ")? else {
			return Ok(Step::Leave);
		};
		let Some(position) = self.ask::<usize>("At which position? : ")? else {
			return Ok(Step::Leave);
		};
		writeln!(self.output)?;
		let result = self.recognizer.inspect_slice(&slice, position);
		match self.report(result)? {
			Some(Some(chances)) => {
				for (language, chance) in self.recognizer.languages().iter().zip(&chances) {
					writeln!(self.output, "{language} chance: {}%", chance * 100.0)?;
				}
			}
			Some(None) => writeln!(self.output, "slice not available!")?,
			None => {}
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn auto_tune(&mut self) -> io::Result<Step> {
		let Some((size, len_min, len_max, step)) = self.ask_tuning()? else {
			return Ok(Step::Leave);
		};
		let result = self.recognizer.auto_tune(size, len_min, len_max, step);
		if let Some(trace) = self.report(result)? {
			self.print_trace(&trace)?;
			for pattern_len in len_min..=len_max {
				let scale = self.recognizer.scale(pattern_len);
				if let Some(scale) = self.report(scale)? {
					writeln!(self.output, "{pattern_len}-patterns   {scale}-scaled")?;
				}
			}
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn scan(&mut self) -> io::Result<Step> {
		let Some((size, len_min, len_max, step)) = self.ask_tuning()? else {
			return Ok(Step::Leave);
		};
		let Some(scale_min) = self.ask::<f64>("Starting scale size : ")? else {
			return Ok(Step::Leave);
		};
		let Some(scale_max) = self.ask::<f64>("Ending scale size : ")? else {
			return Ok(Step::Leave);
		};
		let result = self.recognizer.scan(size, len_min, len_max, step, scale_min, scale_max);
		if let Some(trace) = self.report(result)? {
			self.print_trace(&trace)?;
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn set_scales(&mut self) -> io::Result<Step> {
		let Some(len_min) = self.ask::<usize>("Minimum pattern : ")? else {
			return Ok(Step::Leave);
		};
		let Some(len_max) = self.ask::<usize>("Maximum pattern : ")? else {
			return Ok(Step::Leave);
		};
		for pattern_len in len_min..=len_max {
			let old = self.recognizer.scale(pattern_len);
			let Some(old) = self.report(old)? else {
				break;
			};
			let question = format!("Value for {pattern_len}-size patterns (old: {old} ) : ");
			let Some(value) = self.ask::<f64>(&question)? else {
				return Ok(Step::Leave);
			};
			let result = self.recognizer.set_scale(pattern_len, value);
			self.report(result)?;
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn train_on_file(&mut self) -> io::Result<Step> {
		let Some(path) = self.ask::<String>("File? : ")? else {
			return Ok(Step::Leave);
		};
		writeln!(self.output, "Possible lang index")?;
		let languages: Vec<String> = self
			.recognizer
			.languages()
			.iter()
			.enumerate()
			.map(|(i, language)| format!("{i} {language}"))
			.collect();
		writeln!(self.output, "{}", languages.join(" "))?;
		let Some(language) = self.ask::<usize>("Lang index? : ")? else {
			return Ok(Step::Leave);
		};
		writeln!(self.output)?;

		let result = self.recognizer.train_on_file(&path, language);
		if let Some(trained) = self.report(result)? {
			writeln!(self.output, "{trained} words trained")?;
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	fn test_on_file(&mut self) -> io::Result<Step> {
		let Some(path) = self.ask::<String>("File? : ")? else {
			return Ok(Step::Leave);
		};
		writeln!(self.output)?;

		let result = self.recognizer.test_on_file(&path);
		match self.report(result)? {
			Some(Some(verdict)) => {
				writeln!(self.output, "{} words tested\n", verdict.words)?;
				let languages = self.recognizer.languages();
				for (language, rating) in languages.iter().zip(&verdict.ratings) {
					writeln!(self.output, "{language} success: {}%", rating * 100.0)?;
				}
				writeln!(self.output, "\n I choose {} !", languages[verdict.choice])?;
			}
			Some(None) => writeln!(self.output, "No word of the file could be tested")?,
			None => {}
		}
		writeln!(self.output)?;
		Ok(Step::Continue)
	}

	/// Pool size, pattern range and step shared by both tuning entries.
	fn ask_tuning(&mut self) -> io::Result<Option<(usize, usize, usize, f64)>> {
		let Some(size) = self.ask::<usize>("Size of testing wordbook : ")? else {
			return Ok(None);
		};
		let Some(len_min) = self.ask::<usize>("Minimum pattern : ")? else {
			return Ok(None);
		};
		let Some(len_max) = self.ask::<usize>("Maximum pattern : ")? else {
			return Ok(None);
		};
		let Some(step) = self.ask::<f64>("Step size : ")? else {
			return Ok(None);
		};
		Ok(Some((size, len_min, len_max, step)))
	}

	fn print_trace(&mut self, trace: &[ScalePoint]) -> io::Result<()> {
		let mut previous = None;
		for point in trace {
			if previous.is_some_and(|len| len != point.pattern_len) {
				writeln!(self.output)?;
			}
			writeln!(self.output, "{} at {}  {}-patterns", point.hit_rate, point.scale, point.pattern_len)?;
			previous = Some(point.pattern_len);
		}
		writeln!(self.output)
	}

	/// Prints `question` and parses the next line, asking again until it
	/// parses. Returns `None` at end of input.
	fn ask<T: FromStr>(&mut self, question: &str) -> io::Result<Option<T>> {
		loop {
			write!(self.output, "{question}")?;
			self.output.flush()?;

			let mut line = String::new();
			if self.input.read_line(&mut line)? == 0 {
				return Ok(None);
			}
			let answer = line.trim();
			if answer.is_empty() {
				continue;
			}
			match answer.parse() {
				Ok(value) => return Ok(Some(value)),
				Err(_) => writeln!(self.output, "\nPlease repeat!\n")?,
			}
		}
	}

	/// Prints a failed operation and hands back the successful value.
	fn report<T, E: Display>(&mut self, result: Result<T, E>) -> io::Result<Option<T>> {
		match result {
			Ok(value) => Ok(Some(value)),
			Err(e) => {
				writeln!(self.output, "Error: {e}")?;
				Ok(None)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rs_lingo_core::alphabet::{Alphabet, Symbolizer, END};
	use rs_lingo_core::corpus::{Corpus, Wordbook};
	use rs_lingo_core::Config;
	use std::io::Cursor;

	fn recognizer() -> Recognizer {
		let alphabet = Alphabet::from_text("a\nb\nc\n", "", "").unwrap();
		let corpus = Corpus::from_wordbooks(vec![
			Wordbook::new("left", vec![vec![1, END], vec![1, 1, END], vec![1, 3, 1, END]]),
			Wordbook::new("right", vec![vec![2, END], vec![2, 2, END], vec![2, 3, 2, END]]),
		])
		.unwrap();
		let config = Config {
			languages: vec!["left".to_owned(), "right".to_owned()],
			max_pattern_len: 2,
			seed: Some(4),
			..Config::default()
		};
		Recognizer::from_parts(config, Symbolizer::new(alphabet, 0, 0), corpus).unwrap()
	}

	fn session(recognizer: &mut Recognizer, script: &str) -> String {
		let mut output = Vec::new();
		Menu::new(recognizer, Cursor::new(script.as_bytes()), &mut output).run().unwrap();
		String::from_utf8(output).unwrap()
	}

	#[test]
	fn trains_then_classifies_a_word() {
		let mut recognizer = recognizer();
		let output = session(&mut recognizer, "1\n200\n3\naa\n6\n");
		assert!(output.contains("I choose left !"));
	}

	#[test]
	fn slice_chances_are_printed() {
		let mut recognizer = recognizer();
		let output = session(&mut recognizer, "1\n200\n4\nb\n1\n4\ncc\n1\n4\na\n0\n");
		assert!(output.contains("left chance: 0%"));
		assert!(output.contains("right chance: 100%"));
		assert!(output.contains("slice not available!"));
		assert!(output.contains("Error: slice position must start at 1"));
	}

	#[test]
	fn bad_answers_are_asked_again() {
		let mut recognizer = recognizer();
		let output = session(&mut recognizer, "9\n1\nmany\n0\n3\nazb\n");
		assert_eq!(output.matches("Please repeat!").count(), 2);
		assert!(output.contains("Error: unrecognized character 'z'"));
	}

	#[test]
	fn scales_are_set_manually() {
		let mut recognizer = recognizer();
		session(&mut recognizer, "5\n3\n1\n2\n2.5\n0.5\n6\n6\n");
		assert_eq!(recognizer.scale(1).unwrap(), 2.5);
		assert_eq!(recognizer.scale(2).unwrap(), 0.5);
	}

	#[test]
	fn scan_prints_every_step() {
		let mut recognizer = recognizer();
		let output = session(&mut recognizer, "1\n100\n5\n2\n10\n1\n1\n0.5\n0\n1\n6\n6\n");
		assert!(output.contains("at 0  1-patterns"));
		assert!(output.contains("at 0.5  1-patterns"));
		assert!(output.contains("at 1  1-patterns"));
		assert_eq!(recognizer.scale(1).unwrap(), 1.0);
	}

	#[test]
	fn bulk_test_prints_rates_per_language() {
		let mut recognizer = recognizer();
		let output = session(&mut recognizer, "1\n200\n2\n40\n");
		assert!(output.contains("Overall: 100%"));
		assert!(output.contains("left success: 100%"));
	}
}
