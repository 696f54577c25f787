use std::fs;
use std::path::{Path, PathBuf};
use std::{env, io};

use crate::error::{LingoError, Result};

/// Reads a UTF-8 text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_lines<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let contents = read_text(&filename)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a whole UTF-8 text file, attaching the path to any error.
pub(crate) fn read_text<P: AsRef<Path>>(filename: P) -> Result<String> {
	let path = filename.as_ref();
	fs::read_to_string(path).map_err(|e| LingoError::io(path, e))
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `wordbooks/ger.txt` + `"bin"` → `wordbooks/ger.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		LingoError::io(
			input_path,
			io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"),
		)
	})?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists the stems of all files with a given extension in a directory.
///
/// `wordbooks/ger.txt` and `wordbooks/fre.txt` yield `["fre", "ger"]`.
/// Subdirectories are ignored; the result is sorted.
pub(crate) fn list_stems<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<String>> {
	let dir = normalize_folder(dir);
	let mut stems = Vec::new();

	for entry in fs::read_dir(&dir).map_err(|e| LingoError::io(&dir, e))? {
		let path = entry.map_err(|e| LingoError::io(&dir, e))?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(stem) = path.file_stem() {
				stems.push(stem.to_string_lossy().to_string());
			}
		}
	}

	stems.sort();
	Ok(stems)
}
