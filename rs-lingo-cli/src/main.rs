mod menu;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use rs_lingo_core::{available_wordbooks, Config, Recognizer};

use crate::menu::Menu;

#[derive(Parser, Debug)]
#[command(name = "rs-lingo")]
#[command(about = "Word-level language recognizer based on positional n-grams")]
struct Args {
	/// TOML configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Directory holding the `<language>.txt` wordbooks
	#[arg(short, long)]
	data_dir: Option<PathBuf>,

	/// Minimum length of wordbook words
	#[arg(long)]
	min_length: Option<usize>,

	/// Maximum length of wordbook words (0 = unlimited)
	#[arg(long)]
	max_length: Option<usize>,

	/// Maximum pattern length (0 = unlimited)
	#[arg(short = 'p', long)]
	max_pattern: Option<usize>,

	/// Comma separated wordbook names, e.g. `fre,ger,ita`
	#[arg(short, long, value_delimiter = ',')]
	languages: Option<Vec<String>>,

	/// Fixed seed for reproducible sampling
	#[arg(short, long)]
	seed: Option<u64>,

	/// Print the wordbooks found in the data directory and exit
	#[arg(long)]
	list: bool,
}

impl Args {
	/// Overrides file settings with the flags given on the command line.
	fn apply(&self, config: &mut Config) {
		if let Some(dir) = &self.data_dir {
			config.data_dir = dir.clone();
		}
		if let Some(min_length) = self.min_length {
			config.min_length = min_length;
		}
		if let Some(max_length) = self.max_length {
			config.max_length = max_length;
		}
		if let Some(max_pattern) = self.max_pattern {
			config.max_pattern_len = max_pattern;
		}
		if let Some(languages) = &self.languages {
			config.languages = languages.clone();
		}
		if self.seed.is_some() {
			config.seed = self.seed;
		}
	}
}

fn main() -> Result<(), Box<dyn Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => {
			log::info!("Loading configuration from {}", path.display());
			Config::load(path)?
		}
		None => Config::default(),
	};
	args.apply(&mut config);
	config.validate()?;

	if args.list {
		for stem in available_wordbooks(&config.data_dir)? {
			println!("{stem}");
		}
		return Ok(());
	}

	println!(
		"Language recognizer with stacked pattern lengths. Use 0 for unlimited values. \
		 The bigger the maximum pattern length, the more accurate and memory consuming \
		 the process will be.\n"
	);
	let mut recognizer = Recognizer::new(config)?;

	let stdin = io::stdin();
	let stdout = io::stdout();
	Menu::new(&mut recognizer, stdin.lock(), stdout.lock()).run()?;
	Ok(())
}
