//! Positional n-gram language identification library.
//!
//! This crate provides a word-level language recognizer including:
//! - Alphabet tables and text symbolization
//! - Parallel wordbook loading with an on-disk cache
//! - A positional n-gram model with per pattern length scaling
//! - Random training/testing harnesses and scale tuning
//! - Internal utilities for I/O and path handling
//!
//! [`recognizer::Recognizer`] ties everything together; the lower level
//! modules can be used on their own.

/// Character tables and conversion of text into symbol sequences.
pub mod alphabet;

/// Training and testing on free text and text files.
pub mod batch;

/// TOML settings.
pub mod config;

/// Symbolized wordbooks, one per language.
pub mod corpus;

/// Error types shared by every module.
pub mod error;

/// Core n-gram model, training and scoring.
pub mod model;

/// High-level recognizer interface.
pub mod recognizer;

/// Random sampling, bulk train/test and trial pools.
pub mod sampling;

/// Per pattern length scale search.
pub mod tuner;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use config::Config;
pub use corpus::available_wordbooks;
pub use error::{LingoError, Result};
pub use recognizer::{Recognizer, Verdict};
