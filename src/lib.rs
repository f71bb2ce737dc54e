//! xtractor - Essentia-powered audio descriptors for a music library
//!
//! Runs the Essentia `streaming_extractor_music` binary over library items
//! that are missing descriptors (bpm, danceability, moods, ...), maps the
//! JSON it produces onto library fields and stores them, optionally writing
//! the values into the audio files' tags as well.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing, YAML configuration and runtime settings
//! - `library`: Item store, query language and work set selection
//! - `discovery`: Importing audio files into the library
//! - `extractor`: Cache addressing, profile generation and running the extractor
//! - `extraction`: Mapping extractor output onto target fields
//! - `pipeline`: Bounded parallel processing and result storage
//! - `tags`: Reading and writing audio file tags
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use xtractor::config::{Cli, Config, Settings};
//! use xtractor::pipeline;
//!
//! let cli = Cli::parse();
//! let config = Config::load(cli.config.as_deref()).expect("Invalid configuration");
//! let settings = Settings::resolve(&cli, &config).expect("Invalid settings");
//! let result = pipeline::run(&settings).expect("Analysis failed");
//! println!("Processed {} items", result.successful);
//! ```

pub mod about;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod extractor;
pub mod library;
pub mod pipeline;
pub mod tags;
pub mod types;

// Re-export key types at crate root
pub use error::{FieldError, Result, XtractorError};
pub use types::{ExtractionResult, Item, TargetFieldSpec, TargetTable, ValueType};
