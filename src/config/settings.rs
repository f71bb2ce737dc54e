//! Runtime configuration settings

use super::cli::Cli;
use super::file::Config;
use crate::error::{Result, XtractorError};
use crate::extractor::cache::DEFAULT_SUBDIR;
use crate::extractor::locate::project_dirs;
use crate::types::TargetTable;
use serde_yaml::Mapping;
use std::path::PathBuf;

/// Library file name used when none is configured
pub const DEFAULT_LIBRARY_FILE: &str = "library.json";

/// Runtime settings for the extraction pipeline
///
/// Built once at startup from the CLI and the configuration file and not
/// modified afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Library file
    pub library: PathBuf,
    /// Directory to import into the library before the run
    pub import: Option<PathBuf>,
    /// Query terms selecting the items to analyse
    pub query: Vec<String>,
    /// Extract and report but do not store anything
    pub dry_run: bool,
    /// Write extracted values into the media files
    pub write_tags: bool,
    /// Number of analysis worker threads (always >= 1)
    pub threads: usize,
    /// Analyse items whose required fields are all set
    pub force: bool,
    /// Only report how many items would be analysed
    pub count_only: bool,
    /// Show progress bars
    pub show_progress: bool,
    /// Quiet mode: per-item messages drop to debug level
    pub quiet: bool,
    /// Keep each item's analysis output after success
    pub keep_output: bool,
    /// Keep the generated extractor profile after the run
    pub keep_profile: bool,
    /// Analysis output and profile directory
    pub output_dir: PathBuf,
    /// Extractor binary from the configuration, if any
    pub extractor: Option<PathBuf>,
    /// Extractor profile settings
    pub profile: Mapping,
    pub low_level_targets: TargetTable,
    pub high_level_targets: TargetTable,
}

impl Settings {
    /// Combine CLI arguments with the loaded configuration
    ///
    /// CLI flags win over configuration values.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let library = match cli.library.clone().or_else(|| config.library.clone()) {
            Some(path) => path,
            None => default_library_path()?,
        };

        let quiet = cli.quiet || config.quiet;

        Ok(Self {
            library,
            import: cli.import.clone(),
            query: cli.query.clone(),
            dry_run: cli.dry_run || config.dry_run,
            write_tags: cli.write.unwrap_or(config.write),
            threads: resolve_threads(cli.threads.unwrap_or(config.threads)),
            force: cli.force || config.force,
            count_only: cli.count_only,
            show_progress: !quiet,
            quiet,
            keep_output: config.keep_output,
            keep_profile: config.keep_profiles,
            output_dir: config
                .output_path
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SUBDIR)),
            extractor: config.essentia_extractor.clone(),
            profile: config.extractor_profile.clone(),
            low_level_targets: config.low_level_table()?,
            high_level_targets: config.high_level_table()?,
        })
    }

    /// Low and high level targets merged, high level winning on collision
    pub fn targets(&self) -> TargetTable {
        TargetTable::merged(&self.low_level_targets, &self.high_level_targets)
    }
}

/// 0 means one worker per CPU
pub fn resolve_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get().max(1)
    } else {
        threads
    }
}

fn default_library_path() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DEFAULT_LIBRARY_FILE))
        .ok_or_else(|| {
            XtractorError::Config(
                "Could not determine a library location; pass --library".to_string(),
            )
        })
}
