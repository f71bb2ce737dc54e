//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// xtractor - get more out of your music
///
/// Runs the Essentia music extractor over library items that are missing
/// descriptors (bpm, danceability, moods, ...) and stores the results back
/// into the library and, optionally, into the audio files' tags.
#[derive(Parser, Debug, Default)]
#[command(name = "xtractor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Library query (e.g. `artist:daft` or `genre:` for unset genre)
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Configuration file (defaults to the per-user config.yml)
    #[arg(short, long, value_name = "FILE", env = "XTRACTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Library file
    #[arg(short, long, value_name = "FILE")]
    pub library: Option<PathBuf>,

    /// Add the audio files under DIR to the library before analysing
    #[arg(long, value_name = "DIR")]
    pub import: Option<PathBuf>,

    /// Show the extracted values but do not update the library
    #[arg(short, long)]
    pub dry_run: bool,

    /// Write the extracted values to the media files [config: write]
    #[arg(short, long, value_name = "BOOL")]
    pub write: Option<bool>,

    /// Number of items analysed in parallel, 0 for one per CPU [config: threads]
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Analyse items even if all required fields are already set
    #[arg(short, long)]
    pub force: bool,

    /// Only print the number of items that would be analysed
    #[arg(long)]
    pub count_only: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_query() {
        let cli = Cli::try_parse_from([
            "xtractor", "-d", "-f", "-t", "4", "--write", "false", "artist:daft", "genre:",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.force);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.write, Some(false));
        assert_eq!(cli.query, vec!["artist:daft", "genre:"]);
    }

    #[test]
    fn test_defaults_defer_to_config() {
        let cli = Cli::try_parse_from(["xtractor"]).unwrap();
        assert_eq!(cli.write, None);
        assert_eq!(cli.threads, None);
        assert!(cli.query.is_empty());
        assert_eq!(cli.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = Cli::try_parse_from(["xtractor", "-vv", "-q"]).unwrap();
        assert_eq!(cli.log_level(), tracing::Level::ERROR);
    }
}
