//! Pipeline orchestration
//!
//! Opens the library, optionally imports new files, selects the items that
//! need analysis and runs them through the extractor in parallel. Each item
//! goes through the same steps: locate its cached output (running the
//! extractor if there is none), read the document, map it onto the target
//! fields and store the values.

use super::executor::{run_batch, BatchSummary};
use super::writer::{discard_output, Writer};
use crate::config::Settings;
use crate::discovery;
use crate::error::{Result, XtractorError};
use crate::extraction::{extract, load_document};
use crate::extractor::locate::extractor_file_name;
use crate::extractor::{find_extractor, CacheAddressor, Extractor, Invocation, ToolProfile};
use crate::library::{self, ItemStore, JsonLibrary, Query};
use crate::types::{Item, TargetTable};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pipeline result summary
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    /// Items selected for analysis
    pub total_items: usize,
    pub successful: usize,
    pub failed: usize,
    /// Files added to the library by `--import`
    pub imported: usize,
    /// Paths of the items that failed, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

/// Run the full pipeline against the configured library file
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let store = JsonLibrary::open(&settings.library)?;
    info!(
        "Opened library {} ({} items)",
        store.path().display(),
        store.len()
    );
    run_with_store(settings, &store)
}

/// Run the full pipeline against any item store
pub fn run_with_store(settings: &Settings, store: &dyn ItemStore) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();
    let mut result = PipelineResult::default();

    if let Some(dir) = &settings.import {
        let report = discovery::import(store, dir)?;
        info!(
            "Imported {} new files ({} already in library)",
            report.added, report.already_present
        );
        result.imported = report.added;
    }

    let query = Query::parse(&settings.query)?;
    let targets = settings.targets();
    let items = library::select(store, &query, &targets, settings.force)?;
    result.total_items = items.len();

    if settings.count_only {
        println!("{}", items.len());
        store.flush()?;
        return Ok(result);
    }

    if items.is_empty() {
        say(settings.quiet, "No items to process");
        store.flush()?;
        return Ok(result);
    }

    say(
        settings.quiet,
        &format!("Number of items selected: {}", items.len()),
    );

    let context = RunContext::new(settings, store)?;
    let summary = process_items(&context, items, settings.threads, settings.show_progress);

    context.finish(settings);
    store.flush()?;

    let summary = summary?;
    result.successful = summary.batch.succeeded();
    result.failed = summary.batch.failed();
    result.failures = summary.failures;

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(result)
}

/// Everything an item needs that is shared across the batch
pub struct RunContext<'a> {
    addressor: CacheAddressor,
    extractor: Extractor,
    profile: ToolProfile,
    low_level: TargetTable,
    high_level: TargetTable,
    writer: Writer<'a>,
    keep_output: bool,
    quiet: bool,
    /// Outputs to delete once the whole batch is done
    spent_outputs: Mutex<BTreeSet<PathBuf>>,
}

impl<'a> RunContext<'a> {
    pub fn new(settings: &Settings, store: &'a dyn ItemStore) -> Result<Self> {
        let addressor = CacheAddressor::new(&settings.output_dir);
        let profile = ToolProfile::new(settings.profile.clone(), addressor.profile_path()?);

        // A missing extractor only matters for items without cached output
        let extractor = match find_extractor(settings.extractor.as_deref()) {
            Ok(path) => {
                debug!("Using extractor {}", path.display());
                Extractor::new(path)
            }
            Err(e) => {
                warn!("{}", e);
                Extractor::new(
                    settings
                        .extractor
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(extractor_file_name())),
                )
            }
        };

        Ok(Self {
            addressor,
            extractor,
            profile,
            low_level: settings.low_level_targets.clone(),
            high_level: settings.high_level_targets.clone(),
            writer: Writer::new(store, settings.dry_run, settings.write_tags)
                .quiet(settings.quiet),
            keep_output: settings.keep_output,
            quiet: settings.quiet,
            spent_outputs: Mutex::new(BTreeSet::new()),
        })
    }

    /// Analyse one item and store the results
    ///
    /// Returns the number of fields set on the item.
    pub fn process(&self, mut item: Item) -> Result<usize> {
        if !item.path.is_file() {
            return Err(XtractorError::not_found("Input file", &item.path));
        }

        let output = self.addressor.address_for(&item)?;
        if !output.exists() {
            let profile = self.profile.ensure()?;
            match self.extractor.invoke(&item.path, &output, profile) {
                Ok(Invocation::Ran { exit_code, .. }) => {
                    debug!("Extractor finished with {:?} for {}", exit_code, item.path.display())
                }
                Ok(Invocation::Cached) => {}
                // the missing output below is what fails the item
                Err(e @ XtractorError::Process { .. }) => warn!("{}", e),
                Err(e) => return Err(e),
            }
        }

        let doc = load_document(&output)?;
        let low = extract(&doc, &self.low_level);
        let high = extract(&doc, &self.high_level);
        let fields = low.merge(high);

        let changed = self.writer.apply(&mut item, &fields)?;
        say(
            self.quiet,
            &format!("Analysed {} ({} fields)", item.path.display(), changed),
        );

        // items sharing a cache id may still need this output
        if !self.keep_output && !self.writer.is_dry_run() {
            if let Ok(mut spent) = self.spent_outputs.lock() {
                spent.insert(output);
            }
        }

        Ok(changed)
    }

    /// Batch-end cleanup
    pub fn finish(&self, settings: &Settings) {
        if !settings.keep_profile {
            self.profile.remove();
        }
        let spent = match self.spent_outputs.lock() {
            Ok(mut spent) => std::mem::take(&mut *spent),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for output in &spent {
            discard_output(output);
        }
    }
}

/// Batch outcome with failures resolved to item paths
pub struct ProcessSummary {
    pub batch: BatchSummary<usize>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Run every item through `context` with bounded concurrency
pub fn process_items(
    context: &RunContext<'_>,
    items: Vec<Item>,
    threads: usize,
    show_progress: bool,
) -> Result<ProcessSummary> {
    let paths: Vec<PathBuf> = items.iter().map(|i| i.path.clone()).collect();
    let analysis_start = Instant::now();

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(items.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let batch = run_batch(
        items,
        threads,
        |item| context.process(item),
        |completed, _total| {
            if let Some(ref pb) = progress_bar {
                pb.set_position(completed as u64);
            }
        },
    )?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Analysis complete");
    }

    let failures: Vec<(PathBuf, String)> = batch
        .failures
        .iter()
        .map(|f| {
            let path = paths.get(f.index).cloned().unwrap_or_default();
            if f.recoverable {
                warn!("Skipping {}: {}", path.display(), f.error);
            } else {
                error!("Failed {}: {}", path.display(), f.error);
            }
            (path, f.error.clone())
        })
        .collect();

    let elapsed = analysis_start.elapsed().as_secs_f64();
    info!(
        "Analysis completed in {:.2}s ({:.1} items/sec)",
        elapsed,
        if elapsed > 0.0 {
            batch.total as f64 / elapsed
        } else {
            0.0
        }
    );

    Ok(ProcessSummary { batch, failures })
}

/// Per-item and progress messages drop to debug level in quiet mode
fn say(quiet: bool, message: &str) {
    if quiet {
        debug!("{}", message);
    } else {
        info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cli, Config};
    use crate::library::MemoryStore;
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    fn settings_for(output_dir: &Path) -> Settings {
        let cli = Cli {
            library: Some(output_dir.join("library.json")),
            quiet: true,
            ..Cli::default()
        };
        let yaml = format!(
            "output_path: {}\nessentia_extractor: {}\n",
            output_dir.display(),
            output_dir.join("no-such-extractor").display()
        );
        let config = Config::from_yaml(Some(yaml.as_str())).unwrap();
        Settings::resolve(&cli, &config).unwrap()
    }

    fn analysis_doc() -> serde_json::Value {
        json!({
            "rhythm": {"bpm": 127.6, "danceability": 1.2, "beats_count": 400},
            "highlevel": {
                "gender": {"value": "female", "all": {"female": 0.8, "male": 0.2}},
                "mood_sad": {"all": {"sad": 0.1}}
            }
        })
    }

    /// Audio files plus pre-populated cache entries, so no extractor is run
    fn seed(dir: &Path, store: &MemoryStore, settings: &Settings, count: u64) -> Vec<Item> {
        let addressor = CacheAddressor::new(&settings.output_dir);
        (0..count)
            .map(|n| {
                let path = dir.join(format!("track{}.mp3", n));
                fs::write(&path, b"audio").unwrap();
                let item = store.add(Item::new(0, path)).unwrap();
                let output = addressor.address_for(&item).unwrap();
                fs::write(&output, analysis_doc().to_string()).unwrap();
                item
            })
            .collect()
    }

    #[test]
    fn test_cached_items_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.write_tags = false;
        let store = MemoryStore::new();
        let items = seed(dir.path(), &store, &settings, 3);

        let result = run_with_store(&settings, &store).unwrap();
        assert_eq!(result.total_items, 3);
        assert_eq!(result.successful, 3);
        assert_eq!(result.failed, 0);

        let stored = store.get(items[0].id).unwrap();
        assert_eq!(stored.get("bpm"), Some(&json!(128)));
        assert_eq!(stored.get("gender"), Some(&json!("female")));
        assert_eq!(stored.get("mood_sad"), Some(&json!(0.1)));
        assert!(!stored.is_set("mood_happy"));
    }

    #[test]
    fn test_missing_input_fails_only_that_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.write_tags = false;
        let store = MemoryStore::new();
        let items = seed(dir.path(), &store, &settings, 3);
        fs::remove_file(&items[1].path).unwrap();

        let result = run_with_store(&settings, &store).unwrap();
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].0, items[1].path);
    }

    #[test]
    fn test_missing_extractor_fails_uncached_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.write_tags = false;
        let store = MemoryStore::new();
        let path = dir.path().join("uncached.mp3");
        fs::write(&path, b"audio").unwrap();
        store.add(Item::new(0, path)).unwrap();

        let result = run_with_store(&settings, &store).unwrap();
        assert_eq!(result.failed, 1);
        assert!(result.failures[0].1.contains("Extractor not found"));
    }

    #[test]
    fn test_shared_cache_entry_survives_until_batch_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.write_tags = false;
        settings.keep_output = false;
        settings.threads = 2;
        let store = MemoryStore::new();

        let mut shared = Vec::new();
        for n in 0..6 {
            let path = dir.path().join(format!("copy{}.mp3", n));
            fs::write(&path, b"audio").unwrap();
            let mut item = Item::new(0, path);
            item.set("mb_trackid", json!("same-recording"));
            shared.push(store.add(item).unwrap());
        }
        let output = CacheAddressor::new(&settings.output_dir)
            .address_for(&shared[0])
            .unwrap();
        fs::write(&output, analysis_doc().to_string()).unwrap();

        let result = run_with_store(&settings, &store).unwrap();

        assert_eq!(result.successful, 6, "failures: {:?}", result.failures);
        assert_eq!(result.failed, 0);
        for item in &shared {
            assert_eq!(store.get(item.id).unwrap().get("bpm"), Some(&json!(128)));
        }
        assert!(!output.exists(), "cache entry should be removed after the batch");
    }

    #[test]
    fn test_invalid_query_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.query = vec![":value".to_string()];
        let store = MemoryStore::new();

        let err = run_with_store(&settings, &store).unwrap_err();
        assert!(matches!(err, XtractorError::Query(_)));
    }

    #[test]
    fn test_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(dir.path());
        let store = MemoryStore::new();

        let result = run_with_store(&settings, &store).unwrap();
        assert_eq!(result, PipelineResult::default());
    }
}
