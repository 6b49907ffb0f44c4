//! The sync engine: one complete run over the intake directory.
//!
//! A run has three phases that never overlap:
//!
//! 1. Per-file work. Every classified source is planned and, if needed,
//!    converted. Files are independent, so this phase runs on a bounded
//!    number of tokio tasks.
//! 2. Reconciliation. Once every task has finished, outputs that are not in
//!    the final set are deleted.
//! 3. Metadata. The document is reconciled against the final set and
//!    written once.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use hh_av::ToolRegistry;
use hh_core::config::{Config, SyncConfig};
use hh_core::{Category, Classifier, OutputClass, SourceFile};

use crate::executor::{ConversionJob, Converter, FfmpegConverter};
use crate::metadata::MetadataStore;
use crate::planner::{self, Decision};
use crate::reconcile;
use crate::stats::{FileOutcome, Outcome, RunStatistics};

/// A source that will be considered by a run, paired with its output name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScannedSource {
    source: SourceFile,
    output: String,
}

#[derive(Debug, Default)]
struct IntakeScan {
    sources: Vec<ScannedSource>,
    collisions: Vec<String>,
}

/// One source as seen by [`SyncEngine::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: String,
    pub output: String,
    pub category: Category,
    pub decision: Decision,
}

/// What a run would do, computed without modifying anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub files: Vec<PlannedFile>,
    /// Sources whose metadata could not be read, with the error.
    pub unreadable: Vec<(String, String)>,
    /// Outputs that would be deleted.
    pub stale: Vec<String>,
    /// Sources skipped because an earlier source claims the same output.
    pub collisions: Vec<String>,
    /// The intake directory does not exist yet.
    pub intake_missing: bool,
}

impl SyncPlan {
    /// Files that would be converted or copied.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.decision.needs_processing())
    }

    /// The output set the run would publish if every conversion succeeded.
    pub fn expected_outputs(&self) -> BTreeSet<String> {
        self.files.iter().map(|f| f.output.clone()).collect()
    }
}

/// Everything a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One entry per considered source, in source name order.
    pub outcomes: Vec<FileOutcome>,
    pub stats: RunStatistics,
    /// Outputs removed by reconciliation.
    pub deleted: Vec<String>,
    /// Outputs that should have been removed but could not be.
    pub delete_failures: Vec<(String, String)>,
    pub collisions: Vec<String>,
    /// The intake directory was missing and has been created; nothing else
    /// happened.
    pub intake_created: bool,
    /// The published output set, as written to the metadata document.
    pub files: Vec<String>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }
}

/// Drives a sync run.
pub struct SyncEngine {
    config: SyncConfig,
    classifier: Classifier,
    converter: Arc<dyn Converter>,
    store: MetadataStore,
    concurrency: usize,
}

impl SyncEngine {
    /// Create an engine with a custom converter. Work runs one file at a
    /// time until [`Self::with_concurrency`] says otherwise.
    pub fn new(config: SyncConfig, converter: Arc<dyn Converter>) -> Self {
        Self {
            classifier: Classifier::from_config(&config),
            store: MetadataStore::from_config(&config),
            config,
            converter,
            concurrency: 1,
        }
    }

    /// Create the production engine: ffmpeg conversions, one worker per CPU
    /// unless configured otherwise.
    pub fn from_config(config: &Config, tools: Arc<ToolRegistry>) -> Self {
        let converter = Arc::new(FfmpegConverter::new(tools, config.conversion.clone()));
        let concurrency = config
            .conversion
            .concurrency
            .unwrap_or_else(num_cpus::get);
        Self::new(config.sync.clone(), converter).with_concurrency(concurrency)
    }

    /// Maximum number of conversions in flight. Clamped to at least one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Work out what [`Self::run`] would do without touching the filesystem.
    pub fn plan(&self) -> hh_core::Result<SyncPlan> {
        if !self.config.intake_dir.is_dir() {
            return Ok(SyncPlan {
                intake_missing: true,
                ..SyncPlan::default()
            });
        }

        let scan = self.scan_intake()?;
        let mut plan = SyncPlan {
            collisions: scan.collisions,
            ..SyncPlan::default()
        };

        for item in scan.sources {
            let Some(class) = item.source.category.output_class() else {
                continue;
            };
            let (source, output) = self.paths(&item);
            match planner::decide(&source, &output, class) {
                Ok(decision) => plan.files.push(PlannedFile {
                    source: item.source.name,
                    output: item.output,
                    category: item.source.category,
                    decision,
                }),
                Err(e) => plan.unreadable.push((item.source.name, e.to_string())),
            }
        }

        plan.stale = reconcile::stale_outputs(&self.config.output_dir, &plan.expected_outputs())?;
        Ok(plan)
    }

    /// Run one complete sync.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: the output or intake directory
    /// cannot be created or listed, or the metadata document cannot be read
    /// or written. Per-file failures are recorded in the report.
    pub async fn run(&self) -> hh_core::Result<RunReport> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        if !self.config.intake_dir.is_dir() {
            tokio::fs::create_dir_all(&self.config.intake_dir).await?;
            warn!(
                "Intake directory {} did not exist and was created; add files and re-run",
                self.config.intake_dir.display()
            );
            return Ok(RunReport {
                intake_created: true,
                ..RunReport::default()
            });
        }

        let scan = self.scan_intake()?;
        let document = self.store.load()?;
        info!(
            "Syncing {} source file(s) with up to {} worker(s)",
            scan.sources.len(),
            self.concurrency
        );

        let outcomes = self.process_all(scan.sources).await?;

        // Every per-file task has finished; the final set is complete.
        let expected: BTreeSet<String> = outcomes
            .iter()
            .filter(|o| o.outcome.is_published())
            .map(|o| o.output.clone())
            .collect();

        let removal = reconcile::remove_stale(&self.config.output_dir, &expected)?;

        let document = document.reconcile(&expected);
        self.store.persist(&document)?;

        let stats = RunStatistics::from_outcomes(&outcomes, removal.deleted_count());
        info!(
            "Sync complete: {} output(s), {} processed, {} deleted, {} failed",
            stats.total_outputs,
            stats.processed(),
            stats.deleted,
            stats.failed
        );

        Ok(RunReport {
            outcomes,
            stats,
            deleted: removal.deleted,
            delete_failures: removal.failed,
            collisions: scan.collisions,
            intake_created: false,
            files: document.files,
        })
    }

    async fn process_all(&self, sources: Vec<ScannedSource>) -> hh_core::Result<Vec<FileOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(sources.len());

        for item in sources {
            let Some(class) = item.source.category.output_class() else {
                continue;
            };
            let (source, output) = self.paths(&item);
            let job = ConversionJob {
                source,
                output,
                category: item.source.category,
            };

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| hh_core::Error::Internal(format!("worker pool closed: {e}")))?;
            let converter = self.converter.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                process_file(converter.as_ref(), &job, class).await
            });

            handles.push((item, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (item, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                warn!(file = %item.source.name, error = %e, "Worker task failed");
                Outcome::Failed {
                    reason: format!("worker task failed: {e}"),
                }
            });
            outcomes.push(FileOutcome {
                source: item.source.name,
                output: item.output,
                category: item.source.category,
                outcome,
            });
        }

        Ok(outcomes)
    }

    /// List the intake directory, classify each file, and resolve output
    /// name collisions. Sources come back sorted by name.
    fn scan_intake(&self) -> hh_core::Result<IntakeScan> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.config.intake_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Error reading intake directory entry");
                    continue;
                }
            };
            if entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(file = ?name, "Skipping source with non UTF-8 name"),
            }
        }
        names.sort();

        let mut scan = IntakeScan::default();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();

        for name in names {
            let source = self.classifier.source(&name);
            let Some(output) = source.output_name() else {
                debug!(file = %name, "Ignoring unsupported file");
                continue;
            };

            if let Some(owner) = claimed.get(&output) {
                warn!(
                    file = %name,
                    output = %output,
                    owner = %owner,
                    "Skipping source: output name already claimed"
                );
                scan.collisions.push(name);
                continue;
            }

            claimed.insert(output.clone(), name);
            scan.sources.push(ScannedSource { source, output });
        }

        Ok(scan)
    }

    fn paths(&self, item: &ScannedSource) -> (PathBuf, PathBuf) {
        (
            self.config.intake_dir.join(&item.source.name),
            self.config.output_dir.join(&item.output),
        )
    }
}

/// Plan and, if needed, convert one file. Never fails; problems become
/// [`Outcome::Failed`].
async fn process_file(converter: &dyn Converter, job: &ConversionJob, class: OutputClass) -> Outcome {
    let name = job.source.display();

    let decision = match planner::decide(&job.source, &job.output, class) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(file = %name, error = %e, "Cannot read source");
            return Outcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    if !decision.needs_processing() {
        debug!(file = %name, "Up to date");
        return Outcome::UpToDate;
    }

    match converter.convert(job).await {
        Ok(()) => {
            let outcome = if decision.output_existed() {
                Outcome::Updated
            } else {
                Outcome::Added
            };
            info!(
                file = %name,
                output = %job.output.display(),
                category = %job.category,
                "{}",
                if decision.output_existed() { "Updated" } else { "Added" }
            );
            outcome
        }
        Err(e) => {
            warn!(file = %name, error = %e, "Conversion failed; skipping");
            Outcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
