//! Per-file outcomes and the statistics aggregated from them.

use std::fmt;

use serde::Serialize;

use hh_core::Category;

/// What happened to one source file during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The output did not exist and was produced.
    Added,
    /// The output existed and was produced again.
    Updated,
    /// The output was already current.
    UpToDate,
    /// Processing failed; the file is left out of this run's output set.
    Failed { reason: String },
}

impl Outcome {
    /// Whether the output belongs to this run's final output set.
    pub fn is_published(&self) -> bool {
        !matches!(self, Outcome::Failed { .. })
    }
}

/// The outcome of one source, keyed by its names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub source: String,
    pub output: String,
    pub category: Category,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Added/updated counters for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub added: usize,
    pub updated: usize,
}

impl CategoryCounts {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Added => self.added += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::UpToDate | Outcome::Failed { .. } => {}
        }
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub videos: CategoryCounts,
    pub images: CategoryCounts,
    /// Files copied unchanged (gif, webp).
    pub passthrough: CategoryCounts,
    pub up_to_date: usize,
    pub failed: usize,
    /// Size of the final output set.
    pub total_outputs: usize,
    pub deleted: usize,
}

impl RunStatistics {
    /// Aggregate `outcomes` into per-category counters.
    pub fn from_outcomes(outcomes: &[FileOutcome], deleted: usize) -> Self {
        let mut stats = Self {
            deleted,
            ..Self::default()
        };

        for file in outcomes {
            match file.outcome {
                Outcome::UpToDate => stats.up_to_date += 1,
                Outcome::Failed { .. } => stats.failed += 1,
                Outcome::Added | Outcome::Updated => {}
            }
            if file.outcome.is_published() {
                stats.total_outputs += 1;
            }

            let bucket = match file.category {
                Category::Video => &mut stats.videos,
                Category::ConvertibleImage => &mut stats.images,
                Category::PassThrough => &mut stats.passthrough,
                Category::Ignored => continue,
            };
            bucket.record(&file.outcome);
        }

        stats
    }

    /// Number of outputs produced this run.
    pub fn processed(&self) -> usize {
        [self.videos, self.images, self.passthrough]
            .iter()
            .map(|c| c.added + c.updated)
            .sum()
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total outputs: {}", self.total_outputs)?;
        writeln!(
            f,
            "Added: {} videos, {} images, {} passthrough",
            self.videos.added, self.images.added, self.passthrough.added
        )?;
        write!(
            f,
            "Updated: {} videos, {} images, {} passthrough",
            self.videos.updated, self.images.updated, self.passthrough.updated
        )?;
        if self.deleted > 0 {
            write!(f, "\nDeleted: {} stale output(s)", self.deleted)?;
        }
        if self.failed > 0 {
            write!(f, "\nFailed: {} file(s)", self.failed)?;
        }
        Ok(())
    }
}
