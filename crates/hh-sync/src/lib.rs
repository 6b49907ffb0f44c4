//! # hh-sync
//!
//! The incremental synchronization engine.
//!
//! One run walks the intake directory once and, per source file, decides
//! whether its published output is missing or stale, produces it through a
//! [`Converter`], and records an [`Outcome`]. Only after every file has been
//! handled does the engine delete orphaned outputs and rewrite the metadata
//! document, so no deletion ever races an in-flight conversion.
//!
//! - [`planner`] -- existence and modification-time comparison.
//! - [`executor`] -- the [`Converter`] seam and its ffmpeg implementation.
//! - [`reconcile`] -- removal of outputs no longer backed by a source.
//! - [`metadata`] -- load, reconcile, and persist the metadata document.
//! - [`stats`] -- per-file outcomes and the aggregated [`RunStatistics`].
//! - [`engine`] -- [`SyncEngine`], which ties the above together.

pub mod engine;
pub mod executor;
pub mod metadata;
pub mod planner;
pub mod reconcile;
pub mod stats;

pub use engine::{PlannedFile, RunReport, SyncEngine, SyncPlan};
pub use executor::{ConversionFailure, ConversionJob, Converter, FfmpegConverter};
pub use metadata::{MetadataDocument, MetadataStore};
pub use planner::{needs_processing, Decision};
pub use reconcile::ReconcileReport;
pub use stats::{CategoryCounts, FileOutcome, Outcome, RunStatistics};
