//! Shared test harness for integration tests.
//!
//! [`SyncHarness`] lays out an intake directory, an output directory and a
//! metadata path inside a temporary directory and builds a [`SyncEngine`]
//! over them. Conversions go through [`FakeConverter`] unless a test asks
//! for the real ffmpeg-backed converter.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use filetime::FileTime;
use tempfile::TempDir;

use hh_av::ToolRegistry;
use hh_core::config::{ConversionConfig, SyncConfig};
use hh_sync::{ConversionFailure, ConversionJob, Converter, FfmpegConverter, RunReport, SyncEngine};

/// Converter that writes the source's bytes to the output, or fails for
/// the configured source names.
#[derive(Default)]
pub struct FakeConverter {
    fail: BTreeSet<String>,
    converted: Mutex<Vec<String>>,
}

impl FakeConverter {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Source names passed to `convert`, in call order.
    pub fn converted(&self) -> Vec<String> {
        self.converted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Converter for FakeConverter {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn convert(&self, job: &ConversionJob) -> Result<(), ConversionFailure> {
        let name = job.source.file_name().unwrap().to_string_lossy().into_owned();
        self.converted.lock().unwrap().push(name.clone());

        if self.fail.contains(&name) {
            return Err(ConversionFailure::NonZeroExit {
                tool: "fake".into(),
                code: Some(1),
            });
        }

        let bytes = tokio::fs::read(&job.source).await?;
        tokio::fs::write(&job.output, bytes).await?;
        Ok(())
    }
}

pub struct SyncHarness {
    pub root: TempDir,
    pub config: SyncConfig,
    pub converter: Arc<FakeConverter>,
}

impl SyncHarness {
    pub fn new() -> Self {
        Self::with_converter(FakeConverter::default())
    }

    pub fn with_converter(converter: FakeConverter) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = SyncConfig {
            intake_dir: root.path().join("processed"),
            output_dir: root.path().join("sources"),
            metadata_path: root.path().join("metadata.json"),
            ..SyncConfig::default()
        };
        std::fs::create_dir_all(&config.intake_dir).unwrap();

        Self {
            root,
            config,
            converter: Arc::new(converter),
        }
    }

    pub fn intake(&self) -> &Path {
        &self.config.intake_dir
    }

    pub fn output(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn metadata_path(&self) -> &Path {
        &self.config.metadata_path
    }

    /// Create an intake file with the given modification time.
    pub fn add_source(&self, name: &str, mtime_secs: i64) -> PathBuf {
        let path = self.intake().join(name);
        std::fs::write(&path, format!("source {name}")).unwrap();
        set_mtime(&path, mtime_secs);
        path
    }

    pub fn remove_source(&self, name: &str) {
        std::fs::remove_file(self.intake().join(name)).unwrap();
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(self.config.clone(), self.converter.clone()).with_concurrency(4)
    }

    /// Engine using the real converter with no ffmpeg available: copies work,
    /// transcodes fail with a missing tool.
    pub fn engine_without_ffmpeg(&self) -> SyncEngine {
        let converter = FfmpegConverter::new(Arc::new(ToolRegistry::empty()), ConversionConfig::default());
        SyncEngine::new(self.config.clone(), Arc::new(converter))
    }

    pub async fn run(&self) -> RunReport {
        self.engine().run().await.unwrap()
    }

    /// Sorted names of the files in the output directory.
    pub fn outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output())
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn metadata(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.metadata_path()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    pub fn metadata_bytes(&self) -> Vec<u8> {
        std::fs::read(self.metadata_path()).unwrap()
    }
}

pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

pub fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&std::fs::metadata(path).unwrap())
}
