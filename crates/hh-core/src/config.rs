//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! sync, conversion, tools, and server sections. Every section defaults to
//! the historical behaviour so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::normalize_extension;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub conversion: ConversionConfig,
    pub tools: ToolsConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None`, the file does not exist, or it cannot be parsed.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: the file must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let video: BTreeSet<String> = self
            .sync
            .video_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
        let image: BTreeSet<String> = self
            .sync
            .image_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        for ext in video.intersection(&image) {
            warnings.push(format!(
                "extension '{ext}' is listed as both video and image; it will be treated as video"
            ));
        }

        for ext in &self.sync.passthrough_extensions {
            let ext = normalize_extension(ext);
            if !image.contains(&ext) {
                warnings.push(format!(
                    "sync.passthrough_extensions '{ext}' is not an image extension and will be ignored"
                ));
            }
        }

        if self.sync.intake_dir == self.sync.output_dir {
            warnings.push("sync.intake_dir and sync.output_dir are the same directory".into());
        }

        if self.conversion.concurrency == Some(0) {
            warnings.push("conversion.concurrency is 0; one worker will be used".into());
        }

        if self.conversion.timeout_secs == 0 {
            warnings.push("conversion.timeout_secs is 0; every conversion will time out".into());
        }

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Directories, metadata location, and the extension sets driving
/// classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub intake_dir: PathBuf,
    pub output_dir: PathBuf,
    pub metadata_path: PathBuf,
    pub video_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    /// Image extensions copied verbatim instead of transcoded.
    pub passthrough_extensions: Vec<String>,
    /// Tags written into a metadata document that has none.
    pub default_tags: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            intake_dir: PathBuf::from("processed"),
            output_dir: PathBuf::from("sources"),
            metadata_path: PathBuf::from("metadata.json"),
            video_extensions: to_strings(&["mp4", "webm", "mov", "avi", "mkv", "mpeg", "ts"]),
            image_extensions: to_strings(&["jpg", "jpeg", "png", "gif", "webp"]),
            passthrough_extensions: to_strings(&["gif", "webp"]),
            default_tags: to_strings(&["funny", "cute"]),
        }
    }
}

/// Encoder settings for the external transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub video_codec: String,
    pub video_crf: u32,
    pub image_codec: String,
    pub image_quality: u32,
    /// Per-invocation time budget in seconds.
    pub timeout_secs: u64,
    /// Parallel conversions; `None` means one per CPU.
    pub concurrency: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            video_codec: "libvpx-vp9".into(),
            video_crf: 35,
            image_codec: "libwebp".into(),
            image_quality: 80,
            timeout_secs: 3600,
            concurrency: None,
        }
    }
}

impl ConversionConfig {
    /// The per-invocation timeout as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}

/// HTTP collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8007,
            static_dir: PathBuf::from("."),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
