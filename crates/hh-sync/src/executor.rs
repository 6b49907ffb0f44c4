//! Per-file conversion.
//!
//! The [`Converter`] trait is the seam between the sync engine and the
//! external transcoder. [`FfmpegConverter`] is the production implementation;
//! tests substitute their own. A conversion either succeeds or returns a
//! [`ConversionFailure`] that the engine records against that one file.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use hh_av::ToolRegistry;
use hh_core::config::ConversionConfig;
use hh_core::Category;

/// Why a single conversion did not produce its output.
#[derive(Debug, thiserror::Error)]
pub enum ConversionFailure {
    /// The transcoder executable is not installed.
    #[error("{tool} not found; is it installed and in PATH?")]
    ToolMissing { tool: String },

    /// The transcoder ran and reported failure.
    #[error("{tool} exited with {}", describe_exit(.code))]
    NonZeroExit { tool: String, code: Option<i32> },

    /// The transcoder outlived its time budget and was killed.
    #[error("{tool} timed out after {after:?}")]
    TimedOut { tool: String, after: Duration },

    /// Reading the source or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

impl From<hh_core::Error> for ConversionFailure {
    fn from(err: hh_core::Error) -> Self {
        match err {
            hh_core::Error::ToolMissing { tool } => Self::ToolMissing { tool },
            hh_core::Error::ToolExit { tool, code, message } => {
                if !message.is_empty() {
                    tracing::debug!("{tool} stderr: {message}");
                }
                Self::NonZeroExit { tool, code }
            }
            hh_core::Error::ToolTimeout { tool, timeout } => Self::TimedOut {
                tool,
                after: timeout,
            },
            hh_core::Error::Io { source } => Self::Io(source),
            other => Self::Io(io::Error::other(other.to_string())),
        }
    }
}

/// One unit of work: produce `output` from `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub category: Category,
}

/// Produces the output for a single source file.
///
/// Implementations create or overwrite exactly `job.output` and nothing
/// else.
#[async_trait]
pub trait Converter: Send + Sync {
    /// A short, human-readable name for this converter.
    fn name(&self) -> &'static str;

    /// Produce `job.output` from `job.source`.
    async fn convert(&self, job: &ConversionJob) -> Result<(), ConversionFailure>;
}

/// Converter backed by the ffmpeg CLI (and a plain copy for pass-through
/// files).
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    tools: Arc<ToolRegistry>,
    config: ConversionConfig,
}

impl FfmpegConverter {
    pub fn new(tools: Arc<ToolRegistry>, config: ConversionConfig) -> Self {
        Self { tools, config }
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn convert(&self, job: &ConversionJob) -> Result<(), ConversionFailure> {
        match job.category {
            Category::Video => {
                hh_av::transcode_video(&self.tools, &job.source, &job.output, &self.config)
                    .await?
            }
            Category::ConvertibleImage => {
                hh_av::transcode_image(&self.tools, &job.source, &job.output, &self.config)
                    .await?
            }
            Category::PassThrough => hh_av::copy_preserving_mtime(&job.source, &job.output).await?,
            Category::Ignored => {
                return Err(ConversionFailure::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a media file", job.source.display()),
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn converter(tools: ToolRegistry) -> FfmpegConverter {
        FfmpegConverter::new(Arc::new(tools), ConversionConfig::default())
    }

    #[test]
    fn failure_from_core_error() {
        let f = ConversionFailure::from(hh_core::Error::tool_missing("ffmpeg"));
        assert!(matches!(f, ConversionFailure::ToolMissing { ref tool } if tool == "ffmpeg"));

        let f = ConversionFailure::from(hh_core::Error::ToolExit {
            tool: "ffmpeg".into(),
            code: Some(187),
            message: "Conversion failed!".into(),
        });
        assert!(matches!(f, ConversionFailure::NonZeroExit { code: Some(187), .. }));
        assert_eq!(f.to_string(), "ffmpeg exited with status 187");

        let f = ConversionFailure::from(hh_core::Error::ToolTimeout {
            tool: "ffmpeg".into(),
            timeout: Duration::from_secs(2),
        });
        assert_eq!(f.to_string(), "ffmpeg timed out after 2s");

        let f = ConversionFailure::from(hh_core::Error::tool("staging", "rename failed"));
        assert!(matches!(f, ConversionFailure::Io(_)));
    }

    #[tokio::test]
    async fn video_without_ffmpeg_is_tool_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cat.mp4");
        fs::write(&source, b"video").unwrap();

        let job = ConversionJob {
            source,
            output: dir.path().join("cat.webm"),
            category: Category::Video,
        };
        let result = converter(ToolRegistry::empty()).convert(&job).await;
        assert!(matches!(result, Err(ConversionFailure::ToolMissing { .. })));
        assert!(!job.output.exists());
    }

    #[tokio::test]
    async fn passthrough_copies_without_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("party.gif");
        fs::write(&source, b"GIF89a").unwrap();
        let out_dir = dir.path().join("sources");
        fs::create_dir(&out_dir).unwrap();

        let job = ConversionJob {
            source,
            output: out_dir.join("party.gif"),
            category: Category::PassThrough,
        };
        converter(ToolRegistry::empty()).convert(&job).await.unwrap();
        assert_eq!(fs::read(&job.output).unwrap(), b"GIF89a");
    }

    #[tokio::test]
    async fn ignored_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let job = ConversionJob {
            source: dir.path().join("notes.txt"),
            output: dir.path().join("notes.txt.out"),
            category: Category::Ignored,
        };
        let result = converter(ToolRegistry::empty()).convert(&job).await;
        assert!(matches!(result, Err(ConversionFailure::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn image_through_fake_ffmpeg_lands_at_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffmpeg");
        // Writes to the last argument, like ffmpeg does with its output path.
        fs::write(&fake, "#!/bin/sh\nfor last; do :; done\nprintf webp > \"$last\"\n").unwrap();
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();

        let source = dir.path().join("dog.png");
        fs::write(&source, b"png").unwrap();
        let job = ConversionJob {
            source,
            output: dir.path().join("dog.webp"),
            category: Category::ConvertibleImage,
        };

        converter(ToolRegistry::empty().with_tool("ffmpeg", &fake))
            .convert(&job)
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&job.output).unwrap(), "webp");
    }
}
