//! Video transcode to a single video-only WebM output using ffmpeg.

use std::path::Path;

use hh_core::config::ConversionConfig;

use crate::command::ToolCommand;
use crate::staging::StagedOutput;
use crate::tools::ToolRegistry;

/// Build the ffmpeg argument list for a video transcode.
///
/// Quality is constant-rate (`-crf` with `-b:v 0`) and the audio stream is
/// dropped.
pub fn video_args(input: &Path, output: &Path, config: &ConversionConfig) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(input.to_string_lossy().into_owned());
    args.extend([
        "-vcodec".to_string(),
        config.video_codec.clone(),
        "-crf".to_string(),
        config.video_crf.to_string(),
        "-b:v".to_string(),
        "0".to_string(),
        "-an".to_string(),
    ]);
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Transcode `input` to `output`.
///
/// ffmpeg writes into a staged sibling of `output`; the previous output, if
/// any, is only replaced once ffmpeg exits successfully.
pub async fn transcode_video(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
) -> hh_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    let stage = StagedOutput::new(output)?;

    tracing::info!(
        "video transcode: {:?} -> {:?} (codec={}, crf={})",
        input,
        output,
        config.video_codec,
        config.video_crf,
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(config.timeout());
    cmd.args(video_args(input, stage.path(), config));
    cmd.execute().await?;

    stage.commit()?;
    Ok(())
}
