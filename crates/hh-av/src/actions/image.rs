//! Still image transcode to WebP using ffmpeg.

use std::path::Path;

use hh_core::config::ConversionConfig;

use crate::command::ToolCommand;
use crate::staging::StagedOutput;
use crate::tools::ToolRegistry;

/// Build the ffmpeg argument list for an image transcode at a fixed
/// quality setting.
pub fn image_args(input: &Path, output: &Path, config: &ConversionConfig) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vcodec".to_string(),
        config.image_codec.clone(),
        "-q:v".to_string(),
        config.image_quality.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Transcode the image at `input` to `output` through a staged file.
pub async fn transcode_image(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
) -> hh_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    let stage = StagedOutput::new(output)?;

    tracing::info!(
        "image transcode: {:?} -> {:?} (codec={}, quality={})",
        input,
        output,
        config.image_codec,
        config.image_quality,
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(config.timeout());
    cmd.args(image_args(input, stage.path(), config));
    cmd.execute().await?;

    stage.commit()?;
    Ok(())
}
