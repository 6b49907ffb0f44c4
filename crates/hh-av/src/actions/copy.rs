//! Pass-through copy that preserves the source's timestamps.

use std::path::Path;

use filetime::FileTime;

use crate::staging::StagedOutput;

/// Copy `input` to `output` byte for byte, carrying over the source's access
/// and modification times so later staleness checks compare equal.
pub async fn copy_preserving_mtime(input: &Path, output: &Path) -> hh_core::Result<()> {
    let stage = StagedOutput::new(output)?;

    tracing::info!("copy: {:?} -> {:?}", input, output);

    tokio::fs::copy(input, stage.path()).await?;

    let meta = tokio::fs::metadata(input).await?;
    filetime::set_file_times(
        stage.path(),
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )?;

    stage.commit()?;
    Ok(())
}
