//! JSON sidecar written next to a finished recording.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::capture_result::RecordingMetadata;
use crate::models::error::CaptureError;

/// `capture.wav` -> `capture.metadata.json`.
pub fn sidecar_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write the sidecar through a temporary file and rename it into place, so
/// readers never see a half-written document.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), CaptureError> {
    let target = sidecar_path(recording_path);
    let staging = target.with_extension("json.tmp");
    let sidecar_err = |e: &dyn std::fmt::Display| {
        CaptureError::SinkError(format!("metadata sidecar {}: {}", target.display(), e))
    };

    let file = File::create(&staging).map_err(|e| sidecar_err(&e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, metadata).map_err(|e| sidecar_err(&e))?;
    writer.flush().map_err(|e| sidecar_err(&e))?;
    drop(writer);

    fs::rename(&staging, &target).map_err(|e| {
        fs::remove_file(&staging).ok();
        sidecar_err(&e)
    })?;
    log::debug!("wrote {}", target.display());
    Ok(())
}

pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let path = sidecar_path(recording_path);
    let file = File::open(&path)
        .map_err(|e| CaptureError::SinkError(format!("metadata sidecar {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| CaptureError::SinkError(format!("metadata sidecar {}: {}", path.display(), e)))
}
