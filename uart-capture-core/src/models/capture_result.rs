use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::diagnostics::CaptureDiagnostics;
use super::error::CaptureError;
use crate::processing::wav_format::{PCM_BIT_DEPTH, PCM_CHANNELS};

/// How a capture session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    /// The target sample count was reached.
    Done,
    /// The session was cancelled between frames.
    Cancelled,
    /// A sink or source failure ended the session.
    Failed(CaptureError),
}

impl CaptureStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&CaptureError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Result returned when a capture session ends, whatever the reason.
///
/// The output file is finalized before this is produced, so
/// `samples_written` always matches the samples in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalStatus {
    pub status: CaptureStatus,
    pub samples_written: u64,
    pub elapsed_secs: f64,
    pub file_path: PathBuf,
    /// SHA-256 of the finished file, absent if finalization failed.
    pub checksum: Option<String>,
    pub diagnostics: CaptureDiagnostics,
}

impl FinalStatus {
    pub fn is_done(&self) -> bool {
        matches!(self.status, CaptureStatus::Done)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, CaptureStatus::Cancelled)
    }
}

/// Metadata stored alongside a recording as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub samples_written: u64,
    pub duration_secs: f64,
    pub checksum: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub diagnostics: CaptureDiagnostics,
}

impl RecordingMetadata {
    pub fn from_status(status: &FinalStatus, sample_rate: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: status.file_path.to_string_lossy().into_owned(),
            sample_rate,
            channels: PCM_CHANNELS,
            bit_depth: PCM_BIT_DEPTH,
            samples_written: status.samples_written,
            duration_secs: status.elapsed_secs,
            checksum: status.checksum.clone(),
            status: status.status.label().to_string(),
            error: status.status.error().map(|e| e.to_string()),
            diagnostics: status.diagnostics.clone(),
        }
    }
}
