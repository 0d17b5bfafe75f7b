use serde::{Deserialize, Serialize};

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDiagnostics {
    /// Frames whose payload reached the WAV file.
    pub frames_accumulated: u64,
    /// Zero-sample frames accepted as no-ops.
    pub empty_frames: u64,
    pub sync_timeouts: u64,
    pub short_reads: u64,
    /// Bytes consumed while hunting for the magic marker.
    pub bytes_scanned: u64,
}

impl CaptureDiagnostics {
    pub fn resyncs(&self) -> u64 {
        self.sync_timeouts + self.short_reads
    }
}

/// Progress notification. Elapsed time is audio time, not wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureProgress {
    pub samples_written: u64,
    pub elapsed_secs: f64,
}

impl CaptureProgress {
    pub fn new(samples_written: u64, sample_rate: u32) -> Self {
        Self {
            samples_written,
            elapsed_secs: samples_written as f64 / sample_rate as f64,
        }
    }
}
