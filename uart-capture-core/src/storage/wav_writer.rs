use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::frame::BYTES_PER_SAMPLE;
use crate::processing::wav_format;

/// What a finalized WAV file contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavSummary {
    pub file_path: PathBuf,
    pub data_bytes: u64,
    pub samples: u64,
    /// SHA-256 hex digest of the complete file.
    pub checksum: String,
}

/// Backing store for a WAV file being written.
///
/// `File` is the only production implementation. Other stores let callers
/// wrap the file, e.g. to observe or fail individual writes.
pub trait WavStorage: Read + Write + Seek + Send {
    /// Truncate or extend the store to exactly `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    /// Flush buffered data through to the device.
    fn sync_all(&mut self) -> io::Result<()>;
}

impl WavStorage for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        File::sync_all(self)
    }
}

/// Streaming mono 16-bit PCM WAV writer.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [raw 16-bit LE PCM data...]
/// ```
///
/// Payloads go straight to disk; nothing is buffered beyond the current
/// frame. After every append the RIFF and data sizes are rewritten, so the
/// file is playable even if the process dies before `finalize`. A frame
/// counts as written only once both its bytes and the updated header are on
/// disk; a frame whose append failed is cut off again by `finalize`.
/// Dropping an accumulator that was never finalized finalizes it.
pub struct WavAccumulator {
    file_path: PathBuf,
    file: Option<Box<dyn WavStorage>>,
    sample_rate: u32,
    data_bytes: u64,
    summary: Option<WavSummary>,
}

impl WavAccumulator {
    /// Create the file (and missing parent directories) and write the header.
    pub fn open(file_path: impl Into<PathBuf>, sample_rate: u32) -> Result<Self, CaptureError> {
        let file_path = file_path.into();
        if sample_rate == 0 {
            return Err(CaptureError::ConfigurationFailed("sample rate must be positive".into()));
        }

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::SinkError(format!("failed to create directory: {}", e)))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .map_err(|e| CaptureError::SinkError(format!("failed to create file: {}", e)))?;
        Self::with_storage(file_path, Box::new(file), sample_rate)
    }

    /// Start a WAV file on an already opened store.
    ///
    /// `file_path` names the store in summaries and logs; the store is
    /// expected to be empty.
    pub fn with_storage(
        file_path: impl Into<PathBuf>,
        mut storage: Box<dyn WavStorage>,
        sample_rate: u32,
    ) -> Result<Self, CaptureError> {
        let file_path = file_path.into();
        if sample_rate == 0 {
            return Err(CaptureError::ConfigurationFailed("sample rate must be positive".into()));
        }
        storage
            .write_all(&wav_format::generate_capture_header(sample_rate, 0))
            .map_err(|e| CaptureError::SinkError(format!("write failed: {}", e)))?;

        log::debug!("opened {} at {} Hz", file_path.display(), sample_rate);
        Ok(Self {
            file_path,
            file: Some(storage),
            sample_rate,
            data_bytes: 0,
            summary: None,
        })
    }

    /// Append one frame's worth of little-endian PCM bytes.
    pub fn append_payload(&mut self, payload: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::SinkError("file is already finalized".into()))?;
        if payload.is_empty() {
            return Ok(());
        }
        if payload.len() % BYTES_PER_SAMPLE != 0 {
            return Err(CaptureError::SinkError(format!(
                "payload of {} bytes is not sample-aligned",
                payload.len()
            )));
        }
        if !wav_format::fits_in_riff(self.data_bytes, payload.len() as u64) {
            return Err(CaptureError::SinkError("wav data would exceed 4 GiB".into()));
        }

        // Start at the end of committed data so a tail left by an earlier
        // failed append is overwritten.
        let committed_end = wav_format::WAV_HEADER_SIZE as u64 + self.data_bytes;
        let new_total = self.data_bytes + payload.len() as u64;
        file.seek(SeekFrom::Start(committed_end))
            .and_then(|_| file.write_all(payload))
            .map_err(|e| CaptureError::SinkError(format!("write failed: {}", e)))?;
        rewrite_header(&mut **file, self.sample_rate, new_total)
            .map_err(|e| CaptureError::SinkError(format!("header update failed: {}", e)))?;

        self.data_bytes = new_total;
        Ok(())
    }

    /// Settle the header, flush to disk, and checksum the file.
    ///
    /// Safe to call more than once: later calls return the first summary
    /// without touching the file.
    pub fn finalize(&mut self) -> Result<WavSummary, CaptureError> {
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::SinkError("file is not open".into()))?;

        // Drop any tail left behind by a failed append.
        file.set_len(wav_format::WAV_HEADER_SIZE as u64 + self.data_bytes)
            .map_err(|e| CaptureError::SinkError(e.to_string()))?;
        rewrite_header(&mut *file, self.sample_rate, self.data_bytes)
            .map_err(|e| CaptureError::SinkError(e.to_string()))?;
        file.flush().map_err(|e| CaptureError::SinkError(e.to_string()))?;
        file.sync_all().map_err(|e| CaptureError::SinkError(e.to_string()))?;
        let checksum = sha256_storage(&mut *file)?;
        drop(file);

        let summary = WavSummary {
            file_path: self.file_path.clone(),
            data_bytes: self.data_bytes,
            samples: self.samples_written(),
            checksum,
        };
        log::debug!(
            "finalized {} ({} samples, sha256 {})",
            self.file_path.display(),
            summary.samples,
            summary.checksum
        );
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn samples_written(&self) -> u64 {
        self.data_bytes / BYTES_PER_SAMPLE as u64
    }

    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_finalized(&self) -> bool {
        self.summary.is_some()
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl Drop for WavAccumulator {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(e) = self.finalize() {
                log::error!("failed to finalize {}: {}", self.file_path.display(), e);
            }
        }
    }
}

/// Rewrite the 44-byte header for `data_bytes` and return to the end.
fn rewrite_header(file: &mut dyn WavStorage, sample_rate: u32, data_bytes: u64) -> io::Result<()> {
    let header = wav_format::generate_capture_header(sample_rate, data_bytes as u32);
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header)?;
    file.seek(SeekFrom::End(0))?;
    Ok(())
}

/// Compute SHA-256 hex digest of the whole store.
fn sha256_storage(file: &mut dyn WavStorage) -> Result<String, CaptureError> {
    let mut hasher = Sha256::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| io::copy(file, &mut hasher))
        .map_err(|e| CaptureError::SinkError(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
