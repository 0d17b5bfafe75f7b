#![allow(dead_code)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use uart_capture_core::{
    encode_frame, parse_wav_header, ByteSource, CaptureConfiguration, CaptureDelegate, CaptureError, CaptureHandle,
    CaptureProgress, CaptureState, FinalStatus, ScriptedSource, WavHeader, WavStorage,
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Unique path under the temp dir; removed by `cleanup`.
pub fn temp_wav(name: &str) -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("uart_capture_it_{}_{}_{}.wav", std::process::id(), id, name))
}

pub fn cleanup(path: &Path) {
    fs::remove_file(path).ok();
    fs::remove_file(path.with_extension("metadata.json")).ok();
}

pub fn config(path: &Path, sample_rate: u32, target_duration_secs: Option<f64>) -> CaptureConfiguration {
    CaptureConfiguration {
        sample_rate,
        target_duration_secs,
        output_path: path.to_path_buf(),
        sync_timeout: Duration::from_millis(500),
        read_timeout: Duration::from_millis(20),
        ..Default::default()
    }
}

pub fn frame(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_frame(samples, &mut out).unwrap();
    out
}

/// Parse a written WAV file into its header and samples.
pub fn read_wav(path: &Path) -> (WavHeader, Vec<i16>) {
    let bytes = fs::read(path).unwrap();
    let header = parse_wav_header(&bytes).unwrap();
    let samples = bytes[44..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    (header, samples)
}

/// Records every notification; optionally cancels after N accumulated frames.
#[derive(Default)]
pub struct RecordingDelegate {
    pub states: Mutex<Vec<CaptureState>>,
    pub progress: Mutex<Vec<CaptureProgress>>,
    pub resyncs: Mutex<Vec<CaptureError>>,
    pub finished: Mutex<Option<FinalStatus>>,
    cancel_after_frames: Option<usize>,
    handle: Mutex<Option<CaptureHandle>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(frames: usize) -> Self {
        Self {
            cancel_after_frames: Some(frames),
            ..Default::default()
        }
    }

    pub fn attach(&self, handle: CaptureHandle) {
        *self.handle.lock() = Some(handle);
    }

    pub fn accumulated_frames(&self) -> usize {
        self.states
            .lock()
            .iter()
            .filter(|s| matches!(s, CaptureState::Accumulating { .. }))
            .count()
    }
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.clone());
        if let (Some(limit), CaptureState::Accumulating { .. }) = (self.cancel_after_frames, state) {
            if self.accumulated_frames() >= limit {
                if let Some(handle) = self.handle.lock().as_ref() {
                    handle.cancel();
                }
            }
        }
    }

    fn on_progress(&self, progress: &CaptureProgress) {
        self.progress.lock().push(*progress);
    }

    fn on_resync(&self, reason: &CaptureError) {
        self.resyncs.lock().push(reason.clone());
    }

    fn on_capture_finished(&self, status: &FinalStatus) {
        *self.finished.lock() = Some(status.clone());
    }
}

/// Serves a script, then fails like an unplugged device instead of closing.
pub struct FailingSource {
    inner: ScriptedSource,
}

impl FailingSource {
    pub fn new(inner: ScriptedSource) -> Self {
        Self { inner }
    }
}

impl ByteSource for FailingSource {
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, CaptureError> {
        match self.inner.read(max_bytes, timeout) {
            Err(CaptureError::SourceClosed) => Err(CaptureError::SourceFailed("device unplugged".into())),
            other => other,
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.inner.close()
    }
}

/// Output file whose `fail_at`-th header write (a write at offset 0) fails,
/// like a disk filling up between two frames.
pub struct HeaderFaultFile {
    inner: File,
    header_writes: usize,
    fail_at: usize,
}

impl HeaderFaultFile {
    pub fn create(path: &Path, fail_at: usize) -> Box<Self> {
        let inner = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap();
        Box::new(Self {
            inner,
            header_writes: 0,
            fail_at,
        })
    }
}

impl Read for HeaderFaultFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for HeaderFaultFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.inner.stream_position()? == 0 {
            self.header_writes += 1;
            if self.header_writes == self.fail_at {
                return Err(io::Error::other("no space left on device"));
            }
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for HeaderFaultFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl WavStorage for HeaderFaultFile {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.inner.set_len(len)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        self.inner.sync_all()
    }
}
