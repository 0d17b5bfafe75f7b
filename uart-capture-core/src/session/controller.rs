use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::capture_result::{CaptureStatus, FinalStatus, RecordingMetadata};
use crate::models::config::CaptureConfiguration;
use crate::models::diagnostics::{CaptureDiagnostics, CaptureProgress};
use crate::models::error::CaptureError;
use crate::models::frame::{Frame, FrameHeader};
use crate::models::state::CaptureState;
use crate::processing::frame_reader::FrameReader;
use crate::processing::frame_sync::FrameSynchronizer;
use crate::storage::metadata;
use crate::storage::wav_writer::WavAccumulator;
use crate::traits::byte_source::ByteSource;
use crate::traits::capture_delegate::CaptureDelegate;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionState {
    state: CaptureState,
    samples_written: u64,
    diagnostics: CaptureDiagnostics,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            samples_written: 0,
            diagnostics: CaptureDiagnostics::default(),
        }
    }
}

/// Next step of the capture loop together with the data it needs.
enum Step {
    AwaitSync,
    ReadPayload(FrameHeader),
    Accumulate(Frame),
}

/// Lets progress through once per half second of audio written.
struct ProgressThrottle {
    interval: u64,
    last_bucket: u64,
}

impl ProgressThrottle {
    fn new(sample_rate: u32) -> Self {
        Self {
            interval: (sample_rate as u64 / 2).max(1),
            last_bucket: 0,
        }
    }

    fn should_emit(&mut self, samples_written: u64) -> bool {
        let bucket = samples_written / self.interval;
        if bucket > self.last_bucket {
            self.last_bucket = bucket;
            true
        } else {
            false
        }
    }
}

/// Cloneable view of a running capture, usable from other threads.
#[derive(Clone)]
pub struct CaptureHandle {
    session_state: Arc<Mutex<SessionState>>,
    cancelled: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CaptureHandle {
    /// Ask the capture loop to stop before the next frame. A pending sync
    /// scan gives up at its next read. The output file is finalized as usual.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    pub fn progress(&self) -> CaptureProgress {
        CaptureProgress::new(self.session_state.lock().samples_written, self.sample_rate)
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.session_state.lock().diagnostics.clone()
    }
}

/// Drives one capture session from a byte source into a WAV file.
///
/// Data flow:
/// ```text
/// [ByteSource] → [FrameSynchronizer] → [FrameReader] → [WavAccumulator]
/// ```
///
/// The loop is strictly sequential: one frame is synchronized, read and
/// appended before the next sync begins, so samples land in the file in
/// arrival order. Sync timeouts and short reads are logged and retried.
/// Sink and source failures end the session. Every exit path finalizes the
/// file before returning.
pub struct CaptureController {
    config: CaptureConfiguration,
    synchronizer: FrameSynchronizer,
    reader: FrameReader,
    session_state: Arc<Mutex<SessionState>>,
    cancelled: Arc<AtomicBool>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl CaptureController {
    pub fn new(config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        Ok(Self {
            synchronizer: FrameSynchronizer::new(config.read_timeout).with_cancel_flag(Arc::clone(&cancelled)),
            reader: FrameReader::new(config.read_timeout),
            config,
            session_state: Arc::new(Mutex::new(SessionState::new())),
            cancelled,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            session_state: Arc::clone(&self.session_state),
            cancelled: Arc::clone(&self.cancelled),
            sample_rate: self.config.sample_rate,
        }
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    /// Run the capture until the target is reached, the session is
    /// cancelled, or the source or sink fails.
    ///
    /// Returns `Err` only if the capture could not start (already run, or
    /// the output file cannot be created). Once started, the outcome is
    /// reported through `FinalStatus`.
    pub fn run<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<FinalStatus, CaptureError> {
        self.ensure_not_run()?;

        let wav = match WavAccumulator::open(&self.config.output_path, self.config.sample_rate) {
            Ok(wav) => wav,
            Err(e) => {
                self.set_state(CaptureState::Failed(e.clone()));
                return Err(e);
            }
        };
        self.capture_into(source, wav)
    }

    /// Like `run`, but records into an accumulator the caller already opened
    /// instead of creating `output_path`.
    pub fn run_with_sink<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        wav: WavAccumulator,
    ) -> Result<FinalStatus, CaptureError> {
        self.ensure_not_run()?;
        if wav.sample_rate() != self.config.sample_rate {
            return Err(CaptureError::ConfigurationFailed(format!(
                "sink records at {} Hz but the capture is configured for {} Hz",
                wav.sample_rate(),
                self.config.sample_rate
            )));
        }
        self.capture_into(source, wav)
    }

    fn ensure_not_run(&self) -> Result<(), CaptureError> {
        if self.session_state.lock().state.is_idle() {
            Ok(())
        } else {
            Err(CaptureError::ConfigurationFailed(
                "capture controller has already run".into(),
            ))
        }
    }

    fn capture_into<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        mut wav: WavAccumulator,
    ) -> Result<FinalStatus, CaptureError> {
        log::info!(
            "capturing from {} into {} at {} Hz",
            source.describe(),
            wav.file_path().display(),
            self.config.sample_rate
        );
        match self.config.target_samples() {
            Some(target) => log::info!("target: {} samples", target),
            None => log::info!("no target; capturing until cancelled or the source closes"),
        }

        let status = self.capture_loop(source, &mut wav);
        Ok(self.finish(&mut wav, status))
    }

    fn capture_loop<S: ByteSource + ?Sized>(&mut self, source: &mut S, wav: &mut WavAccumulator) -> CaptureStatus {
        let target = self.config.target_samples();
        let mut progress = ProgressThrottle::new(self.config.sample_rate);
        let mut step = Step::AwaitSync;

        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                log::info!("capture cancelled");
                return CaptureStatus::Cancelled;
            }

            step = match step {
                Step::AwaitSync => {
                    self.set_state(CaptureState::AwaitingSync);
                    let result = self
                        .synchronizer
                        .find_next_frame_length(source, self.config.sync_timeout);
                    self.session_state.lock().diagnostics.bytes_scanned = self.synchronizer.bytes_scanned();

                    match result {
                        Ok(header) => Step::ReadPayload(header),
                        // Scan abandoned; the check above ends the loop.
                        Err(CaptureError::SyncTimeout) if self.cancelled.load(Ordering::SeqCst) => Step::AwaitSync,
                        Err(CaptureError::SyncTimeout) => {
                            log::warn!(
                                "sync not found within {:?}; check wiring, baud and marker",
                                self.config.sync_timeout
                            );
                            self.session_state.lock().diagnostics.sync_timeouts += 1;
                            self.notify_resync(&CaptureError::SyncTimeout);
                            Step::AwaitSync
                        }
                        Err(e) => return CaptureStatus::Failed(e),
                    }
                }
                Step::ReadPayload(header) => {
                    self.set_state(CaptureState::ReadingPayload {
                        sample_count: header.sample_count,
                    });

                    match self.reader.read_frame(source, header) {
                        Ok(frame) => Step::Accumulate(frame),
                        Err(e) if e.is_recoverable() => {
                            log::warn!("short read, resyncing ({})", e);
                            self.session_state.lock().diagnostics.short_reads += 1;
                            self.notify_resync(&e);
                            Step::AwaitSync
                        }
                        Err(e) => return CaptureStatus::Failed(e),
                    }
                }
                Step::Accumulate(frame) => {
                    self.set_state(CaptureState::Accumulating {
                        sample_count: frame.sample_count(),
                    });

                    if let Err(e) = wav.append_payload(&frame.payload) {
                        log::error!("failed to write audio data: {}", e);
                        return CaptureStatus::Failed(e);
                    }

                    let samples_written = {
                        let mut s = self.session_state.lock();
                        if frame.header.is_empty() {
                            s.diagnostics.empty_frames += 1;
                        } else {
                            s.diagnostics.frames_accumulated += 1;
                        }
                        s.samples_written += frame.sample_count() as u64;
                        s.samples_written
                    };

                    if progress.should_emit(samples_written) {
                        self.notify_progress(samples_written);
                    }

                    if target.is_some_and(|t| samples_written >= t) {
                        log::info!("target reached");
                        return CaptureStatus::Done;
                    }
                    Step::AwaitSync
                }
            };
        }
    }

    /// Finalize the file and publish the terminal state.
    fn finish(&mut self, wav: &mut WavAccumulator, status: CaptureStatus) -> FinalStatus {
        let (status, checksum) = match wav.finalize() {
            Ok(summary) => (status, Some(summary.checksum)),
            Err(e) => {
                log::error!("failed to finalize {}: {}", wav.file_path().display(), e);
                match status {
                    CaptureStatus::Failed(original) => (CaptureStatus::Failed(original), None),
                    _ => (CaptureStatus::Failed(e), None),
                }
            }
        };

        let (samples_written, diagnostics) = {
            let s = self.session_state.lock();
            (s.samples_written, s.diagnostics.clone())
        };
        let sample_rate = self.config.sample_rate;

        let final_status = FinalStatus {
            status,
            samples_written,
            elapsed_secs: CaptureProgress::new(samples_written, sample_rate).elapsed_secs,
            file_path: wav.file_path().to_path_buf(),
            checksum,
            diagnostics,
        };

        if self.config.write_metadata {
            let meta = RecordingMetadata::from_status(&final_status, sample_rate);
            if let Err(e) = metadata::write_metadata(&meta, &final_status.file_path) {
                log::warn!("failed to write metadata sidecar: {}", e);
            }
        }

        let terminal = match &final_status.status {
            CaptureStatus::Done => CaptureState::Done,
            CaptureStatus::Cancelled => CaptureState::Cancelled,
            CaptureStatus::Failed(e) => CaptureState::Failed(e.clone()),
        };
        self.set_state(terminal);

        match &final_status.status {
            CaptureStatus::Failed(CaptureError::SourceClosed) => log::info!(
                "source closed; kept {} samples (~{:.2} s)",
                samples_written,
                final_status.elapsed_secs
            ),
            CaptureStatus::Failed(e) => log::error!(
                "capture failed after {} samples (~{:.2} s): {}",
                samples_written,
                final_status.elapsed_secs,
                e
            ),
            other => log::info!(
                "capture {}: {} samples (~{:.2} s)",
                other.label(),
                samples_written,
                final_status.elapsed_secs
            ),
        }

        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&final_status);
        }

        final_status
    }

    // --- Internal helpers ---

    fn set_state(&self, new_state: CaptureState) {
        {
            let mut s = self.session_state.lock();
            s.state = new_state.clone();
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }

    fn notify_progress(&self, samples_written: u64) {
        let progress = CaptureProgress::new(samples_written, self.config.sample_rate);
        log::debug!("{:6.2} s written", progress.elapsed_secs);
        if let Some(ref delegate) = self.delegate {
            delegate.on_progress(&progress);
        }
    }

    fn notify_resync(&self, reason: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_resync(reason);
        }
    }
}

/// Capture from `source` into `output_path` with default timeouts, then
/// close the source.
///
/// `target_duration_secs` of `None` (or a non-positive value) captures until
/// the source closes.
pub fn start_capture<S: ByteSource + ?Sized>(
    source: &mut S,
    sample_rate: u32,
    target_duration_secs: Option<f64>,
    output_path: impl Into<PathBuf>,
) -> Result<FinalStatus, CaptureError> {
    let config = CaptureConfiguration {
        sample_rate,
        target_duration_secs,
        output_path: output_path.into(),
        ..Default::default()
    };
    let mut controller = CaptureController::new(config)?;
    let result = controller.run(source);
    if let Err(e) = source.close() {
        log::warn!("failed to close {}: {}", source.describe(), e);
    }
    result
}
