//! Terminal output: live progress while capturing, summary afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use uart_capture_core::{
    CaptureDelegate, CaptureError, CaptureProgress, CaptureState, CaptureStatus, FinalStatus,
};

/// Progress display driven by capture events.
///
/// With a target the bar fills towards the target sample count; without
/// one a spinner shows the seconds recorded so far. Quiet mode uses a hidden
/// bar so every call is a no-op.
pub struct Presenter {
    bar: ProgressBar,
    target_samples: Option<u64>,
    receiving: AtomicBool,
}

impl Presenter {
    pub fn new(target_samples: Option<u64>, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = match target_samples {
                Some(total) => {
                    let bar = ProgressBar::new(total);
                    bar.set_style(
                        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {percent:>3}% {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    bar
                }
                None => {
                    let bar = ProgressBar::new_spinner();
                    bar.set_style(
                        ProgressStyle::with_template("{spinner:.cyan} {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                    );
                    bar
                }
            };
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        };

        bar.set_message("waiting for sync");
        Self {
            bar,
            target_samples,
            receiving: AtomicBool::new(false),
        }
    }
}

impl CaptureDelegate for Presenter {
    fn on_state_changed(&self, state: &CaptureState) {
        if matches!(state, CaptureState::Accumulating { .. }) && !self.receiving.swap(true, Ordering::SeqCst) {
            self.bar.set_message("recording");
        }
    }

    fn on_progress(&self, progress: &CaptureProgress) {
        let position = match self.target_samples {
            Some(total) => progress.samples_written.min(total),
            None => progress.samples_written,
        };
        self.bar.set_position(position);
        self.bar.set_message(format!("recording {:.1} s", progress.elapsed_secs));
    }

    fn on_resync(&self, reason: &CaptureError) {
        if let CaptureError::SyncTimeout = reason {
            self.receiving.store(false, Ordering::SeqCst);
            self.bar.set_message("waiting for sync");
        }
    }

    fn on_capture_finished(&self, _status: &FinalStatus) {
        self.bar.finish_and_clear();
    }
}

/// One-line human description of how the capture ended.
pub fn describe_status(status: &FinalStatus) -> String {
    let outcome = match &status.status {
        CaptureStatus::Done => "done".to_string(),
        CaptureStatus::Cancelled => "stopped".to_string(),
        CaptureStatus::Failed(CaptureError::SourceClosed) => "source closed".to_string(),
        CaptureStatus::Failed(e) => format!("failed ({e})"),
    };
    format!(
        "{outcome}: {} samples (~{:.2} s) -> {}",
        status.samples_written,
        status.elapsed_secs,
        status.file_path.display()
    )
}

/// Print the human-readable summary to stdout.
pub fn print_summary(status: &FinalStatus) {
    println!("{}", describe_status(status));
    if let Some(checksum) = &status.checksum {
        println!("sha256: {checksum}");
    }
    let d = &status.diagnostics;
    if d.resyncs() > 0 || d.empty_frames > 0 {
        println!(
            "frames: {} ({} empty), resyncs: {} ({} sync timeouts, {} short reads)",
            d.frames_accumulated,
            d.empty_frames,
            d.resyncs(),
            d.sync_timeouts,
            d.short_reads
        );
    }
}
