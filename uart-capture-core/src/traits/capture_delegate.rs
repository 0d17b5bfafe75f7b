use crate::models::capture_result::FinalStatus;
use crate::models::diagnostics::CaptureProgress;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// All methods are called from the thread running the capture loop.
/// Notifications are side effects only; nothing a delegate does changes the
/// loop's control flow except through `CaptureHandle::cancel`.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the controller moves to a new state.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called at most about twice per second of audio written.
    fn on_progress(&self, progress: &CaptureProgress);

    /// Called when a sync timeout or short read forces a resync.
    fn on_resync(&self, reason: &CaptureError);

    /// Called once the output file is finalized.
    fn on_capture_finished(&self, status: &FinalStatus);
}
