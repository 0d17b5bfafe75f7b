use std::fmt;

use uart_capture_core::{CaptureError, CaptureStatus};
use uart_capture_serial::SerialError;

// Exit codes follow the sysexits/shell conventions used across our tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SOURCE_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn capture_error(context: &str, err: CaptureError) -> CliError {
    let code = match err {
        CaptureError::ConfigurationFailed(_) => USAGE,
        CaptureError::SinkError(_) => FAILURE,
        CaptureError::SourceClosed | CaptureError::SourceFailed(_) => SOURCE_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn serial_error(context: &str, err: SerialError) -> CliError {
    let code = if err.is_permission_denied() {
        PERMISSION_DENIED
    } else {
        SOURCE_ERROR
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Exit code for a capture that ran to a terminal state.
///
/// A replay file running out is the normal end of a replay, so its
/// `SourceClosed` counts as success. For live links it means the device
/// went away.
pub fn status_code(status: &CaptureStatus, closes_at_end: bool) -> i32 {
    match status {
        CaptureStatus::Done => SUCCESS,
        CaptureStatus::Cancelled => INTERRUPTED,
        CaptureStatus::Failed(CaptureError::SourceClosed) if closes_at_end => SUCCESS,
        CaptureStatus::Failed(CaptureError::SourceClosed | CaptureError::SourceFailed(_)) => SOURCE_ERROR,
        CaptureStatus::Failed(CaptureError::SinkError(_)) => FAILURE,
        CaptureStatus::Failed(_) => INTERNAL,
    }
}
