use thiserror::Error;

/// Errors that can occur during framed capture.
///
/// `SyncTimeout` and `ShortRead` are transport hiccups that the controller
/// recovers from by resynchronizing. Everything else ends the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("sync not found")]
    SyncTimeout,

    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("sink error: {0}")]
    SinkError(String),

    #[error("byte source closed")]
    SourceClosed,

    #[error("byte source failed: {0}")]
    SourceFailed(String),

    #[error("frame too large: {0} samples")]
    FrameTooLarge(usize),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

impl CaptureError {
    /// Whether the controller handles this locally by resyncing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SyncTimeout | Self::ShortRead { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_hiccups_are_recoverable() {
        assert!(CaptureError::SyncTimeout.is_recoverable());
        assert!(CaptureError::ShortRead { expected: 8, received: 3 }.is_recoverable());
    }

    #[test]
    fn sink_and_source_failures_are_fatal() {
        assert!(!CaptureError::SinkError("disk full".into()).is_recoverable());
        assert!(!CaptureError::SourceClosed.is_recoverable());
        assert!(!CaptureError::SourceFailed("unplugged".into()).is_recoverable());
    }

    #[test]
    fn short_read_message_names_both_lengths() {
        let err = CaptureError::ShortRead { expected: 200, received: 10 };
        assert_eq!(err.to_string(), "short read: expected 200 bytes, received 10");
    }
}
