use thiserror::Error;

use uart_capture_core::CaptureError;

/// Failures raised before any bytes flow.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
}

impl SerialError {
    /// True when the OS refused access to the device node.
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            Self::Open { source, .. } | Self::Enumerate(source) => source,
        };
        matches!(
            source.kind(),
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
        )
    }

    /// True when the named port does not exist.
    pub fn is_missing_device(&self) -> bool {
        match self {
            Self::Open { source, .. } => matches!(
                source.kind(),
                serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(std::io::ErrorKind::NotFound)
            ),
            Self::Enumerate(_) => false,
        }
    }
}

impl From<SerialError> for CaptureError {
    fn from(err: SerialError) -> Self {
        CaptureError::SourceFailed(err.to_string())
    }
}
