use std::fs::File;
use std::io::{Cursor, ErrorKind, Read};
use std::net::TcpStream;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::traits::byte_source::ByteSource;

/// A `Read` whose blocking reads can be bounded by a timeout.
pub trait TimeoutRead: Read + Send {
    fn set_read_timeout(&mut self, timeout: Duration) -> std::io::Result<()>;
}

impl TimeoutRead for TcpStream {
    fn set_read_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        // A zero timeout is rejected by the socket API.
        TcpStream::set_read_timeout(self, Some(timeout.max(Duration::from_millis(1))))
    }
}

impl TimeoutRead for File {
    fn set_read_timeout(&mut self, _timeout: Duration) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T: AsRef<[u8]> + Send> TimeoutRead for Cursor<T> {
    fn set_read_timeout(&mut self, _timeout: Duration) -> std::io::Result<()> {
        Ok(())
    }
}

/// Adapts a timeout-capable `Read` stream to the `ByteSource` contract.
///
/// - `Ok(0)` from the stream (EOF) closes the source for good.
/// - `TimedOut` / `WouldBlock` become an empty read.
/// - Any other I/O error is reported as `SourceFailed`.
pub struct StreamSource<T: TimeoutRead> {
    inner: Option<T>,
    label: String,
    current_timeout: Option<Duration>,
}

impl<T: TimeoutRead> StreamSource<T> {
    pub fn new(inner: T, label: impl Into<String>) -> Self {
        Self {
            inner: Some(inner),
            label: label.into(),
            current_timeout: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the underlying stream, if still open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }
}

impl StreamSource<File> {
    /// Replay a raw capture of the wire stream from disk.
    pub fn open_replay(path: &std::path::Path) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|e| {
            CaptureError::SourceFailed(format!("failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(file, format!("replay {}", path.display())))
    }
}

impl StreamSource<TcpStream> {
    /// Connect to a device that streams frames over TCP.
    pub fn connect_tcp(addr: &str) -> Result<Self, CaptureError> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| CaptureError::SourceFailed(format!("failed to connect to {}: {}", addr, e)))?;
        Ok(Self::new(stream, format!("tcp {}", addr)))
    }
}

impl<T: TimeoutRead> ByteSource for StreamSource<T> {
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, CaptureError> {
        let inner = self.inner.as_mut().ok_or(CaptureError::SourceClosed)?;
        if max_bytes == 0 {
            return Ok(Vec::new());
        }

        if self.current_timeout != Some(timeout) {
            inner
                .set_read_timeout(timeout)
                .map_err(|e| CaptureError::SourceFailed(format!("{}: {}", self.label, e)))?;
            self.current_timeout = Some(timeout);
        }

        let mut buf = vec![0u8; max_bytes];
        loop {
            match inner.read(&mut buf) {
                Ok(0) => {
                    log::debug!("{} reached end of stream", self.label);
                    self.inner = None;
                    return Err(CaptureError::SourceClosed);
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(Vec::new());
                }
                Err(e) => return Err(CaptureError::SourceFailed(format!("{}: {}", self.label, e))),
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.inner = None;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
