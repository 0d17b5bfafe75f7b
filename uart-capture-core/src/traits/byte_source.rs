use std::time::Duration;

use crate::models::error::CaptureError;

/// Interface for anything that yields bytes with a bounded wait.
///
/// Implemented by:
/// - `StreamSource` (TCP sockets, file replay, any timeout-capable `Read`)
/// - `ScriptedSource` (in-memory simulation)
/// - `uart_capture_serial::SerialByteSource` (serial lines)
///
/// The capture pipeline depends only on this contract, never on a concrete
/// transport.
pub trait ByteSource: Send {
    /// Read up to `max_bytes`, waiting at most about `timeout`.
    ///
    /// An empty vector means the wait elapsed with nothing queued. Once the
    /// source is permanently closed, this and every later call return
    /// `Err(CaptureError::SourceClosed)`.
    fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, CaptureError>;

    /// Release the underlying transport. Later reads report `SourceClosed`.
    fn close(&mut self) -> Result<(), CaptureError>;

    /// Human-readable name for logs.
    fn describe(&self) -> String {
        "byte source".into()
    }

    /// Collect up to `len` bytes, stopping early at the first read that
    /// times out empty. Closure is reported as an error.
    fn read_full(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, CaptureError> {
        let mut buf = Vec::with_capacity(len);
        while buf.len() < len {
            let chunk = self.read(len - buf.len(), timeout)?;
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        buf.truncate(len);
        Ok(buf)
    }
}
