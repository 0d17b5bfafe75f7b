use std::time::Duration;

use crate::models::error::CaptureError;
use crate::models::frame::{Frame, FrameHeader};
use crate::traits::byte_source::ByteSource;

/// Reads the PCM payload of a synchronized frame.
///
/// Either the whole payload is returned or the frame is rejected with
/// `ShortRead`; partial payloads never leave this type.
#[derive(Debug, Clone)]
pub struct FrameReader {
    read_timeout: Duration,
}

impl FrameReader {
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }

    /// Read exactly `header.payload_len()` bytes.
    ///
    /// A read that times out empty, or the source closing mid-payload, yields
    /// `ShortRead`. Other source failures are passed through.
    pub fn read_frame<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        header: FrameHeader,
    ) -> Result<Frame, CaptureError> {
        let expected = header.payload_len();
        let mut payload = Vec::with_capacity(expected);

        while payload.len() < expected {
            let wanted = expected - payload.len();
            match source.read(wanted, self.read_timeout) {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => payload.extend_from_slice(&chunk[..chunk.len().min(wanted)]),
                Err(CaptureError::SourceClosed) => break,
                Err(e) => return Err(e),
            }
        }

        if payload.len() != expected {
            return Err(CaptureError::ShortRead {
                expected,
                received: payload.len(),
            });
        }
        Ok(Frame::new(header, payload))
    }
}
