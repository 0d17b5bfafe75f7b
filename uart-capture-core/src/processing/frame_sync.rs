use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::error::CaptureError;
use crate::models::frame::FrameHeader;
use crate::traits::byte_source::ByteSource;

use super::sync_window::SyncWindow;

/// Marker that opens every frame: `0x55 0xAA 'S' '1'`.
pub const MAGIC: [u8; 4] = [0x55, 0xAA, b'S', b'1'];

/// Bytes of little-endian sample count following the marker.
pub const HEADER_LEN: usize = 2;

/// Scans a byte source for the magic marker and decodes the frame header.
///
/// The wire format has no escaping or checksum, so a marker that happens to
/// appear inside payload bytes being scanned is taken as a frame boundary.
#[derive(Debug)]
pub struct FrameSynchronizer {
    window: SyncWindow,
    read_timeout: Duration,
    bytes_scanned: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl FrameSynchronizer {
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            window: SyncWindow::new(),
            read_timeout,
            bytes_scanned: 0,
            cancel: None,
        }
    }

    /// Abandon a scan as soon as `flag` is raised instead of waiting out the
    /// sync timeout. An abandoned scan reports `SyncTimeout`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Hunt for the next frame and return its header.
    ///
    /// Reads one byte at a time until the last four equal `MAGIC`, then
    /// reads the 2-byte header. If the header does not arrive in time the
    /// match is discarded and scanning resumes. Empty reads are not errors;
    /// only running past `timeout` without a complete header fails with
    /// `SyncTimeout`. A timeout too large to represent as a deadline means
    /// the scan never gives up on its own.
    pub fn find_next_frame_length<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        timeout: Duration,
    ) -> Result<FrameHeader, CaptureError> {
        let deadline = Instant::now().checked_add(timeout);
        self.window.reset();

        loop {
            if self.is_cancelled() {
                log::debug!("sync abandoned after cancellation");
                return Err(CaptureError::SyncTimeout);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::MAX,
            };
            if remaining.is_zero() {
                return Err(CaptureError::SyncTimeout);
            }

            let byte = source.read(1, self.read_timeout.min(remaining))?;
            let Some(&b) = byte.first() else {
                continue;
            };
            self.bytes_scanned += 1;
            self.window.push(b);
            if !self.window.matches(&MAGIC) {
                continue;
            }

            let header = source.read_full(HEADER_LEN, self.read_timeout)?;
            match <[u8; HEADER_LEN]>::try_from(header.as_slice()) {
                Ok(bytes) => {
                    self.window.reset();
                    return Ok(FrameHeader::from_le_bytes(bytes));
                }
                Err(_) => {
                    log::debug!("marker without header ({} of {} bytes), rescanning", header.len(), HEADER_LEN);
                    self.window.reset();
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Total bytes pushed through the window since construction.
    pub fn bytes_scanned(&self) -> u64 {
        self.bytes_scanned
    }
}
