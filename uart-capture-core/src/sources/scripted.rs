use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::traits::byte_source::ByteSource;

enum Segment {
    Bytes(VecDeque<u8>),
    Idle,
    Stall(Duration),
}

/// In-memory byte source that replays a script of data and gaps.
///
/// Useful for simulating a device: byte segments are handed out in order,
/// `idle` produces one empty (timed-out) read, `stall` sleeps before an
/// empty read. Once the script runs out the source reports `SourceClosed`.
#[derive(Default)]
pub struct ScriptedSource {
    segments: VecDeque<Segment>,
    closed: bool,
    reads: u64,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(mut self, data: impl AsRef<[u8]>) -> Self {
        self.push_bytes(data);
        self
    }

    pub fn idle(mut self) -> Self {
        self.segments.push_back(Segment::Idle);
        self
    }

    pub fn stall(mut self, duration: Duration) -> Self {
        self.segments.push_back(Segment::Stall(duration));
        self
    }

    pub fn push_bytes(&mut self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        if !data.is_empty() {
            self.segments.push_back(Segment::Bytes(data.iter().copied().collect()));
        }
    }

    /// Number of `read` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Bytes still queued in the script.
    pub fn remaining_bytes(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Bytes(b) => b.len(),
                _ => 0,
            })
            .sum()
    }
}

impl ByteSource for ScriptedSource {
    fn read(&mut self, max_bytes: usize, _timeout: Duration) -> Result<Vec<u8>, CaptureError> {
        if self.closed {
            return Err(CaptureError::SourceClosed);
        }
        self.reads += 1;
        if max_bytes == 0 {
            return Ok(Vec::new());
        }

        match self.segments.pop_front() {
            None => {
                self.closed = true;
                Err(CaptureError::SourceClosed)
            }
            Some(Segment::Bytes(mut data)) => {
                let n = max_bytes.min(data.len());
                let taken: Vec<u8> = data.drain(..n).collect();
                if !data.is_empty() {
                    self.segments.push_front(Segment::Bytes(data));
                }
                Ok(taken)
            }
            Some(Segment::Idle) => Ok(Vec::new()),
            Some(Segment::Stall(duration)) => {
                thread::sleep(duration);
                Ok(Vec::new())
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.segments.clear();
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "scripted source".into()
    }
}
