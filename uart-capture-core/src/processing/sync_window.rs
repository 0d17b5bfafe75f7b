/// Number of bytes the synchronizer compares against the magic marker.
pub const WINDOW_LEN: usize = 4;

/// Fixed-size sliding window over the most recent bytes of a stream.
///
/// Backed by an array with a wrapping write index. Once full, each push
/// overwrites the oldest byte.
#[derive(Debug, Clone, Default)]
pub struct SyncWindow {
    buffer: [u8; WINDOW_LEN],
    write_index: usize,
    filled: usize,
}

impl SyncWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) {
        self.buffer[self.write_index] = byte;
        self.write_index = (self.write_index + 1) % WINDOW_LEN;
        if self.filled < WINDOW_LEN {
            self.filled += 1;
        }
    }

    /// Whether the last `WINDOW_LEN` bytes equal `pattern`, oldest first.
    pub fn matches(&self, pattern: &[u8; WINDOW_LEN]) -> bool {
        if !self.is_full() {
            return false;
        }
        // When full, the write index sits on the oldest byte.
        (0..WINDOW_LEN).all(|i| self.buffer[(self.write_index + i) % WINDOW_LEN] == pattern[i])
    }

    /// Window contents, oldest first.
    pub fn contents(&self) -> Vec<u8> {
        if !self.is_full() {
            return self.buffer[..self.filled].to_vec();
        }
        (0..WINDOW_LEN)
            .map(|i| self.buffer[(self.write_index + i) % WINDOW_LEN])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == WINDOW_LEN
    }

    /// Forget everything seen so far.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.filled = 0;
    }
}
