/// Bytes per PCM sample on the wire and in the WAV file.
pub const BYTES_PER_SAMPLE: usize = 2;

/// The 2-byte little-endian sample count that follows the magic marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sample_count: u16,
}

impl FrameHeader {
    pub fn new(sample_count: u16) -> Self {
        Self { sample_count }
    }

    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self::new(u16::from_le_bytes(bytes))
    }

    /// Payload length in bytes announced by this header.
    pub fn payload_len(&self) -> usize {
        self.sample_count as usize * BYTES_PER_SAMPLE
    }

    /// A zero-sample frame carries no payload and is a no-op for the sink.
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// One synchronized frame. Built by the frame reader and handed straight to
/// the WAV accumulator; never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(header: FrameHeader, payload: Vec<u8>) -> Self {
        debug_assert_eq!(payload.len(), header.payload_len());
        Self { header, payload }
    }

    pub fn sample_count(&self) -> u16 {
        self.header.sample_count
    }

    /// Decode the payload as little-endian signed 16-bit samples.
    pub fn samples(&self) -> Vec<i16> {
        self.payload
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}
