//! Canonical 44-byte RIFF/WAVE header for mono 16-bit PCM.
//!
//! ```text
//! "RIFF" <36 + data_size> "WAVE"
//! "fmt " <16> <format 1> <channels> <rate> <byte rate> <block align> <bits>
//! "data" <data_size>
//! ```
//!
//! All integers little-endian. The writer rewrites the whole header as the
//! data chunk grows; `parse_wav_header` reads it back for verification.

use crate::models::error::CaptureError;

pub const WAV_HEADER_SIZE: usize = 44;

/// Captures are always mono.
pub const PCM_CHANNELS: u16 = 1;

/// Captures are always 16-bit little-endian PCM.
pub const PCM_BIT_DEPTH: u16 = 16;

/// Largest data chunk whose RIFF size still fits in 32 bits.
pub const MAX_DATA_SIZE: u64 = u32::MAX as u64 - 36;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Header bytes for a mono 16-bit capture holding `data_size` bytes of audio.
pub fn generate_capture_header(sample_rate: u32, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    WavHeader::capture(sample_rate, data_size).to_bytes()
}

/// Whether `extra` more data bytes still fit in the 32-bit size fields.
pub fn fits_in_riff(data_size: u64, extra: u64) -> bool {
    data_size.checked_add(extra).is_some_and(|total| total <= MAX_DATA_SIZE)
}

/// Fields of a canonical PCM header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bit_depth: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header describing a mono 16-bit capture.
    pub fn capture(sample_rate: u32, data_size: u32) -> Self {
        let block_align = PCM_CHANNELS * PCM_BIT_DEPTH / 8;
        Self {
            riff_size: data_size.saturating_add(36),
            channels: PCM_CHANNELS,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bit_depth: PCM_BIT_DEPTH,
            data_size,
        }
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut out = Vec::with_capacity(WAV_HEADER_SIZE);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&self.riff_size.to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bit_depth.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&self.data_size.to_le_bytes());

        let mut header = [0u8; WAV_HEADER_SIZE];
        header.copy_from_slice(&out);
        header
    }

    /// Sample frames declared by the data chunk.
    pub fn frame_count(&self) -> u64 {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as u64 / self.block_align as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

/// Parse a canonical 44-byte PCM WAV header.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::SinkError(format!(
            "wav header truncated: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" || &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(CaptureError::SinkError("not a canonical RIFF/WAVE header".into()));
    }
    let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

    if u16_at(20) != FORMAT_PCM {
        return Err(CaptureError::SinkError(format!("unsupported wav format code {}", u16_at(20))));
    }

    Ok(WavHeader {
        riff_size: u32_at(4),
        channels: u16_at(22),
        sample_rate: u32_at(24),
        byte_rate: u32_at(28),
        block_align: u16_at(32),
        bit_depth: u16_at(34),
        data_size: u32_at(40),
    })
}
