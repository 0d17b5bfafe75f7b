//! Device-side encoding of the wire format.
//!
//! ```text
//! [0x55 0xAA 'S' '1'] [u16 LE sample count N] [N × i16 LE samples]
//! ```

use crate::models::error::CaptureError;
use crate::models::frame::BYTES_PER_SAMPLE;

use super::frame_sync::{HEADER_LEN, MAGIC};

/// Append one encoded frame carrying `samples` to `out`.
pub fn encode_frame(samples: &[i16], out: &mut Vec<u8>) -> Result<(), CaptureError> {
    let count = u16::try_from(samples.len()).map_err(|_| CaptureError::FrameTooLarge(samples.len()))?;

    out.reserve(MAGIC.len() + HEADER_LEN + samples.len() * BYTES_PER_SAMPLE);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&count.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(())
}

/// Encode `samples` as consecutive frames of at most `samples_per_frame`.
pub fn encode_frames(samples: &[i16], samples_per_frame: usize) -> Result<Vec<u8>, CaptureError> {
    if samples_per_frame == 0 {
        return Err(CaptureError::ConfigurationFailed("samples per frame must be positive".into()));
    }
    let mut out = Vec::new();
    for chunk in samples.chunks(samples_per_frame) {
        encode_frame(chunk, &mut out)?;
    }
    Ok(out)
}
