//! # uart-capture-core
//!
//! Transport-agnostic capture of framed 16-bit PCM into WAV files.
//!
//! A device streams frames over an unreliable byte link (UART, TCP, a
//! replayed dump). This crate finds frame boundaries, reads each payload in
//! full, and appends it to a WAV file that stays valid no matter how the
//! capture ends. Transport backends implement the `ByteSource` trait and
//! plug into the generic `CaptureController`.
//!
//! ## Wire format
//!
//! ```text
//! [0x55 0xAA 'S' '1'] [u16 LE sample count N] [N × i16 LE samples]
//! ```
//!
//! ## Architecture
//!
//! ```text
//! uart-capture-core (this crate)
//! ├── traits/       ← ByteSource, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, Frame, FinalStatus
//! ├── processing/   ← SyncWindow, FrameSynchronizer, FrameReader, frame encoder, WAV headers
//! ├── sources/      ← StreamSource (TCP, file replay), ScriptedSource (simulation)
//! ├── session/      ← CaptureController (state machine), start_capture
//! └── storage/      ← WavAccumulator, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::capture_result::{CaptureStatus, FinalStatus, RecordingMetadata};
pub use models::config::CaptureConfiguration;
pub use models::diagnostics::{CaptureDiagnostics, CaptureProgress};
pub use models::error::CaptureError;
pub use models::frame::{Frame, FrameHeader};
pub use models::state::CaptureState;
pub use processing::frame_codec::{encode_frame, encode_frames};
pub use processing::frame_reader::FrameReader;
pub use processing::frame_sync::{FrameSynchronizer, HEADER_LEN, MAGIC};
pub use processing::wav_format::{parse_wav_header, WavHeader};
pub use session::controller::{start_capture, CaptureController, CaptureHandle};
pub use sources::scripted::ScriptedSource;
pub use sources::stream::{StreamSource, TimeoutRead};
pub use storage::wav_writer::{WavAccumulator, WavStorage, WavSummary};
pub use traits::byte_source::ByteSource;
pub use traits::capture_delegate::CaptureDelegate;
