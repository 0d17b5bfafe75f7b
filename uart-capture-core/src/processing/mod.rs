pub mod frame_codec;
pub mod frame_reader;
pub mod frame_sync;
pub mod sync_window;
pub mod wav_format;
