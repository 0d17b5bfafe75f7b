pub mod scripted;
pub mod stream;
