pub mod byte_source;
pub mod capture_delegate;
