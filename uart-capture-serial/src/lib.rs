//! # uart-capture-serial
//!
//! Serial-port backend for uart-capture.
//!
//! Provides:
//! - `open_serial`: opens a UART as a `ByteSource` (8N1, no flow control)
//! - `list_ports`: serial port enumeration with USB descriptors
//! - `SerialError`: open/enumeration failures, convertible to `CaptureError`
//!
//! ## Usage
//! ```ignore
//! use std::time::Duration;
//! use uart_capture_core::start_capture;
//! use uart_capture_serial::open_serial;
//!
//! let mut port = open_serial("/dev/ttyUSB0", 921_600, Duration::from_secs(1))?;
//! let status = start_capture(&mut port, 16_000, Some(10.0), "capture.wav")?;
//! ```

pub mod enumerator;
pub mod error;
pub mod port;

pub use enumerator::{list_ports, PortInfo, PortKind};
pub use error::SerialError;
pub use port::{open_serial, SerialByteSource, SerialPortStream};
