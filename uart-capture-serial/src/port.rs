//! UART byte source.
//!
//! Wraps a `serialport` handle so the generic `StreamSource` adapter can
//! drive it: per-read timeouts map to `SerialPort::set_timeout`, and a
//! timed-out read surfaces as `io::ErrorKind::TimedOut`, which the adapter
//! turns into an empty read.

use std::io::{self, Read};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use uart_capture_core::{StreamSource, TimeoutRead};

use crate::error::SerialError;

/// An open serial port usable as a timeout-bounded `Read`.
pub struct SerialPortStream(Box<dyn SerialPort>);

impl SerialPortStream {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self(port)
    }

    pub fn name(&self) -> Option<String> {
        self.0.name()
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.0.baud_rate().ok()
    }
}

impl Read for SerialPortStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl TimeoutRead for SerialPortStream {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.0.set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Byte source reading from a UART.
pub type SerialByteSource = StreamSource<SerialPortStream>;

/// Open `path` at `baud`, 8 data bits, no parity, one stop bit, no flow
/// control. Bytes already queued in the driver are discarded so the capture
/// starts from live data.
pub fn open_serial(path: &str, baud: u32, read_timeout: Duration) -> Result<SerialByteSource, SerialError> {
    let port = serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(read_timeout)
        .open()
        .map_err(|source| SerialError::Open {
            path: path.to_string(),
            source,
        })?;

    if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
        log::warn!("could not flush input buffer of {}: {}", path, e);
    }

    log::info!("opened {} at {} baud", path, baud);
    Ok(StreamSource::new(
        SerialPortStream::new(port),
        format!("serial {} @ {} baud", path, baud),
    ))
}
