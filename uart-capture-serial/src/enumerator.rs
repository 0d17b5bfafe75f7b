//! Serial port enumeration.
//!
//! Lists the ports the OS knows about, with USB vendor/product details when
//! the adapter reports them. USB-UART bridges show up here as `Usb`.

use std::fmt;

use serialport::{SerialPortInfo, SerialPortType};

use crate::error::SerialError;

/// How a port is attached to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

/// One serial port available on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
}

impl PortInfo {
    pub fn is_usb(&self) -> bool {
        matches!(self.kind, PortKind::Usb { .. })
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let kind = match info.port_type {
            SerialPortType::UsbPort(usb) => PortKind::Usb {
                vid: usb.vid,
                pid: usb.pid,
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            SerialPortType::PciPort => PortKind::Pci,
            SerialPortType::BluetoothPort => PortKind::Bluetooth,
            SerialPortType::Unknown => PortKind::Unknown,
        };
        Self {
            name: info.port_name,
            kind,
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PortKind::Usb {
                vid,
                pid,
                manufacturer,
                product,
                ..
            } => {
                write!(f, "{}  usb {:04x}:{:04x}", self.name, vid, pid)?;
                let label: Vec<&str> = [manufacturer.as_deref(), product.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                if !label.is_empty() {
                    write!(f, "  {}", label.join(" "))?;
                }
                Ok(())
            }
            PortKind::Pci => write!(f, "{}  pci", self.name),
            PortKind::Bluetooth => write!(f, "{}  bluetooth", self.name),
            PortKind::Unknown => write!(f, "{}", self.name),
        }
    }
}

/// List available serial ports, USB adapters first, then by name.
pub fn list_ports() -> Result<Vec<PortInfo>, SerialError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(SerialError::Enumerate)?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| b.is_usb().cmp(&a.is_usb()).then_with(|| a.name.cmp(&b.name)));
    log::debug!("found {} serial ports", ports.len());
    Ok(ports)
}
