//! Serial transport abstraction
//!
//! [`SerialTransport`] is the seam between the acquisition core and the
//! platform serial stack, so the reader loop and controller can be exercised
//! against [`crate::backend::mock::MockTransport`] without hardware.
//! [`SerialPortTransport`] is the real implementation over the `serialport`
//! crate.
//!
//! The transport handle is the one resource shared between the reader loop
//! and the stop path; all access goes through a single mutex
//! ([`SharedTransport`]) so closing can never race an in-flight read.

use crate::config::{Parity, SerialConfig};
use crate::error::{PulseVisError, Result};
use crate::types::DeviceDescriptor;
use serialport::{ClearBuffer, FlowControl, SerialPort, SerialPortType};
use std::io::Read;
use std::sync::{Arc, Mutex};

/// A byte-stream handle to an opened serial device
///
/// Implementations must be `Send`: the handle is created on the UI thread
/// and used from the reader thread. Reads are bounded - `read_at_most` never
/// waits longer than the configured port timeout, so the caller never holds
/// the shared mutex indefinitely.
pub trait SerialTransport: Send {
    /// Number of bytes currently buffered and readable without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `max` bytes; may return fewer, or none on a timeout
    fn read_at_most(&mut self, max: usize) -> Result<Vec<u8>>;

    /// Discard anything buffered on the input side
    fn clear_input(&mut self) -> Result<()>;

    /// Whether the handle is still open
    fn is_open(&self) -> bool;

    /// Close the handle; subsequent reads observe a closed transport
    fn close(&mut self);
}

/// Transport handle shared between the reader loop and the stop path
pub type SharedTransport = Arc<Mutex<Box<dyn SerialTransport>>>;

/// Wrap a transport for sharing across threads
pub fn share_transport(transport: impl SerialTransport + 'static) -> SharedTransport {
    Arc::new(Mutex::new(Box::new(transport)))
}

/// Real serial transport over the `serialport` crate
pub struct SerialPortTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortTransport {
    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(PulseVisError::TransportClosed)
    }
}

impl SerialTransport for SerialPortTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn read_at_most(&mut self, max: usize) -> Result<Vec<u8>> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; max];
        match self.port()?.read(&mut buffer) {
            Ok(n) => {
                buffer.truncate(n);
                Ok(buffer)
            }
            // A timeout just means no data arrived within the port timeout.
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        Ok(self.port()?.clear(ClearBuffer::Input)?)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        self.port = None;
    }
}

/// Open a serial device with the configured line parameters
///
/// A permission failure is classified as retryable
/// ([`PulseVisError::PermissionPending`]): the device is present but access
/// has not been granted yet, so the caller should retry once the grant
/// completes rather than report a hard failure.
pub fn open_device(id: &str, config: &SerialConfig) -> Result<SerialPortTransport> {
    let builder = serialport::new(id, config.baud_rate)
        .data_bits(data_bits(config.data_bits)?)
        .parity(map_parity(config.parity))
        .stop_bits(stop_bits(config.stop_bits)?)
        .flow_control(FlowControl::None)
        .timeout(config.timeout());

    match builder.open() {
        Ok(port) => {
            tracing::info!(
                "Opened {} at {} baud ({}{}{})",
                id,
                config.baud_rate,
                config.data_bits,
                parity_letter(config.parity),
                config.stop_bits,
            );
            Ok(SerialPortTransport { port: Some(port) })
        }
        Err(e) if is_permission_denied(&e) => {
            Err(PulseVisError::PermissionPending(format!("{}: {}", id, e)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Enumerate serial endpoints that could carry the sensor stream
///
/// Enumeration failures are a recoverable "no devices" condition, never
/// fatal: they log a warning and return an empty list for the UI to show.
pub fn list_devices() -> Vec<DeviceDescriptor> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|info| {
                let label = match &info.port_type {
                    SerialPortType::UsbPort(usb) => format!(
                        "{}(vid={:04x},pid={:04x})",
                        usb.product.as_deref().unwrap_or(""),
                        usb.vid,
                        usb.pid,
                    ),
                    _ => info.port_name.clone(),
                };
                DeviceDescriptor::new(info.port_name, label)
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

fn is_permission_denied(e: &serialport::Error) -> bool {
    matches!(
        e.kind(),
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
    )
}

fn data_bits(bits: u8) -> Result<serialport::DataBits> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(PulseVisError::Config(format!(
            "Unsupported data bits: {}",
            other
        ))),
    }
}

fn stop_bits(bits: u8) -> Result<serialport::StopBits> {
    match bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        other => Err(PulseVisError::Config(format!(
            "Unsupported stop bits: {}",
            other
        ))),
    }
}

fn map_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn parity_letter(parity: Parity) -> char {
    match parity {
        Parity::None => 'N',
        Parity::Odd => 'O',
        Parity::Even => 'E',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_bits_mapping() {
        assert!(data_bits(8).is_ok());
        assert!(data_bits(5).is_ok());
        assert!(data_bits(9).is_err());
    }

    #[test]
    fn test_stop_bits_mapping() {
        assert!(stop_bits(1).is_ok());
        assert!(stop_bits(2).is_ok());
        assert!(stop_bits(0).is_err());
    }

    #[test]
    fn test_closed_transport_reports_closed() {
        let mut transport = SerialPortTransport { port: None };
        assert!(!transport.is_open());
        assert!(matches!(
            transport.bytes_available(),
            Err(PulseVisError::TransportClosed)
        ));
    }
}
