//! Acquisition backend
//!
//! Everything between the serial port and the UI: the transport
//! abstraction, the bounded sample queue, the reader loop and the session
//! controller. The UI talks to [`AcquisitionController`] and never touches
//! the transport directly.

pub mod controller;
pub mod mock;
pub mod queue;
pub mod reader;
pub mod transport;

pub use controller::AcquisitionController;
pub use queue::{sample_queue, SampleConsumer, SampleProducer};
pub use reader::{ReaderExit, SerialReader};
pub use transport::{open_device, share_transport, SerialTransport, SharedTransport};

use crate::types::DeviceDescriptor;

/// Every device the user can pick from
///
/// Serial enumeration plus, with the `mock-device` feature, the simulated
/// sensor.
pub fn available_devices() -> Vec<DeviceDescriptor> {
    #[allow(unused_mut)]
    let mut devices = transport::list_devices();

    #[cfg(feature = "mock-device")]
    devices.push(DeviceDescriptor::new(
        mock::SIMULATED_DEVICE_ID,
        "Simulated pulse sensor",
    ));

    devices
}
