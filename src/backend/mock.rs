//! Mock transport for exercising the acquisition path without hardware
//!
//! [`MockTransportHandle`] lets a test script the byte stream while the
//! reader owns the [`MockTransport`] half: bytes fed through the handle
//! become readable from the transport, chunked however the test chooses.
//! The handle can also close the transport or inject a read failure to
//! cover the shutdown and I/O-error paths.
//!
//! With the `mock-device` feature a [`SimulatedSensor`] shows up in the
//! device list and emits a synthetic pulse waveform, so the full UI can run
//! on a machine with no sensor attached.

use crate::backend::transport::SerialTransport;
use crate::error::{PulseVisError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct MockState {
    buffered: VecDeque<u8>,
    open: bool,
    fail_next_read: bool,
}

/// Test-side handle to a [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    inner: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    /// Create a handle whose transport starts open and empty
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                buffered: VecDeque::new(),
                open: true,
                fail_next_read: false,
            })),
        }
    }

    /// The transport half, to be handed to the reader
    pub fn transport(&self) -> MockTransport {
        MockTransport {
            inner: self.inner.clone(),
        }
    }

    /// Make `bytes` readable from the transport
    pub fn feed(&self, bytes: &[u8]) {
        self.lock().buffered.extend(bytes.iter().copied());
    }

    /// Close the transport out from under the reader
    pub fn close(&self) {
        self.lock().open = false;
    }

    /// Whether the transport half is still open
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Bytes fed but not yet read
    pub fn buffered_len(&self) -> usize {
        self.lock().buffered.len()
    }

    /// Make the next read or availability probe fail with an I/O error
    pub fn fail_next_read(&self) {
        self.lock().fail_next_read = true;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockTransportHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader-side half of the scripted transport
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

impl MockTransport {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_injected_failure(&self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(PulseVisError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected transport failure",
            )));
        }
        Ok(())
    }
}

impl SerialTransport for MockTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        self.take_injected_failure()?;
        let state = self.lock();
        if !state.open {
            return Err(PulseVisError::TransportClosed);
        }
        Ok(state.buffered.len())
    }

    fn read_at_most(&mut self, max: usize) -> Result<Vec<u8>> {
        self.take_injected_failure()?;
        let mut state = self.lock();
        if !state.open {
            return Err(PulseVisError::TransportClosed);
        }
        let n = max.min(state.buffered.len());
        Ok(state.buffered.drain(..n).collect())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.lock().buffered.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn close(&mut self) {
        self.lock().open = false;
    }
}

/// Device id the simulated sensor is listed under
#[cfg(feature = "mock-device")]
pub const SIMULATED_DEVICE_ID: &str = "mock://pulse";

/// Synthetic pulse sensor emitting the real wire protocol
///
/// Generates `S` samples at a fixed rate from a simple beat-shaped
/// waveform, plus periodic `B`/`Q`/`T` readouts, so every layer above the
/// transport sees exactly what the Arduino firmware would produce.
#[cfg(feature = "mock-device")]
pub struct SimulatedSensor {
    started: std::time::Instant,
    emitted: u64,
    buffered: VecDeque<u8>,
    open: bool,
}

#[cfg(feature = "mock-device")]
impl SimulatedSensor {
    const SAMPLE_RATE_HZ: u64 = 50;

    /// Create a sensor whose stream starts at the moment of the call
    pub fn new() -> Self {
        Self {
            started: std::time::Instant::now(),
            emitted: 0,
            buffered: VecDeque::new(),
            open: true,
        }
    }

    /// Synthesize every sample that is due since the last call
    fn pump(&mut self) {
        let due = self.started.elapsed().as_millis() as u64 * Self::SAMPLE_RATE_HZ / 1000;
        while self.emitted < due {
            let t = self.emitted as f64 / Self::SAMPLE_RATE_HZ as f64;
            // A sharp systolic spike on top of a slow baseline, around the
            // midpoint of a 10-bit ADC.
            let phase = (t * 1.2).fract();
            let spike = if phase < 0.12 {
                (phase / 0.12 * std::f64::consts::PI).sin() * 300.0
            } else {
                0.0
            };
            let sample = (512.0 + spike + (t * 0.7).sin() * 40.0) as i32;
            self.buffered.extend(format!("S{}\r\n", sample).bytes());

            if self.emitted % (2 * Self::SAMPLE_RATE_HZ) == 0 {
                self.buffered.extend(b"B72\r\nQ830\r\nT36.6\r\n");
            }
            self.emitted += 1;
        }
    }
}

#[cfg(feature = "mock-device")]
impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mock-device")]
impl SerialTransport for SimulatedSensor {
    fn bytes_available(&mut self) -> Result<usize> {
        if !self.open {
            return Err(PulseVisError::TransportClosed);
        }
        self.pump();
        Ok(self.buffered.len())
    }

    fn read_at_most(&mut self, max: usize) -> Result<Vec<u8>> {
        if !self.open {
            return Err(PulseVisError::TransportClosed);
        }
        self.pump();
        let n = max.min(self.buffered.len());
        Ok(self.buffered.drain(..n).collect())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.buffered.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_then_read() {
        let handle = MockTransportHandle::new();
        let mut transport = handle.transport();

        handle.feed(b"S10\r\n");
        assert_eq!(transport.bytes_available().unwrap(), 5);
        assert_eq!(transport.read_at_most(5).unwrap(), b"S10\r\n");
        assert_eq!(transport.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_bounded_read_leaves_remainder() {
        let handle = MockTransportHandle::new();
        let mut transport = handle.transport();

        handle.feed(b"abcdef");
        assert_eq!(transport.read_at_most(4).unwrap(), b"abcd");
        assert_eq!(handle.buffered_len(), 2);
    }

    #[test]
    fn test_close_is_visible_to_reader() {
        let handle = MockTransportHandle::new();
        let mut transport = handle.transport();

        handle.close();
        assert!(!handle.is_open());
        assert!(!transport.is_open());
        assert!(matches!(
            transport.bytes_available(),
            Err(PulseVisError::TransportClosed)
        ));
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let handle = MockTransportHandle::new();
        let mut transport = handle.transport();

        handle.feed(b"S1\r\n");
        handle.fail_next_read();
        assert!(transport.bytes_available().is_err());
        assert!(transport.bytes_available().is_ok());
    }

    #[cfg(feature = "mock-device")]
    #[test]
    fn test_simulated_sensor_speaks_the_protocol() {
        let mut sensor = SimulatedSensor::new();
        std::thread::sleep(std::time::Duration::from_millis(60));

        let available = sensor.bytes_available().unwrap();
        assert!(available > 0);
        let bytes = sensor.read_at_most(available).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("S"));
        assert!(text.contains("\r\n"));
    }
}
