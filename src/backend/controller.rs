//! Acquisition session lifecycle
//!
//! [`AcquisitionController`] owns the one-at-a-time session: open transport,
//! running reader thread, sample queue and shared readouts. Start is
//! idempotent while a session is active; stop is a no-op when idle. The
//! stop path is careful about ordering so a reader blocked on a full queue
//! can never deadlock the join: clear the flag first, then drain the queue,
//! then join, then close the transport.

use crate::backend::queue::{sample_queue, SampleConsumer};
use crate::backend::reader::{ReaderExit, SerialReader};
use crate::backend::transport::{open_device, SerialTransport, SharedTransport};
use crate::config::AppConfig;
use crate::error::{PulseVisError, Result, ResultExt};
use crate::types::{AcquisitionPhase, DeviceDescriptor, ReaderStats, SharedReadouts};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

struct Session {
    running: Arc<AtomicBool>,
    transport: SharedTransport,
    consumer: SampleConsumer,
    thread: JoinHandle<(ReaderExit, ReaderStats)>,
}

/// Owner of the acquisition session and its lifecycle
pub struct AcquisitionController {
    config: AppConfig,
    readouts: SharedReadouts,
    session: Option<Session>,
    phase: AcquisitionPhase,
}

impl AcquisitionController {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            readouts: crate::types::shared_readouts(),
            session: None,
            phase: AcquisitionPhase::Idle,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> AcquisitionPhase {
        self.phase
    }

    /// Whether a session is active
    pub fn is_running(&self) -> bool {
        self.phase.is_active()
    }

    /// Shared readout state, for the UI to render each frame
    pub fn readouts(&self) -> SharedReadouts {
        self.readouts.clone()
    }

    /// Consumer half of the sample queue of the active session
    pub fn consumer(&self) -> Option<&SampleConsumer> {
        self.session.as_ref().map(|s| &s.consumer)
    }

    /// Start acquiring from the selected device
    ///
    /// A no-op while a session is already active. Failures to open leave
    /// the controller idle; a [`PulseVisError::PermissionPending`] failure
    /// is retryable and the caller should simply call `start` again later.
    pub fn start(&mut self, device: Option<&DeviceDescriptor>) -> Result<()> {
        if self.is_running() {
            tracing::debug!("Start requested while already {}", self.phase);
            return Ok(());
        }

        let device = device.ok_or(PulseVisError::NoDeviceSelected)?;
        self.phase = AcquisitionPhase::Opening;

        let result = self.open_transport(device);
        let mut transport = match result {
            Ok(transport) => transport,
            Err(e) => {
                self.phase = AcquisitionPhase::Idle;
                return Err(e);
            }
        };

        // Whatever the firmware streamed while nobody listened is stale.
        if let Err(e) = transport
            .clear_input()
            .with_context(|| format!("Failed to clear input for {}", device.id))
        {
            self.phase = AcquisitionPhase::Idle;
            return Err(e);
        }

        self.spawn_reader(transport);
        tracing::info!("Acquisition started on {}", device.id);
        Ok(())
    }

    /// Start acquiring from an already-open transport
    ///
    /// Used by tests to drive the full pipeline over a scripted transport.
    pub fn start_with_transport(&mut self, transport: impl SerialTransport + 'static) {
        if self.is_running() {
            return;
        }
        self.spawn_reader(Box::new(transport));
    }

    fn open_transport(&self, device: &DeviceDescriptor) -> Result<Box<dyn SerialTransport>> {
        #[cfg(feature = "mock-device")]
        if device.id == crate::backend::mock::SIMULATED_DEVICE_ID {
            return Ok(Box::new(crate::backend::mock::SimulatedSensor::new()));
        }

        let transport = open_device(&device.id, &self.config.serial)
            .with_context(|| format!("Failed to open {}", device.id))?;
        Ok(Box::new(transport))
    }

    fn spawn_reader(&mut self, transport: Box<dyn SerialTransport>) {
        let transport = Arc::new(std::sync::Mutex::new(transport));
        let (producer, consumer) = sample_queue(self.config.acquisition.queue_capacity);
        let running = Arc::new(AtomicBool::new(true));

        let reader = SerialReader::new(
            transport.clone(),
            producer,
            self.readouts.clone(),
            running.clone(),
            self.config.acquisition.clone(),
        );
        let thread = std::thread::spawn(move || reader.run());

        self.session = Some(Session {
            running,
            transport,
            consumer,
            thread,
        });
        self.phase = AcquisitionPhase::Running;
    }

    /// Stop the active session and join the reader
    ///
    /// A no-op when idle. Returns the session counters when a reader was
    /// actually joined.
    pub fn stop(&mut self) -> Option<ReaderStats> {
        let session = self.session.take()?;
        self.phase = AcquisitionPhase::Stopping;

        session.running.store(false, Ordering::SeqCst);
        // Unblock a producer parked on a full queue before joining.
        session.consumer.drain();

        let stats = match session.thread.join() {
            Ok((exit, stats)) => {
                tracing::info!("Reader joined: {:?}", exit);
                Some(stats)
            }
            Err(_) => {
                tracing::error!("Reader thread panicked");
                None
            }
        };
        session.consumer.drain();

        session
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .close();

        if let Ok(mut readouts) = self.readouts.write() {
            readouts.clear();
        }
        self.phase = AcquisitionPhase::Idle;
        tracing::info!("Acquisition stopped");
        stats
    }

    /// Notice a reader that died on its own
    ///
    /// Called from the UI each frame. When the reader thread has exited
    /// without a stop request, the session is torn down and a message
    /// describing the cause is returned for display.
    pub fn poll_health(&mut self) -> Option<String> {
        if !self.session.as_ref()?.thread.is_finished() {
            return None;
        }

        let session = self.session.take()?;
        let message = match session.thread.join() {
            Ok((ReaderExit::Stopped, _)) => None,
            Ok((ReaderExit::TransportClosed, _)) => {
                Some("Device disconnected".to_string())
            }
            Ok((ReaderExit::QueueClosed, _)) => {
                Some("Sample queue closed unexpectedly".to_string())
            }
            Ok((ReaderExit::Io(e), _)) => Some(format!("Read failed: {}", e)),
            Err(_) => Some("Reader thread panicked".to_string()),
        };

        session
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .close();
        if let Ok(mut readouts) = self.readouts.write() {
            readouts.clear();
        }
        self.phase = AcquisitionPhase::Idle;

        if let Some(msg) = &message {
            tracing::warn!("Acquisition ended on its own: {}", msg);
        }
        message
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockTransportHandle;
    use std::time::{Duration, Instant};

    fn wait_for(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_stop_when_idle_is_a_noop() {
        let mut controller = AcquisitionController::new(AppConfig::default());
        assert!(controller.stop().is_none());
        assert_eq!(controller.phase(), AcquisitionPhase::Idle);
    }

    #[test]
    fn test_start_without_device_fails() {
        let mut controller = AcquisitionController::new(AppConfig::default());
        assert!(matches!(
            controller.start(None),
            Err(PulseVisError::NoDeviceSelected)
        ));
        assert_eq!(controller.phase(), AcquisitionPhase::Idle);
    }

    #[test]
    fn test_session_lifecycle_over_mock_transport() {
        let handle = MockTransportHandle::new();
        let mut controller = AcquisitionController::new(AppConfig::default());

        controller.start_with_transport(handle.transport());
        assert_eq!(controller.phase(), AcquisitionPhase::Running);

        handle.feed(b"S100\r\nB65\r\n");
        let consumer = controller.consumer().unwrap().clone();
        assert!(wait_for(Duration::from_secs(2), || consumer.len() == 1));
        assert_eq!(consumer.try_pop(), Some(100));

        let stats = controller.stop().expect("stats");
        assert_eq!(stats.samples_queued, 1);
        assert_eq!(controller.phase(), AcquisitionPhase::Idle);

        // Readouts are cleared on stop.
        assert_eq!(
            *controller.readouts().read().unwrap(),
            crate::types::Readouts::default()
        );
    }

    #[test]
    fn test_second_start_is_ignored_while_running() {
        let first = MockTransportHandle::new();
        let second = MockTransportHandle::new();
        let mut controller = AcquisitionController::new(AppConfig::default());

        controller.start_with_transport(first.transport());
        controller.start_with_transport(second.transport());

        // The second transport was never adopted, so closing the first
        // ends the (only) session.
        first.close();
        assert!(wait_for(Duration::from_secs(2), || {
            controller.poll_health().is_some()
        }));
        assert_eq!(controller.phase(), AcquisitionPhase::Idle);
    }

    #[test]
    fn test_stop_completes_with_blocked_producer() {
        let handle = MockTransportHandle::new();
        let mut config = AppConfig::default();
        config.acquisition.queue_capacity = 2;
        let mut controller = AcquisitionController::new(config);

        controller.start_with_transport(handle.transport());
        handle.feed(b"S1\r\nS2\r\nS3\r\nS4\r\n");

        let consumer = controller.consumer().unwrap().clone();
        assert!(wait_for(Duration::from_secs(2), || consumer.len() == 2));

        let start = Instant::now();
        assert!(controller.stop().is_some());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_poll_health_reports_disconnect() {
        let handle = MockTransportHandle::new();
        let mut controller = AcquisitionController::new(AppConfig::default());

        controller.start_with_transport(handle.transport());
        assert!(controller.poll_health().is_none());

        handle.close();
        assert!(wait_for(Duration::from_secs(2), || {
            if let Some(msg) = controller.poll_health() {
                assert!(msg.contains("disconnected"));
                true
            } else {
                false
            }
        }));
        assert_eq!(controller.phase(), AcquisitionPhase::Idle);
    }
}
