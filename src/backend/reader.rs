//! The acquisition reader loop
//!
//! One reader thread per session. The loop drains whatever the transport
//! has buffered, frames it into lines, classifies each line and routes it:
//! waveform samples into the bounded queue (blocking under backpressure,
//! but never past a stop request), scalar readouts into the shared readout
//! state. The loop owns the framer, so partial lines survive across reads
//! but never across sessions.

use crate::backend::queue::SampleProducer;
use crate::backend::transport::SharedTransport;
use crate::config::AcquisitionConfig;
use crate::error::PulseVisError;
use crate::protocol::{parse_line, LineFramer};
use crate::types::{Reading, ReaderStats, SharedReadouts};
use crossbeam_channel::SendTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a blocked sample push waits before re-checking the stop flag
const PUSH_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Why the reader loop returned
#[derive(Debug)]
pub enum ReaderExit {
    /// The stop flag was cleared; normal shutdown
    Stopped,
    /// The transport was closed or reported itself closed
    TransportClosed,
    /// Every consumer of the sample queue is gone
    QueueClosed,
    /// The transport failed with an unrecoverable error
    Io(PulseVisError),
}

/// The reader half of an acquisition session
///
/// Constructed by the controller and consumed by [`SerialReader::run`] on
/// the spawned thread.
pub struct SerialReader {
    transport: SharedTransport,
    producer: SampleProducer,
    readouts: SharedReadouts,
    running: Arc<AtomicBool>,
    config: AcquisitionConfig,
}

impl SerialReader {
    pub fn new(
        transport: SharedTransport,
        producer: SampleProducer,
        readouts: SharedReadouts,
        running: Arc<AtomicBool>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            transport,
            producer,
            readouts,
            running,
            config,
        }
    }

    /// Run the read loop until stopped or the session dies underneath it
    ///
    /// Returns the exit reason together with the session counters; the
    /// controller retrieves both when it joins the thread.
    pub fn run(self) -> (ReaderExit, ReaderStats) {
        let mut framer = LineFramer::new();
        let mut stats = ReaderStats::default();
        tracing::debug!("Reader loop started");

        let exit = loop {
            if !self.running.load(Ordering::SeqCst) {
                break ReaderExit::Stopped;
            }

            let chunk = match self.read_chunk() {
                Ok(chunk) => chunk,
                Err(PulseVisError::TransportClosed) => break ReaderExit::TransportClosed,
                Err(e) => break ReaderExit::Io(e),
            };

            if chunk.is_empty() {
                std::thread::sleep(self.config.poll_interval());
                continue;
            }
            stats.bytes_read += chunk.len() as u64;

            let mut exited = None;
            for line in framer.feed(&chunk) {
                if line.is_empty() {
                    continue;
                }
                stats.lines_framed += 1;

                match parse_line(&line) {
                    Some(Reading::Waveform(sample)) => {
                        match self.push_sample(sample) {
                            Ok(true) => stats.samples_queued += 1,
                            Ok(false) => {
                                exited = Some(ReaderExit::Stopped);
                                break;
                            }
                            Err(exit) => {
                                exited = Some(exit);
                                break;
                            }
                        }
                    }
                    Some(reading) => {
                        if let Ok(mut readouts) = self.readouts.write() {
                            readouts.apply(reading);
                        }
                    }
                    None => {
                        stats.lines_ignored += 1;
                        tracing::trace!("Ignoring unrecognized line: {:?}", line);
                    }
                }
            }
            if let Some(exit) = exited {
                break exit;
            }
        };

        tracing::info!(
            bytes_read = stats.bytes_read,
            lines_framed = stats.lines_framed,
            samples_queued = stats.samples_queued,
            lines_ignored = stats.lines_ignored,
            "Reader loop finished: {:?}",
            exit,
        );
        (exit, stats)
    }

    /// Pull at most one bounded chunk off the transport
    ///
    /// The transport mutex is held only for the availability probe and the
    /// read itself, never while framing or pushing.
    fn read_chunk(&self) -> crate::error::Result<Vec<u8>> {
        let mut transport = self
            .transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !transport.is_open() {
            return Err(PulseVisError::TransportClosed);
        }

        let available = transport.bytes_available()?;
        if available == 0 {
            return Ok(Vec::new());
        }
        transport.read_at_most(available.min(self.config.max_read_chunk))
    }

    /// Push one sample, waiting under backpressure but honoring stop
    ///
    /// `Ok(true)` means queued, `Ok(false)` means a stop request interrupted
    /// the wait and the sample was dropped.
    fn push_sample(&self, sample: i32) -> std::result::Result<bool, ReaderExit> {
        loop {
            match self.producer.push_timeout(sample, PUSH_RETRY_INTERVAL) {
                Ok(()) => return Ok(true),
                Err(SendTimeoutError::Timeout(_)) => {
                    if !self.running.load(Ordering::SeqCst) {
                        return Ok(false);
                    }
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(ReaderExit::QueueClosed),
            }
        }
    }
}
