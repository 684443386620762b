//! Bounded sample queue between the reader thread and the renderer
//!
//! This is the single handoff point for waveform samples. The queue is a
//! bounded crossbeam channel: the reader (sole producer) blocks when the
//! queue is full, so a stalled renderer back-pressures ingestion instead of
//! growing memory. Samples are never dropped on the producer side; the
//! renderer applies its own catch-up policy when it falls behind.

use crate::error::{PulseVisError, Result};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::time::Duration;

/// Create a bounded sample queue, returning the two halves
///
/// The producer half goes to the reader thread; the consumer half to the
/// window buffer. Both halves are cloneable so the controller can keep a
/// consumer handle for shutdown draining.
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let (tx, rx) = bounded(capacity);
    (SampleProducer { tx }, SampleConsumer { rx })
}

/// Producer half of the sample queue
#[derive(Debug, Clone)]
pub struct SampleProducer {
    tx: Sender<i32>,
}

impl SampleProducer {
    /// Push a sample, blocking while the queue is full
    ///
    /// Errors only when every consumer handle has been dropped.
    pub fn push(&self, sample: i32) -> Result<()> {
        self.tx.send(sample).map_err(|_| PulseVisError::QueueClosed)
    }

    /// Push a sample, blocking at most `timeout` while the queue is full
    ///
    /// The reader uses this so a stop request can interrupt a producer that
    /// is parked on a full queue.
    pub fn push_timeout(&self, sample: i32, timeout: Duration) -> std::result::Result<(), SendTimeoutError<i32>> {
        self.tx.send_timeout(sample, timeout)
    }
}

/// Consumer half of the sample queue
#[derive(Debug, Clone)]
pub struct SampleConsumer {
    rx: Receiver<i32>,
}

impl SampleConsumer {
    /// Pop the oldest pending sample without blocking
    pub fn try_pop(&self) -> Option<i32> {
        self.rx.try_recv().ok()
    }

    /// Number of samples currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Discard everything currently queued, returning the count removed
    pub fn drain(&self) -> usize {
        let mut removed = 0;
        while self.try_pop().is_some() {
            removed += 1;
        }
        removed
    }
}
