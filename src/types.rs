//! Core data types shared between the acquisition backend and the UI
//!
//! These types are deliberately small: everything that crosses the thread
//! boundary is either `Copy` or cheap to clone.

use std::sync::{Arc, RwLock};

/// A serial endpoint that can be opened for acquisition
///
/// `id` is the opaque transport handle string (the OS port path);
/// `label` is human-readable and only used for selection UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Opaque identifier passed to the transport layer to open the device
    pub id: String,
    /// Human-readable name, e.g. `CP2102 USB to UART(vid=10c4,pid=ea60)`
    pub label: String,
}

impl DeviceDescriptor {
    /// Create a descriptor from a port path and a display label
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// One typed reading extracted from a framed protocol line
///
/// Produced by [`crate::protocol::parse_line`] and consumed immediately;
/// no history is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Raw pulse waveform sample (`S<digits>`)
    Waveform(i32),
    /// Beats per minute (`B<digits>`)
    Bpm(i32),
    /// Inter-beat interval in milliseconds (`Q<digits>`)
    Ibi(i32),
    /// Temperature in degrees (`T<number>`)
    Temperature(f64),
}

/// Latest scalar readouts published by the reader
///
/// Overwrite-in-place, last-value-wins; the waveform stream goes through
/// the sample queue instead.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readouts {
    /// Most recent BPM value, if any was received
    pub bpm: Option<i32>,
    /// Most recent inter-beat interval, if any was received
    pub ibi: Option<i32>,
    /// Most recent temperature, if any was received
    pub temperature: Option<f64>,
}

impl Readouts {
    /// Fold a scalar reading into the current state.
    /// Waveform readings are routed through the sample queue, not here.
    pub fn apply(&mut self, reading: Reading) {
        match reading {
            Reading::Bpm(v) => self.bpm = Some(v),
            Reading::Ibi(v) => self.ibi = Some(v),
            Reading::Temperature(v) => self.temperature = Some(v),
            Reading::Waveform(_) => {}
        }
    }

    /// Forget all values (used when a session stops)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Shared handle to the readout state, written by the reader thread and
/// read by the UI on every frame.
pub type SharedReadouts = Arc<RwLock<Readouts>>;

/// Create a fresh shared readout state
pub fn shared_readouts() -> SharedReadouts {
    Arc::new(RwLock::new(Readouts::default()))
}

/// Lifecycle phase of the single acquisition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionPhase {
    /// No transport open, no reader running
    #[default]
    Idle,
    /// Transport is being opened
    Opening,
    /// Reader thread is active
    Running,
    /// Stop requested; waiting for the reader to join
    Stopping,
}

impl AcquisitionPhase {
    /// Whether a reader thread is (or is about to be) active
    pub fn is_active(&self) -> bool {
        matches!(self, AcquisitionPhase::Opening | AcquisitionPhase::Running)
    }
}

impl std::fmt::Display for AcquisitionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AcquisitionPhase::Idle => "idle",
            AcquisitionPhase::Opening => "opening",
            AcquisitionPhase::Running => "running",
            AcquisitionPhase::Stopping => "stopping",
        };
        write!(f, "{}", s)
    }
}

/// Counters kept by the reader loop, logged when the session ends
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderStats {
    /// Raw bytes pulled off the transport
    pub bytes_read: u64,
    /// Complete lines produced by the framer (empty fragments excluded)
    pub lines_framed: u64,
    /// Waveform samples handed to the queue
    pub samples_queued: u64,
    /// Lines with an unknown tag or no extractable value
    pub lines_ignored: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readouts_apply_overwrites() {
        let mut r = Readouts::default();
        r.apply(Reading::Bpm(70));
        r.apply(Reading::Bpm(72));
        r.apply(Reading::Ibi(830));
        r.apply(Reading::Temperature(36.5));
        assert_eq!(r.bpm, Some(72));
        assert_eq!(r.ibi, Some(830));
        assert_eq!(r.temperature, Some(36.5));
    }

    #[test]
    fn test_readouts_ignore_waveform() {
        let mut r = Readouts::default();
        r.apply(Reading::Waveform(512));
        assert_eq!(r, Readouts::default());
    }

    #[test]
    fn test_phase_activity() {
        assert!(!AcquisitionPhase::Idle.is_active());
        assert!(AcquisitionPhase::Opening.is_active());
        assert!(AcquisitionPhase::Running.is_active());
        assert!(!AcquisitionPhase::Stopping.is_active());
    }
}
