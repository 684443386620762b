//! PulseVis-RS - live viewer for a serial pulse sensor
//!
//! Reads the ASCII line protocol of a pulse sensor board over a serial
//! port (9600/8/N/1), routes waveform samples through a bounded queue into
//! a scrolling plot, and shows the latest BPM / inter-beat interval /
//! temperature readouts.
//!
//! Layering:
//! - [`protocol`]: line framing and record classification (pure)
//! - [`backend`]: transport, sample queue, reader thread, session control
//! - [`frontend`]: the egui window and the scrolling waveform buffer
//! - [`config`], [`types`], [`error`]: shared plumbing

pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod protocol;
pub mod types;

pub use error::{PulseVisError, Result};
