//! Line protocol spoken by the pulse sensor
//!
//! The device emits ASCII lines terminated by `\r\n`. The first byte of a
//! line is a tag: `S<digits>` is a waveform sample, `B<digits>` beats per
//! minute, `Q<digits>` the inter-beat interval, `T<number>` a temperature.
//! Lines with any other tag are ignored.
//!
//! - [`LineFramer`] reassembles complete lines from arbitrarily chunked bytes
//! - [`parse_line`] classifies one framed line into a [`crate::types::Reading`]

pub mod framer;
pub mod parser;

pub use framer::LineFramer;
pub use parser::parse_line;
