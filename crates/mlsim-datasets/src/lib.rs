//! Seeded generators for the toy datasets the simulators display.
//!
//! Every generator takes an explicit `seed`, so the same arguments always
//! produce the same points.

pub mod curves;
pub mod generators;
pub mod noise;

pub use curves::*;
pub use generators::*;
pub use noise::*;
