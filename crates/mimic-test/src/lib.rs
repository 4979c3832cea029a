//! MIMIC Test Harness - Synthetic capture and end-to-end validation
//!
//! This crate provides:
//! - Synthetic face, hand and pose landmarks with seeded jitter
//! - A capture simulator running at its own rate, optionally on a thread
//! - End-to-end scenarios over the public avatar API

pub mod capture;
pub mod landmarks;
pub mod scenario;

pub use capture::*;
pub use landmarks::*;
pub use scenario::*;
