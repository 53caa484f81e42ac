//! Utility types and functions for layertrace.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`Rect`] and glam re-exports for screen geometry

mod error;
mod math;

pub use error::*;
pub use math::*;
