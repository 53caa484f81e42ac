//! Compositor (SurfaceFlinger) layer traces.
//!
//! - [`schema`] - wire schema of `LYRTRACE` captures
//! - [`operations`] - layer and entry property rewrites
//! - [`computations`] - z-order, visibility and rects over assembled trees
//! - [`capture`] - synthesized captures
//! - [`SurfaceFlingerParser`] - the [`TraceParser`](crate::core::TraceParser) tying them together

pub mod capture;
pub mod computations;
pub mod operations;
pub mod schema;

mod parser;

pub use parser::*;
