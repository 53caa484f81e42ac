//! # Layertrace
//!
//! Reader for compositor layer trace captures (`LYRTRACE` files).
//!
//! A capture is a protobuf file of snapshots ("entries"), each listing
//! every layer with its parent and relative-z links. Entries are decoded
//! up front; a snapshot becomes an annotated hierarchy tree only when
//! asked for, and processed trees are cached.
//!
//! ## Modules
//!
//! - [`util`] - Errors and screen geometry
//! - [`wire`] - Schema-driven protobuf decoding
//! - [`core`] - Timestamps, the parser trait, the trace container
//! - [`properties`] - Property trees, operations and lazy providers
//! - [`hierarchy`] - Tree assembly and computation passes
//! - [`surface_flinger`] - The layer trace parser
//! - [`query`] - Custom queries over decoded entries
//!
//! ## Example
//!
//! ```ignore
//! use layertrace::prelude::*;
//!
//! let bytes = std::fs::read("layers_trace.winscope")?;
//! let trace = Trace::load(SurfaceFlingerParser::default(), &bytes)?;
//!
//! let tree = trace.entry(0)?;
//! print!("{}", tree.render());
//! ```

pub mod util;
pub mod wire;
pub mod core;
pub mod properties;
pub mod hierarchy;
pub mod surface_flinger;
pub mod query;

// Re-export commonly used types
pub use util::{Error, Result};
pub use core::{Timestamp, TimestampType, Trace, TraceParser};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Rect};
    pub use crate::core::{Timestamp, TimestampType, Trace, TraceParser, TraceType};
    pub use crate::hierarchy::{HierarchyConfig, HierarchyTree, NodeId, TraceRect};
    pub use crate::properties::{PropertiesProvider, PropertyTree, PropertyValue};
    pub use crate::query::{CustomQueryResult, CustomQueryType};
    pub use crate::surface_flinger::{ParserConfig, SurfaceFlingerParser};
}
