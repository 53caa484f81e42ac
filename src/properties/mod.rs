//! Property trees, formatters, rewrite operations and providers.
//!
//! A [`PropertiesProvider`] owns the properties of one raw record: an
//! eager tree built up front and a lazy tree built on first access. Both
//! are seeded from the record and rewritten by [`Operation`]s.

mod formatter;
mod operation;
mod provider;
mod tree;

pub use formatter::*;
pub use operation::*;
pub use provider::*;
pub use tree::*;
