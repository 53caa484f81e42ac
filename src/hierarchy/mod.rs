//! Hierarchy trees: assembly from parent-linked records and the
//! computation passes that annotate them.

mod builder;
mod computation;
mod node;
mod rect;

pub use builder::*;
pub use computation::*;
pub use node::*;
pub use rect::*;
