//! Post-assembly passes over a hierarchy tree.

use crate::hierarchy::HierarchyTree;
use crate::util::Result;

/// A pass that annotates a finished tree.
///
/// Passes run once each, in list order; later passes may read what
/// earlier ones wrote. Running a pass twice must give the same result.
pub trait Computation: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn execute(&self, tree: &mut HierarchyTree) -> Result<()>;
}

/// Ordered list of computations.
pub type ComputationList = &'static [&'static dyn Computation];
