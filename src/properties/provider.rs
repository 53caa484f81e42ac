//! Per-record property providers with eager and lazy property trees.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::properties::{apply_all, OperationList, PropertySource, PropertyTree};
use crate::util::{Error, Result};

/// Deferred seed of the lazy tree, run at most once.
pub type LazyPropertiesStrategy = Box<dyn FnOnce() -> Result<PropertyTree> + Send>;

enum LazyState {
    Pending(LazyPropertiesStrategy),
    Materializing,
    Ready(Arc<PropertyTree>),
    Failed(Error),
}

/// Properties of one raw record.
///
/// The eager tree is materialized when the provider is built; the lazy
/// tree on first access. A failure of either is cached and returned to
/// every caller, and does not affect other providers.
pub struct PropertiesProvider {
    eager: std::result::Result<Arc<PropertyTree>, Error>,
    lazy: Mutex<LazyState>,
    lazy_ready: Condvar,
    common_ops: OperationList,
    lazy_ops: OperationList,
}

impl PropertiesProvider {
    /// Eager properties, or the error that prevented building them.
    pub fn eager_properties(&self) -> Result<Arc<PropertyTree>> {
        self.eager.clone()
    }

    /// Eager tree if it materialized successfully.
    pub fn eager(&self) -> Option<&PropertyTree> {
        self.eager.as_deref().ok()
    }

    /// Mutable eager tree, for computations annotating a finished node.
    pub(crate) fn eager_mut(&mut self) -> Option<&mut PropertyTree> {
        self.eager.as_mut().ok().map(Arc::make_mut)
    }

    /// Lazy properties, materializing them on first call.
    ///
    /// Concurrent callers wait for the single materialization in progress.
    pub fn lazy_properties(&self) -> Result<Arc<PropertyTree>> {
        let mut state = self.lazy.lock();
        loop {
            match &*state {
                LazyState::Ready(tree) => return Ok(Arc::clone(tree)),
                LazyState::Failed(err) => return Err(err.clone()),
                LazyState::Pending(_) => break,
                LazyState::Materializing => {}
            }
            self.lazy_ready.wait(&mut state);
        }

        let LazyState::Pending(strategy) = std::mem::replace(&mut *state, LazyState::Materializing) else {
            return Err(Error::other("lazy properties in unexpected state"));
        };
        drop(state);

        let result = strategy().and_then(|mut tree| {
            apply_all(self.common_ops, &mut tree)?;
            apply_all(self.lazy_ops, &mut tree)?;
            Ok(Arc::new(tree))
        });

        let mut state = self.lazy.lock();
        *state = match &result {
            Ok(tree) => LazyState::Ready(Arc::clone(tree)),
            Err(err) => LazyState::Failed(err.clone()),
        };
        drop(state);
        self.lazy_ready.notify_all();
        result
    }

    /// True once the lazy tree has been materialized (or has failed).
    pub fn is_lazy_materialized(&self) -> bool {
        matches!(&*self.lazy.lock(), LazyState::Ready(_) | LazyState::Failed(_))
    }
}

impl fmt::Debug for PropertiesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesProvider")
            .field("eager", &self.eager.as_ref().map(|t| t.name()))
            .field("lazy_materialized", &self.is_lazy_materialized())
            .finish()
    }
}

/// Builder for [`PropertiesProvider`].
pub struct PropertiesProviderBuilder {
    eager: Option<PropertyTree>,
    lazy: Option<LazyPropertiesStrategy>,
    common_ops: OperationList,
    eager_ops: OperationList,
    lazy_ops: OperationList,
}

impl Default for PropertiesProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesProviderBuilder {
    pub fn new() -> Self {
        Self {
            eager: None,
            lazy: None,
            common_ops: &[],
            eager_ops: &[],
            lazy_ops: &[],
        }
    }

    /// Seed tree of the eager properties.
    pub fn set_eager_properties(mut self, tree: PropertyTree) -> Self {
        self.eager = Some(tree);
        self
    }

    /// Strategy producing the seed tree of the lazy properties.
    pub fn set_lazy_properties_strategy(mut self, strategy: LazyPropertiesStrategy) -> Self {
        self.lazy = Some(strategy);
        self
    }

    /// Operations applied to both trees, before the tree-specific ones.
    pub fn set_common_operations(mut self, ops: OperationList) -> Self {
        self.common_ops = ops;
        self
    }

    pub fn set_eager_operations(mut self, ops: OperationList) -> Self {
        self.eager_ops = ops;
        self
    }

    pub fn set_lazy_operations(mut self, ops: OperationList) -> Self {
        self.lazy_ops = ops;
        self
    }

    /// Materialize the eager tree and wrap everything in a provider.
    pub fn build(self) -> PropertiesProvider {
        let mut tree = self
            .eager
            .unwrap_or_else(|| PropertyTree::node("", PropertySource::Calculated));
        let eager = apply_all(self.common_ops, &mut tree)
            .and_then(|()| apply_all(self.eager_ops, &mut tree))
            .map(|()| Arc::new(tree));

        if let Err(err) = &eager {
            tracing::debug!(error = %err, "eager properties failed");
        }

        let lazy: LazyPropertiesStrategy = self
            .lazy
            .unwrap_or_else(|| Box::new(|| Ok(PropertyTree::node("", PropertySource::Calculated))));

        PropertiesProvider {
            eager,
            lazy: Mutex::new(LazyState::Pending(lazy)),
            lazy_ready: Condvar::new(),
            common_ops: self.common_ops,
            lazy_ops: self.lazy_ops,
        }
    }
}
