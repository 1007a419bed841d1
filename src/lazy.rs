//! Deferred-resolution handles.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::provider::{ResolutionPath, ResolverHandle};
use crate::traits::downcast_service;

/// A lazy proxy: a handle that resolves its target key on first use and
/// memoizes the result.
///
/// Building the proxy never recurses into the dependency graph, which makes
/// it the supported way to break construction cycles: replace one edge of
/// the cycle with a `Lazy<T>` and materialize it after construction.
/// Resolution errors are not memoized; a failed `get` can be retried.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{Lazy, ServiceCollection, Resolver};
///
/// struct Config { verbose: bool }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { verbose: true });
///
/// let provider = services.build();
/// let lazy: Lazy<Config> = provider.lazy::<Config>();
/// assert!(!lazy.materialized());
/// assert!(lazy.get().unwrap().verbose);
/// assert!(lazy.materialized());
/// ```
pub struct Lazy<T: Send + Sync + 'static> {
    handle: ResolverHandle,
    key: Key,
    cell: OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub(crate) fn new(handle: ResolverHandle, key: Key) -> Self {
        Self {
            handle,
            key,
            cell: OnceCell::new(),
        }
    }

    /// Materializes the target, resolving it on first call and returning
    /// the memoized instance thereafter.
    pub fn get(&self) -> DiResult<Arc<T>> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let resolved = downcast_service::<T>(self.handle.resolve_any(&self.key)?)?;
        Ok(self.cell.get_or_init(|| resolved).clone())
    }

    /// Materializes the target through the async resolve path. Required
    /// when the target (or anything beneath it) has an async initializer.
    pub async fn get_async(&self) -> DiResult<Arc<T>> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let any = self
            .handle
            .resolve_any_async(&self.key, ResolutionPath::default())
            .await?;
        let resolved = downcast_service::<T>(any)?;
        Ok(self.cell.get_or_init(|| resolved).clone())
    }

    /// Whether the target has already been materialized.
    pub fn materialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("target", &self.key.display_name())
            .field("materialized", &self.materialized())
            .finish()
    }
}
