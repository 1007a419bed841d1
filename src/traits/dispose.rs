//! Disposal traits for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// caches, closing connections). Disposal hooks run in reverse build order
/// when the owning scope or provider closes.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{Dispose, ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Cache { name: String }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         println!("flushing cache: {}", self.name);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Cache, _>(|r| {
///     let cache = Arc::new(Cache { name: "user_cache".to_string() });
///     r.register_disposer(cache.clone());
///     Cache { name: "user_cache".to_string() }
/// });
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async disposal hooks run before sync hooks, in reverse build order,
/// when `close_async()` is called on the owning scope or provider.
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
