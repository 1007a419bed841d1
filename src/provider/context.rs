//! Resolver contexts handed to provider closures.
//!
//! Synchronous factories receive a borrowed [`ResolverContext`]; async
//! factories receive an owned [`AsyncResolverContext`] so their futures can
//! be `'static`. The async context also carries the explicit resolution
//! path used for cycle detection and lifecycle checks across await points,
//! where the synchronous thread-local stack cannot follow.

use std::sync::Arc;

use crate::error::DiResult;
use crate::internal::{BoxFutureUnit, Frame};
use crate::key::{key_of_trait, key_of_type, key_of_type_keyed, Key};
use crate::lazy::Lazy;
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;
use crate::traits::{downcast_service, downcast_trait, AsyncDispose, Dispose, Resolver, ResolverCore};

use super::scope::Scope;
use super::{resolve_async_inner, ServiceProvider};

/// Context passed to synchronous factory closures for resolving dependencies.
///
/// Wraps the resolver the service is being built against (the root provider
/// for singletons, the current scope for scoped and transient services), so
/// factory closures stay independent of the concrete resolver type.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|r| UserService {
///     db: r.get_required::<Database>(),
/// });
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T: ResolverCore>(resolver: &'a T) -> Self {
        Self { resolver }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolver.resolve_any(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.resolver.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.resolver.push_async_disposer(f);
    }

    fn handle(&self) -> ResolverHandle {
        self.resolver.handle()
    }
}

impl Resolver for ResolverContext<'_> {}

/// Cheap owned handle to a root provider or a scope.
///
/// Backs [`Lazy`] proxies and async contexts, which outlive the borrowed
/// resolution call that created them.
#[derive(Clone)]
pub struct ResolverHandle {
    inner: HandleInner,
}

#[derive(Clone)]
enum HandleInner {
    Root(ServiceProvider),
    Scoped(Scope),
}

impl ResolverHandle {
    pub(crate) fn root(provider: ServiceProvider) -> Self {
        Self {
            inner: HandleInner::Root(provider),
        }
    }

    pub(crate) fn scoped(scope: Scope) -> Self {
        Self {
            inner: HandleInner::Scoped(scope),
        }
    }

    pub(crate) fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match &self.inner {
            HandleInner::Root(provider) => provider.resolve_any(key),
            HandleInner::Scoped(scope) => scope.resolve_any(key),
        }
    }

    pub(crate) async fn resolve_any_async(
        &self,
        key: &Key,
        path: ResolutionPath,
    ) -> DiResult<AnyArc> {
        match &self.inner {
            HandleInner::Root(provider) => {
                resolve_async_inner(provider, None, key, path).await
            }
            HandleInner::Scoped(scope) => {
                resolve_async_inner(scope.root(), Some(scope), key, path).await
            }
        }
    }

    pub(crate) fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        match &self.inner {
            HandleInner::Root(provider) => provider.push_sync_disposer(f),
            HandleInner::Scoped(scope) => scope.push_sync_disposer(f),
        }
    }

    pub(crate) fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        match &self.inner {
            HandleInner::Root(provider) => provider.push_async_disposer(f),
            HandleInner::Scoped(scope) => scope.push_async_disposer(f),
        }
    }
}

/// Explicit in-flight path for the async resolve path.
///
/// The async equivalent of the synchronous thread-local resolution stack:
/// each recursive resolution extends the path, a revisited key is a cycle,
/// and the last frame is the consumer for lifecycle checks.
#[derive(Clone, Default)]
pub(crate) struct ResolutionPath {
    frames: Vec<Frame>,
}

impl ResolutionPath {
    pub(crate) fn consumer(&self) -> Option<Frame> {
        self.frames.last().copied()
    }

    /// Extends the path with a new frame, failing on a revisited key.
    pub(crate) fn extended(&self, name: &'static str, lifetime: Lifetime) -> DiResult<Self> {
        if self.frames.iter().any(|f| f.name == name) {
            let mut path: Vec<&'static str> = self.frames.iter().map(|f| f.name).collect();
            path.push(name);
            return Err(crate::error::DiError::CyclicDependency(path));
        }
        let mut frames = self.frames.clone();
        frames.push(Frame { name, lifetime });
        Ok(Self { frames })
    }
}

/// Context passed to asynchronous factory closures.
///
/// Owns a handle to the resolver the service is being built against, so the
/// factory's future can be `'static`. Dependencies are resolved through the
/// async path and awaited in the order the factory requests them.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{DiResult, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Pool { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_singleton_async_factory::<Pool, _, _>(|ctx| async move {
///     let db = ctx.get::<Database>().await?;
///     Ok(Pool { db })
/// });
/// ```
pub struct AsyncResolverContext {
    handle: ResolverHandle,
    path: ResolutionPath,
}

impl AsyncResolverContext {
    pub(crate) fn new(handle: ResolverHandle, path: ResolutionPath) -> Self {
        Self { handle, path }
    }

    /// Resolves a concrete service through the async path.
    pub async fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any = self
            .handle
            .resolve_any_async(&key_of_type::<T>(), self.path.clone())
            .await?;
        downcast_service(any)
    }

    /// Resolves a keyed concrete service through the async path.
    pub async fn get_keyed<T: Send + Sync + 'static>(
        &self,
        context: &'static str,
    ) -> DiResult<Arc<T>> {
        let any = self
            .handle
            .resolve_any_async(&key_of_type_keyed::<T>(context), self.path.clone())
            .await?;
        downcast_service(any)
    }

    /// Resolves a trait implementation through the async path.
    pub async fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let any = self
            .handle
            .resolve_any_async(&key_of_trait::<T>(), self.path.clone())
            .await?;
        downcast_trait(any)
    }

    /// Returns a lazy proxy for a concrete service.
    pub fn lazy<T: Send + Sync + 'static>(&self) -> Lazy<T> {
        Lazy::new(self.handle.clone(), key_of_type::<T>())
    }

    /// Registers a service for synchronous disposal with the owning scope
    /// or provider.
    pub fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.handle
            .push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal with the owning scope
    /// or provider.
    pub fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.handle.push_async_disposer(Box::new(move || {
            Box::pin(async move {
                service.dispose().await;
            })
        }));
    }
}
