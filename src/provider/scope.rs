//! Scoped service resolution and lifecycle management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::InstanceCache;
use crate::error::DiResult;
use crate::internal::{BoxFutureUnit, DisposeBag};
use crate::key::{key_of_trait, key_of_type, key_of_type_keyed, Key};
use crate::registration::AnyArc;
use crate::traits::{downcast_service, downcast_trait, Resolver, ResolverCore};

use super::{resolve_async_inner, resolve_sync, ResolutionPath, ResolverHandle, ServiceProvider};

/// Scoped service container.
///
/// A scope provides isolated resolution for scoped services while delegating
/// singleton lookups to the root provider. Each scope owns its scoped cache
/// and disposal list; sibling scopes never share scoped instances, and a
/// scoped lookup never falls through to a parent scope.
///
/// Clones share the same scope state, so a scope can be handed to several
/// tasks serving one logical unit of work.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Connection(String);
/// struct Repository { conn: Arc<Connection> }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Connection, _>(|_| Connection("conn-1".to_string()));
/// services.add_transient_factory::<Repository, _>(|r| Repository {
///     conn: r.get_required::<Connection>(),
/// });
///
/// let provider = services.build();
/// let scope = provider.create_scope();
///
/// let a = scope.get_required::<Repository>();
/// let b = scope.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&a.conn, &b.conn)); // one connection per scope
/// ```
pub struct Scope {
    inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    root: ServiceProvider,
    scoped: InstanceCache,
    disposers: Mutex<DisposeBag>,
    closed: AtomicBool,
    depth: u32,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider, depth: u32) -> Self {
        tracing::debug!(target: "rivet_di", depth, "creating scope");
        Self {
            inner: Arc::new(ScopeInner {
                root,
                scoped: InstanceCache::new(),
                disposers: Mutex::new(DisposeBag::default()),
                closed: AtomicBool::new(false),
                depth,
            }),
        }
    }

    /// Creates a child scope with a fresh scoped cache.
    ///
    /// Scopes form a tree; singleton lookups always reach the root, and each
    /// scope keeps its own scoped instances.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.inner.root.clone(), self.inner.depth + 1)
    }

    /// The scope's depth below the root provider (direct children are 1).
    pub fn depth(&self) -> u32 {
        self.inner.depth
    }

    /// Whether this scope has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Closes the scope: runs scoped disposal hooks in reverse build order
    /// and empties the scoped cache. Idempotent and infallible; further
    /// resolution attempts fail with
    /// [`DiError::ScopeClosed`](crate::DiError::ScopeClosed).
    ///
    /// Async disposal hooks cannot run here; use
    /// [`close_async`](Self::close_async) when any were registered.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.disposers.lock().unwrap());
        bag.run_sync_reverse();
        if !bag.is_empty() {
            tracing::warn!(
                target: "rivet_di",
                "scope closed synchronously with pending async disposers; use close_async"
            );
        }
        self.inner.scoped.clear();
        tracing::debug!(target: "rivet_di", depth = self.inner.depth, "scope closed");
    }

    /// Closes the scope, running async disposal hooks first and sync hooks
    /// second, each in reverse build order. Idempotent.
    pub async fn close_async(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.disposers.lock().unwrap());
        bag.run_async_reverse().await;
        bag.run_sync_reverse();
        self.inner.scoped.clear();
        tracing::debug!(target: "rivet_di", depth = self.inner.depth, "scope closed");
    }

    // ----- Async resolution -----

    /// Resolves a concrete service through the async path.
    pub async fn get_async<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any = resolve_async_inner(
            &self.inner.root,
            Some(self),
            &key_of_type::<T>(),
            ResolutionPath::default(),
        )
        .await?;
        downcast_service(any)
    }

    /// Resolves a keyed concrete service through the async path.
    pub async fn get_keyed_async<T: Send + Sync + 'static>(
        &self,
        context: &'static str,
    ) -> DiResult<Arc<T>> {
        let any = resolve_async_inner(
            &self.inner.root,
            Some(self),
            &key_of_type_keyed::<T>(context),
            ResolutionPath::default(),
        )
        .await?;
        downcast_service(any)
    }

    /// Resolves a trait implementation through the async path.
    pub async fn get_trait_async<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let any = resolve_async_inner(
            &self.inner.root,
            Some(self),
            &key_of_trait::<T>(),
            ResolutionPath::default(),
        )
        .await?;
        downcast_trait(any)
    }

    pub(crate) fn scoped_cache(&self) -> &InstanceCache {
        &self.inner.scoped
    }

    pub(crate) fn root(&self) -> &ServiceProvider {
        &self.inner.root
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.inner.depth)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 && !self.is_closed() {
            if let Ok(bag) = self.inner.disposers.try_lock() {
                if !bag.is_empty() {
                    tracing::warn!(
                        target: "rivet_di",
                        "scope dropped with undisposed resources; call close() first"
                    );
                }
            }
        }
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        resolve_sync(&self.inner.root, Some(self), key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner.disposers.lock().unwrap().push_async(f);
    }

    fn handle(&self) -> ResolverHandle {
        ResolverHandle::scoped(self.clone())
    }
}

impl Resolver for Scope {}
