//! Service provider: the root resolver of the container.
//!
//! The [`ServiceProvider`] owns the frozen registry, the singleton cache,
//! the root disposal list, and the test-mode overlay. Scoped resolution
//! happens through [`Scope`]s created with
//! [`create_scope`](ServiceProvider::create_scope).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::InstanceCache;
use crate::error::{DiError, DiResult};
use crate::internal::{current_consumer, with_circular_catch, DisposeBag};
use crate::key::{
    key_of_trait, key_of_trait_keyed, key_of_type, key_of_type_keyed, Key,
};
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, BoxFuture, InvokeFn, ProviderCtor, Registration, Registry, SyncCtor};
use crate::traits::{downcast_service, downcast_trait, Resolver, ResolverCore};

pub mod context;
pub mod scope;

pub use context::{AsyncResolverContext, ResolverContext, ResolverHandle};
pub use scope::Scope;

pub(crate) use context::ResolutionPath;

/// Root service provider for resolving dependencies.
///
/// Built from a [`ServiceCollection`](crate::ServiceCollection); resolves
/// services according to their registered lifetimes, caches singletons, and
/// manages their disposal. Cloning is cheap (`Arc` internally) and clones
/// share all state.
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
///
/// let provider = services.build();
/// let users = provider.get_required::<UserService>();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    pub(crate) singletons: InstanceCache,
    pub(crate) root_disposers: Mutex<DisposeBag>,
    pub(crate) overlay: Mutex<HashMap<Key, AnyArc>>,
    pub(crate) test_mode: AtomicBool,
    pub(crate) closed: AtomicBool,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry) -> Self {
        tracing::debug!(
            target: "rivet_di",
            services = registry.len(),
            "building service provider"
        );
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                singletons: InstanceCache::new(),
                root_disposers: Mutex::new(DisposeBag::default()),
                overlay: Mutex::new(HashMap::new()),
                test_mode: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a scope for resolving scoped services.
    ///
    /// The scope delegates singleton lookups to this provider, keeps its own
    /// cache of scoped instances, and disposes them in reverse build order
    /// when closed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rivet_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(u32);
    ///
    /// let mut services = ServiceCollection::new();
    /// let counter = Arc::new(std::sync::Mutex::new(0));
    /// services.add_scoped_factory::<RequestId, _>(move |_| {
    ///     let mut c = counter.lock().unwrap();
    ///     *c += 1;
    ///     RequestId(*c)
    /// });
    ///
    /// let provider = services.build();
    /// let s1 = provider.create_scope();
    /// let s2 = provider.create_scope();
    ///
    /// let a = s1.get_required::<RequestId>();
    /// let b = s1.get_required::<RequestId>();
    /// let c = s2.get_required::<RequestId>();
    /// assert!(Arc::ptr_eq(&a, &b)); // same scope, same instance
    /// assert!(!Arc::ptr_eq(&a, &c)); // sibling scopes are isolated
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone(), 1)
    }

    // ----- Async resolution -----

    /// Resolves a concrete service through the async path.
    ///
    /// Valid for any graph: descriptors with async initializers are awaited
    /// in dependency order, and all-sync graphs resolve exactly as the sync
    /// path would.
    pub async fn get_async<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let any =
            resolve_async_inner(self, None, &key_of_type::<T>(), ResolutionPath::default()).await?;
        downcast_service(any)
    }

    /// Resolves a keyed concrete service through the async path.
    pub async fn get_keyed_async<T: Send + Sync + 'static>(
        &self,
        context: &'static str,
    ) -> DiResult<Arc<T>> {
        let any = resolve_async_inner(
            self,
            None,
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
        let any =
            resolve_async_inner(self, None, &key_of_trait::<T>(), ResolutionPath::default())
                .await?;
        downcast_trait(any)
    }

    // ----- Test mode -----

    /// Enables test mode: the mock overlay is consulted before the registry
    /// on every resolution until [`disable_test_mode`](Self::disable_test_mode).
    pub fn enable_test_mode(&self) {
        self.inner.test_mode.store(true, Ordering::SeqCst);
        tracing::debug!(target: "rivet_di", "test mode enabled");
    }

    /// Disables test mode, clears the mock overlay, and evicts singleton
    /// cache entries built while test mode was active so mock-derived
    /// instances cannot leak. Singletons cached before test mode was enabled
    /// are untouched.
    pub fn disable_test_mode(&self) {
        if !self.inner.test_mode.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.overlay.lock().unwrap().clear();
        self.inner.singletons.evict_test_entries();
        tracing::debug!(target: "rivet_di", "test mode disabled, overlay cleared");
    }

    /// Whether test mode is active.
    pub fn test_mode(&self) -> bool {
        self.inner.test_mode.load(Ordering::SeqCst)
    }

    /// Shadows a concrete service with a mock. The real descriptor stays
    /// registered; the mock wins while test mode is on.
    pub fn mock<T: Send + Sync + 'static>(&self, value: T) {
        self.insert_mock(key_of_type::<T>(), Arc::new(value) as AnyArc);
    }

    /// Shadows a keyed concrete service with a mock.
    pub fn mock_keyed<T: Send + Sync + 'static>(&self, context: &'static str, value: T) {
        self.insert_mock(key_of_type_keyed::<T>(context), Arc::new(value) as AnyArc);
    }

    /// Shadows a trait service with a mock implementation.
    pub fn mock_trait<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) {
        self.insert_mock(key_of_trait::<T>(), Arc::new(value) as AnyArc);
    }

    /// Shadows a keyed trait service with a mock implementation.
    pub fn mock_keyed_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        context: &'static str,
        value: Arc<T>,
    ) {
        self.insert_mock(key_of_trait_keyed::<T>(context), Arc::new(value) as AnyArc);
    }

    /// Removes a concrete service's mock, restoring the real registration.
    pub fn unmock<T: Send + Sync + 'static>(&self) {
        self.inner.overlay.lock().unwrap().remove(&key_of_type::<T>());
    }

    /// Removes a keyed concrete service's mock.
    pub fn unmock_keyed<T: Send + Sync + 'static>(&self, context: &'static str) {
        self.inner
            .overlay
            .lock()
            .unwrap()
            .remove(&key_of_type_keyed::<T>(context));
    }

    /// Removes a trait service's mock.
    pub fn unmock_trait<T: ?Sized + Send + Sync + 'static>(&self) {
        self.inner.overlay.lock().unwrap().remove(&key_of_trait::<T>());
    }

    fn insert_mock(&self, key: Key, value: AnyArc) {
        tracing::debug!(
            target: "rivet_di",
            service = key.display_name(),
            context = ?key.context_key(),
            "mock registered"
        );
        self.inner.overlay.lock().unwrap().insert(key, value);
    }

    // ----- Teardown -----

    /// Closes the provider: runs singleton disposal hooks in reverse build
    /// order and empties the singleton cache. Idempotent; subsequent
    /// resolutions fail with [`DiError::ScopeClosed`].
    ///
    /// Async disposal hooks cannot run here; use
    /// [`close_async`](Self::close_async) when any were registered.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.root_disposers.lock().unwrap());
        bag.run_sync_reverse();
        if !bag.is_empty() {
            tracing::warn!(
                target: "rivet_di",
                "provider closed synchronously with pending async disposers; use close_async"
            );
        }
        self.inner.singletons.clear();
        tracing::debug!(target: "rivet_di", "service provider closed");
    }

    /// Closes the provider, running async disposal hooks first and sync
    /// hooks second, each in reverse build order. Idempotent.
    pub async fn close_async(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.root_disposers.lock().unwrap());
        bag.run_async_reverse().await;
        bag.run_sync_reverse();
        self.inner.singletons.clear();
        tracing::debug!(target: "rivet_di", "service provider closed");
    }

    /// Whether the provider has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    fn mock_for(&self, key: &Key) -> Option<AnyArc> {
        if !self.test_mode() {
            return None;
        }
        self.inner.overlay.lock().unwrap().get(key).cloned()
    }
}

impl Clone for ServiceProvider {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.inner.registry.len())
            .field("test_mode", &self.test_mode())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 && !self.is_closed() {
            if let Ok(bag) = self.inner.root_disposers.try_lock() {
                if !bag.is_empty() {
                    tracing::warn!(
                        target: "rivet_di",
                        "service provider dropped with undisposed resources; call close() first"
                    );
                }
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        resolve_sync(self, None, key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.root_disposers.lock().unwrap().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> crate::internal::BoxFutureUnit + Send>) {
        self.inner.root_disposers.lock().unwrap().push_async(f);
    }

    fn handle(&self) -> ResolverHandle {
        ResolverHandle::root(self.clone())
    }
}

impl Resolver for ServiceProvider {}

/// Synchronous resolution shared by the root provider and scopes.
///
/// Order of checks: closed state, mock overlay, descriptor lookup, async
/// gate, lifecycle compatibility against the consumer frame, then
/// per-lifetime construction under the in-flight stack. The lifecycle check
/// runs before any cache consultation so a cached scoped instance can never
/// satisfy a singleton's dependency.
pub(crate) fn resolve_sync(
    root: &ServiceProvider,
    scope: Option<&Scope>,
    key: &Key,
) -> DiResult<AnyArc> {
    let name = key.display_name();
    let inner = root.inner();

    if inner.closed.load(Ordering::SeqCst) {
        return Err(DiError::ScopeClosed);
    }
    if let Some(scope) = scope {
        if scope.is_closed() {
            return Err(DiError::ScopeClosed);
        }
    }

    if let Some(mock) = root.mock_for(key) {
        tracing::trace!(target: "rivet_di", service = name, "resolved from test overlay");
        return Ok(mock);
    }

    let reg = inner.registry.get(key).ok_or(DiError::Unregistered(name))?;

    if reg.async_init() {
        return Err(DiError::AsyncRequired(name));
    }

    if let Some(consumer) = current_consumer() {
        if !consumer.lifetime.can_depend_on(reg.lifetime) {
            return Err(DiError::LifecycleMismatch {
                consumer: consumer.name,
                consumer_lifetime: consumer.lifetime,
                dependency: name,
                dependency_lifetime: reg.lifetime,
            });
        }
    }

    let ProviderCtor::Sync(ctor) = &reg.ctor else {
        unreachable!("async registrations are rejected above");
    };

    match reg.lifetime {
        Lifetime::Singleton => with_circular_catch(name, Lifetime::Singleton, || {
            let slot = inner.singletons.slot(key, root.test_mode());
            if let Some(value) = slot.get() {
                tracing::trace!(target: "rivet_di", service = name, "singleton cache hit");
                return Ok(value);
            }
            build_in_slot(&slot, ctor, root)
        }),
        Lifetime::Scoped => {
            let Some(scope) = scope else {
                return Err(DiError::ScopeRequired(name));
            };
            with_circular_catch(name, Lifetime::Scoped, || {
                let slot = scope.scoped_cache().slot(key, root.test_mode());
                if let Some(value) = slot.get() {
                    tracing::trace!(target: "rivet_di", service = name, "scoped cache hit");
                    return Ok(value);
                }
                let ctx = ResolverContext::new(scope);
                slot.get_or_try_init(|| ctor(&ctx))
            })
        }
        Lifetime::Transient => with_circular_catch(name, Lifetime::Transient, || match scope {
            Some(scope) => {
                let ctx = ResolverContext::new(scope);
                ctor(&ctx)
            }
            None => {
                let ctx = ResolverContext::new(root);
                ctor(&ctx)
            }
        }),
    }
}

/// Builds a singleton into its slot against the root provider. Singleton
/// dependencies always resolve against the root, never a scope, so a
/// scoped dependency cannot slip in through a factory.
fn build_in_slot(
    slot: &crate::cache::InstanceSlot,
    ctor: &SyncCtor,
    root: &ServiceProvider,
) -> DiResult<AnyArc> {
    let ctx = ResolverContext::new(root);
    slot.get_or_try_init(|| ctor(&ctx))
}

/// Asynchronous resolution shared by the root provider and scopes.
///
/// Sync descriptors delegate to [`resolve_sync`] (same caches, same cycle
/// stack); descriptors with async initializers build under the slot's
/// per-key construction lock so concurrent resolves of one key run the
/// provider exactly once. A resolution cancelled mid-construction releases
/// the lock without publishing anything.
pub(crate) fn resolve_async_inner<'a>(
    root: &'a ServiceProvider,
    scope: Option<&'a Scope>,
    key: &'a Key,
    path: ResolutionPath,
) -> BoxFuture<'a, DiResult<AnyArc>> {
    Box::pin(resolve_async_inner_impl(root, scope, key, path))
}

async fn resolve_async_inner_impl(
    root: &ServiceProvider,
    scope: Option<&Scope>,
    key: &Key,
    path: ResolutionPath,
) -> DiResult<AnyArc> {
    let name = key.display_name();
    let inner = root.inner();

    if inner.closed.load(Ordering::SeqCst) {
        return Err(DiError::ScopeClosed);
    }
    if let Some(scope) = scope {
        if scope.is_closed() {
            return Err(DiError::ScopeClosed);
        }
    }

    if let Some(mock) = root.mock_for(key) {
        return Ok(mock);
    }

    let reg = inner.registry.get(key).ok_or(DiError::Unregistered(name))?;

    if let Some(consumer) = path.consumer() {
        if !consumer.lifetime.can_depend_on(reg.lifetime) {
            return Err(DiError::LifecycleMismatch {
                consumer: consumer.name,
                consumer_lifetime: consumer.lifetime,
                dependency: name,
                dependency_lifetime: reg.lifetime,
            });
        }
    }

    let ProviderCtor::Async(ctor) = &reg.ctor else {
        // Constructor-form descriptors declare their dependency list, so the
        // async path can resolve it (awaiting any async initializers) before
        // invoking the synchronous constructor. Other sync forms resolve
        // exactly as the sync path would.
        if let Some(invoke) = &reg.invoke {
            return resolve_constructor_async(root, scope, key, reg, invoke, path).await;
        }
        return resolve_sync(root, scope, key);
    };

    let new_path = path.extended(name, reg.lifetime)?;

    match reg.lifetime {
        Lifetime::Singleton => {
            let slot = inner.singletons.slot(key, root.test_mode());
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let _build = slot.lock_for_build().await;
            if let Some(value) = slot.get() {
                // Another task won the build while we waited.
                return Ok(value);
            }
            let ctx = AsyncResolverContext::new(ResolverHandle::root(root.clone()), new_path);
            let value = ctor(ctx).await?;
            Ok(slot.publish(value))
        }
        Lifetime::Scoped => {
            let Some(scope) = scope else {
                return Err(DiError::ScopeRequired(name));
            };
            let slot = scope.scoped_cache().slot(key, root.test_mode());
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let _build = slot.lock_for_build().await;
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let ctx = AsyncResolverContext::new(ResolverHandle::scoped(scope.clone()), new_path);
            let value = ctor(ctx).await?;
            Ok(slot.publish(value))
        }
        Lifetime::Transient => {
            let handle = match scope {
                Some(scope) => ResolverHandle::scoped(scope.clone()),
                None => ResolverHandle::root(root.clone()),
            };
            let ctx = AsyncResolverContext::new(handle, new_path);
            ctor(ctx).await
        }
    }
}

/// Async resolution of a constructor-form registration: resolves the
/// declared dependency list through the async path, then invokes the
/// synchronous constructor with the resolved values.
async fn resolve_constructor_async(
    root: &ServiceProvider,
    scope: Option<&Scope>,
    key: &Key,
    reg: &Registration,
    invoke: &InvokeFn,
    path: ResolutionPath,
) -> DiResult<AnyArc> {
    let name = key.display_name();
    let new_path = path.extended(name, reg.lifetime)?;

    match reg.lifetime {
        Lifetime::Singleton => {
            let slot = root.inner().singletons.slot(key, root.test_mode());
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let _build = slot.lock_for_build().await;
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            // Singleton dependencies resolve against the root, never a scope.
            let values = resolve_declared_deps(root, None, reg, &new_path).await?;
            let ctx = ResolverContext::new(root);
            let value = invoke(values, &ctx)?;
            Ok(slot.publish(value))
        }
        Lifetime::Scoped => {
            let Some(scope) = scope else {
                return Err(DiError::ScopeRequired(name));
            };
            let slot = scope.scoped_cache().slot(key, root.test_mode());
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let _build = slot.lock_for_build().await;
            if let Some(value) = slot.get() {
                return Ok(value);
            }
            let values = resolve_declared_deps(root, Some(scope), reg, &new_path).await?;
            let ctx = ResolverContext::new(scope);
            let value = invoke(values, &ctx)?;
            Ok(slot.publish(value))
        }
        Lifetime::Transient => {
            let values = resolve_declared_deps(root, scope, reg, &new_path).await?;
            match scope {
                Some(scope) => {
                    let ctx = ResolverContext::new(scope);
                    invoke(values, &ctx)
                }
                None => {
                    let ctx = ResolverContext::new(root);
                    invoke(values, &ctx)
                }
            }
        }
    }
}

/// Resolves a registration's declared dependency list through the async
/// path, in declaration order, substituting `None` for absent optionals.
async fn resolve_declared_deps(
    root: &ServiceProvider,
    scope: Option<&Scope>,
    reg: &Registration,
    path: &ResolutionPath,
) -> DiResult<Vec<Option<AnyArc>>> {
    let mut values = Vec::with_capacity(reg.dependencies.len());
    for dep in &reg.dependencies {
        let fut = resolve_async_inner(root, scope, &dep.key, path.clone());
        match fut.await {
            Ok(value) => values.push(Some(value)),
            Err(DiError::Unregistered(_)) if dep.optional => values.push(None),
            Err(e) => return Err(e),
        }
    }
    Ok(values)
}
