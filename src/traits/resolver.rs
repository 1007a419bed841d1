//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::BoxFutureUnit;
use crate::key::{key_of_trait, key_of_trait_keyed, key_of_type, key_of_type_keyed, Key};
use crate::lazy::Lazy;
use crate::provider::ResolverHandle;
use crate::registration::AnyArc;
use crate::traits::{AsyncDispose, Dispose};

/// Downcasts a resolved instance stored as `Arc<T>`.
pub(crate) fn downcast_service<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Downcasts a resolved trait object. Trait instances are stored as
/// `Arc<Arc<dyn T>>` so the outer `Arc` can be type-erased.
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>>
where
    Arc<T>: 'static,
{
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Core resolver trait for object-safe service resolution.
///
/// Handles the low-level mechanics: resolution by key with cycle detection,
/// disposal-hook registration, and handle extraction for deferred resolution.
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed methods on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service by key.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Registers a synchronous disposal hook with the owning scope or provider.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook with the owning scope or provider.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);

    /// A cheap owned handle to the resolver, for lazy proxies and other
    /// deferred resolution.
    fn handle(&self) -> ResolverHandle;
}

/// High-level resolver interface with typed resolution methods.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`](crate::Scope), and the [`ResolverContext`](crate::ResolverContext)
/// handed to factories, making them interchangeable for resolution within
/// their respective contexts.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Mailer: Send + Sync {
///     fn send(&self, to: &str);
/// }
///
/// struct SmtpMailer;
/// impl Mailer for SmtpMailer {
///     fn send(&self, _to: &str) {}
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42usize);
/// services.add_singleton_trait::<dyn Mailer>(Arc::new(SmtpMailer));
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// provider.get_required_trait::<dyn Mailer>().send("ops@example.com");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_service(self.resolve_any(&key_of_type::<T>())?)
    }

    /// Resolves a concrete service registered under a context key.
    fn get_keyed<T: Send + Sync + 'static>(&self, context: &'static str) -> DiResult<Arc<T>> {
        downcast_service(self.resolve_any(&key_of_type_keyed::<T>(context))?)
    }

    /// Resolves a trait implementation.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        downcast_trait(self.resolve_any(&key_of_trait::<T>())?)
    }

    /// Resolves a trait implementation registered under a context key.
    fn get_keyed_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        context: &'static str,
    ) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        downcast_trait(self.resolve_any(&key_of_trait_keyed::<T>(context))?)
    }

    /// Resolves a concrete service, panicking on failure.
    ///
    /// Use when the service is known to be registered and a missing
    /// registration is a configuration bug worth failing fast on.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>().unwrap_or_else(|e| {
            panic!("failed to resolve {}: {e}", std::any::type_name::<T>())
        })
    }

    /// Resolves a keyed concrete service, panicking on failure.
    fn get_keyed_required<T: Send + Sync + 'static>(&self, context: &'static str) -> Arc<T> {
        self.get_keyed::<T>(context).unwrap_or_else(|e| {
            panic!(
                "failed to resolve {} ({context}): {e}",
                std::any::type_name::<T>()
            )
        })
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_trait::<T>().unwrap_or_else(|e| {
            panic!("failed to resolve trait {}: {e}", std::any::type_name::<T>())
        })
    }

    /// Returns a lazy proxy for a concrete service.
    ///
    /// The proxy resolves its target on first [`get`](crate::Lazy::get) and
    /// memoizes the result; building the proxy itself never recurses, which
    /// makes it the supported way to break construction cycles.
    fn lazy<T: Send + Sync + 'static>(&self) -> Lazy<T> {
        Lazy::new(self.handle(), key_of_type::<T>())
    }

    /// Returns a lazy proxy for a keyed concrete service.
    fn lazy_keyed<T: Send + Sync + 'static>(&self, context: &'static str) -> Lazy<T> {
        Lazy::new(self.handle(), key_of_type_keyed::<T>(context))
    }

    /// Registers a service for synchronous disposal when the owning scope
    /// or provider closes. Hooks run in reverse registration order.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal. Async hooks run before
    /// sync hooks, in reverse registration order.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move {
                service.dispose().await;
            })
        }));
    }
}
