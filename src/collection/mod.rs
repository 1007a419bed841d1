//! Service collection: the registration surface of the container.
//!
//! Services are registered on a [`ServiceCollection`], which is consumed by
//! [`build`](ServiceCollection::build) into an immutable
//! [`ServiceProvider`](crate::ServiceProvider).

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use crate::descriptor::{DependencySpec, ProviderKind, ServiceDescriptor};
use crate::error::{BoxError, DiError, DiResult};
use crate::key::{
    key_of_trait, key_of_trait_keyed, key_of_type, key_of_type_keyed, Key,
};
use crate::lifetime::Lifetime;
use crate::provider::{AsyncResolverContext, ResolverContext, ServiceProvider};
use crate::registration::{AnyArc, AsyncCtor, InvokeFn, Registration, Registry, SyncCtor};
use crate::traits::{downcast_service, downcast_trait};
use crate::ResolverCore;

pub mod modules;
pub use modules::{ServiceCollectionModuleExt, ServiceModule};

/// Collects service registrations and builds the service provider.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Config { pool: u32 }
/// struct Database { pool: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { pool: 10 });
/// services.add_singleton_factory::<Database, _>(|r| Database {
///     pool: r.get_required::<Config>().pool,
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<Database>().pool, 10);
/// ```
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    // ----- Instance registrations -----

    /// Registers a pre-built singleton instance, shared across the whole
    /// application. Instance providers are always singletons.
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        let arc = Arc::new(value);
        let ctor: SyncCtor = Arc::new(move |_| Ok(arc.clone() as AnyArc));
        self.insert(
            key_of_type::<T>(),
            Registration::sync(Lifetime::Singleton, ProviderKind::Instance, ctor),
        )
    }

    /// Registers a pre-built singleton instance under a context key.
    ///
    /// Several registrations of one type can coexist under distinct
    /// context keys and are resolved with
    /// [`get_keyed`](crate::Resolver::get_keyed).
    pub fn add_keyed_singleton<T: Send + Sync + 'static>(
        &mut self,
        context: &'static str,
        value: T,
    ) -> &mut Self {
        let arc = Arc::new(value);
        let ctor: SyncCtor = Arc::new(move |_| Ok(arc.clone() as AnyArc));
        self.insert(
            key_of_type_keyed::<T>(context),
            Registration::sync(Lifetime::Singleton, ProviderKind::Instance, ctor),
        )
    }

    /// Registers a pre-built trait implementation as a singleton.
    pub fn add_singleton_trait<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> &mut Self {
        // Stored as Arc<Arc<dyn T>> so the outer Arc can be type-erased.
        let any: AnyArc = Arc::new(value);
        let ctor: SyncCtor = Arc::new(move |_| Ok(any.clone()));
        self.insert(
            key_of_trait::<T>(),
            Registration::sync(Lifetime::Singleton, ProviderKind::Instance, ctor),
        )
    }

    /// Registers a pre-built trait implementation under a context key.
    pub fn add_keyed_singleton_trait<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        context: &'static str,
        value: Arc<T>,
    ) -> &mut Self {
        let any: AnyArc = Arc::new(value);
        let ctor: SyncCtor = Arc::new(move |_| Ok(any.clone()));
        self.insert(
            key_of_trait_keyed::<T>(context),
            Registration::sync(Lifetime::Singleton, ProviderKind::Instance, ctor),
        )
    }

    // ----- Factory registrations -----

    /// Registers a singleton factory, called once on first resolution. The
    /// factory pulls whatever it needs from the resolver argument.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory, called once per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers a transient factory, called on every resolution.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type::<T>(), Lifetime::Transient, factory)
    }

    /// Registers a singleton factory under a context key.
    pub fn add_keyed_singleton_factory<T, F>(
        &mut self,
        context: &'static str,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type_keyed::<T>(context), Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory under a context key.
    pub fn add_keyed_scoped_factory<T, F>(
        &mut self,
        context: &'static str,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type_keyed::<T>(context), Lifetime::Scoped, factory)
    }

    /// Registers a transient factory under a context key.
    pub fn add_keyed_transient_factory<T, F>(
        &mut self,
        context: &'static str,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type_keyed::<T>(context), Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, key: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |r: &ResolverContext| Ok(Arc::new(factory(r)) as AnyArc));
        self.insert(key, Registration::sync(lifetime, ProviderKind::Factory, ctor))
    }

    // ----- Fallible factory registrations -----

    /// Registers a fallible singleton factory. An `Err` is wrapped into
    /// [`DiError::ConstructionFailed`] naming the service; the failing key
    /// is not cached and the next resolution retries.
    pub fn add_singleton_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add_try_factory(key_of_type::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a fallible scoped factory.
    pub fn add_scoped_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add_try_factory(key_of_type::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers a fallible transient factory.
    pub fn add_transient_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add_try_factory(key_of_type::<T>(), Lifetime::Transient, factory)
    }

    fn add_try_factory<T, F>(&mut self, key: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |r: &ResolverContext| {
            factory(r)
                .map(|v| Arc::new(v) as AnyArc)
                .map_err(|e| DiError::construction(std::any::type_name::<T>(), e))
        });
        self.insert(key, Registration::sync(lifetime, ProviderKind::Factory, ctor))
    }

    // ----- Trait factory registrations -----

    /// Registers a singleton trait factory.
    pub fn add_singleton_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        self.add_trait_factory(key_of_trait::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a scoped trait factory.
    pub fn add_scoped_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        self.add_trait_factory(key_of_trait::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers a transient trait factory.
    pub fn add_transient_trait_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        self.add_trait_factory(key_of_trait::<T>(), Lifetime::Transient, factory)
    }

    fn add_trait_factory<T, F>(&mut self, key: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |r: &ResolverContext| Ok(Arc::new(factory(r)) as AnyArc));
        self.insert(key, Registration::sync(lifetime, ProviderKind::Factory, ctor))
    }

    // ----- Async factory registrations -----

    /// Registers an async singleton factory, resolvable only through the
    /// async path. Concurrent first resolutions run the factory exactly
    /// once; losers await the winner's instance.
    pub fn add_singleton_async_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_async_factory(key_of_type::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers an async scoped factory.
    pub fn add_scoped_async_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_async_factory(key_of_type::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers an async transient factory.
    pub fn add_transient_async_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_async_factory(key_of_type::<T>(), Lifetime::Transient, factory)
    }

    fn add_async_factory<T, F, Fut>(&mut self, key: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        let ctor: AsyncCtor = Arc::new(move |ctx: AsyncResolverContext| {
            let fut = factory(ctx);
            Box::pin(async move { fut.await.map(|v| Arc::new(v) as AnyArc) })
        });
        self.insert(key, Registration::asynchronous(lifetime, ctor))
    }

    // ----- Constructor-form registrations -----

    /// Starts a singleton registration with a declared dependency list.
    ///
    /// Dependencies are resolved by the container in declaration order and
    /// handed to the constructor closure positionally; the declared list is
    /// fixed at registration and visible through
    /// [`service_descriptors`](Self::service_descriptors).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rivet_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Database { url: String }
    /// struct Metrics;
    /// struct UserService {
    ///     db: Arc<Database>,
    ///     metrics: Option<Arc<Metrics>>,
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services
    ///     .add_singleton_ctor::<UserService>()
    ///     .depends_on::<Database>()
    ///     .depends_on_optional::<Metrics>()
    ///     .provide(|args| {
    ///         Ok(UserService {
    ///             db: args.next::<Database>()?,
    ///             metrics: args.next_optional::<Metrics>()?,
    ///         })
    ///     });
    ///
    /// let provider = services.build();
    /// let users = provider.get_required::<UserService>();
    /// assert!(users.metrics.is_none()); // Metrics was never registered
    /// ```
    pub fn add_singleton_ctor<T: Send + Sync + 'static>(&mut self) -> ConstructorBinding<'_, T> {
        ConstructorBinding::new(self, Lifetime::Singleton)
    }

    /// Starts a scoped registration with a declared dependency list.
    pub fn add_scoped_ctor<T: Send + Sync + 'static>(&mut self) -> ConstructorBinding<'_, T> {
        ConstructorBinding::new(self, Lifetime::Scoped)
    }

    /// Starts a transient registration with a declared dependency list.
    pub fn add_transient_ctor<T: Send + Sync + 'static>(&mut self) -> ConstructorBinding<'_, T> {
        ConstructorBinding::new(self, Lifetime::Transient)
    }

    // ----- Conditional registration -----

    /// Registers a singleton instance only if the key is absent. Returns
    /// whether the registration was inserted.
    pub fn try_add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        if self.registry.contains_key(&key_of_type::<T>()) {
            return false;
        }
        self.add_singleton(value);
        true
    }

    /// Registers a singleton factory only if the key is absent.
    pub fn try_add_singleton_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        if self.registry.contains_key(&key_of_type::<T>()) {
            return false;
        }
        self.add_singleton_factory(factory);
        true
    }

    /// Registers a scoped factory only if the key is absent.
    pub fn try_add_scoped_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        if self.registry.contains_key(&key_of_type::<T>()) {
            return false;
        }
        self.add_scoped_factory(factory);
        true
    }

    /// Registers a transient factory only if the key is absent.
    pub fn try_add_transient_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        if self.registry.contains_key(&key_of_type::<T>()) {
            return false;
        }
        self.add_transient_factory(factory);
        true
    }

    /// Registers a singleton trait implementation only if the key is absent.
    pub fn try_add_singleton_trait<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<T>,
    ) -> bool {
        if self.registry.contains_key(&key_of_trait::<T>()) {
            return false;
        }
        self.add_singleton_trait(value);
        true
    }

    // ----- Introspection -----

    /// Descriptors for every registered service, for diagnostics and
    /// configuration validation.
    pub fn service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry
            .iter()
            .map(|(key, registration)| registration.descriptor(key))
            .collect()
    }

    /// Whether a concrete service is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.registry.contains_key(&key_of_type::<T>())
    }

    /// Builds the immutable service provider, consuming the collection.
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.registry)
    }

    fn insert(&mut self, key: Key, registration: Registration) -> &mut Self {
        self.registry.insert(key, registration);
        self
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

// ----- Constructor binding -----

type PropertySetter<T> = Arc<dyn Fn(&mut T, &ResolverContext) -> DiResult<()> + Send + Sync>;

struct PropertyInjection<T> {
    name: &'static str,
    setter: PropertySetter<T>,
}

/// Builder for a registration with a declared dependency list and optional
/// post-construction property injections.
///
/// Created by [`add_singleton_ctor`](ServiceCollection::add_singleton_ctor)
/// and friends; finished with [`provide`](Self::provide).
pub struct ConstructorBinding<'c, T> {
    collection: &'c mut ServiceCollection,
    lifetime: Lifetime,
    context: Option<&'static str>,
    dependencies: Vec<DependencySpec>,
    injections: Vec<PropertyInjection<T>>,
}

impl<'c, T: Send + Sync + 'static> ConstructorBinding<'c, T> {
    fn new(collection: &'c mut ServiceCollection, lifetime: Lifetime) -> Self {
        Self {
            collection,
            lifetime,
            context: None,
            dependencies: Vec::new(),
            injections: Vec::new(),
        }
    }

    /// Registers this service under a context key instead of the bare type.
    pub fn keyed(mut self, context: &'static str) -> Self {
        self.context = Some(context);
        self
    }

    /// Declares a required dependency, resolved in declaration order.
    pub fn depends_on<D: Send + Sync + 'static>(mut self) -> Self {
        self.dependencies.push(DependencySpec::required(key_of_type::<D>()));
        self
    }

    /// Declares a required dependency registered under a context key.
    pub fn depends_on_keyed<D: Send + Sync + 'static>(mut self, context: &'static str) -> Self {
        self.dependencies
            .push(DependencySpec::required(key_of_type_keyed::<D>(context)));
        self
    }

    /// Declares an optional dependency: if unregistered, the constructor
    /// receives `None` instead of the resolution failing. Any error other
    /// than [`DiError::Unregistered`] still propagates.
    pub fn depends_on_optional<D: Send + Sync + 'static>(mut self) -> Self {
        self.dependencies.push(DependencySpec::optional(key_of_type::<D>()));
        self
    }

    /// Declares a required trait-object dependency.
    pub fn depends_on_trait<D: ?Sized + Send + Sync + 'static>(mut self) -> Self {
        self.dependencies.push(DependencySpec::required(key_of_trait::<D>()));
        self
    }

    /// Declares a post-construction property injection: after the
    /// constructor returns, the setter runs against the new instance with
    /// a resolver for pulling the injected dependency.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rivet_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Logger { level: &'static str }
    /// #[derive(Default)]
    /// struct Worker { logger: Option<Arc<Logger>> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Logger { level: "info" });
    /// services
    ///     .add_transient_ctor::<Worker>()
    ///     .inject_property("logger", |worker, r| {
    ///         worker.logger = Some(r.get::<Logger>()?);
    ///         Ok(())
    ///     })
    ///     .provide(|_| Ok(Worker::default()));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Worker>().logger.as_ref().unwrap().level, "info");
    /// ```
    pub fn inject_property<F>(mut self, name: &'static str, setter: F) -> Self
    where
        F: Fn(&mut T, &ResolverContext) -> DiResult<()> + Send + Sync + 'static,
    {
        self.injections.push(PropertyInjection {
            name,
            setter: Arc::new(setter),
        });
        self
    }

    /// Finishes the registration with the constructor closure.
    ///
    /// At resolution time the container resolves the declared dependencies
    /// in order, hands them to the closure as positional [`ResolvedArgs`],
    /// runs the property injections against the new instance, and stores it
    /// per the registration's lifetime.
    pub fn provide<F>(self, ctor: F) -> &'c mut ServiceCollection
    where
        F: Fn(&mut ResolvedArgs) -> DiResult<T> + Send + Sync + 'static,
    {
        let ConstructorBinding {
            collection,
            lifetime,
            context,
            dependencies,
            injections,
        } = self;

        let service_name = std::any::type_name::<T>();
        let injection_names: Vec<&'static str> = injections.iter().map(|i| i.name).collect();
        let dep_names: Vec<&'static str> = dependencies.iter().map(|d| d.name).collect();

        // Invocation half: positional resolved values in, instance out.
        // The async path resolves the declared list itself and calls this
        // directly, which is what lets a sync constructor sit on top of
        // async dependencies.
        let invoke: InvokeFn = Arc::new(move |values: Vec<Option<AnyArc>>, r: &ResolverContext| {
            let values = dep_names
                .iter()
                .zip(values)
                .map(|(name, value)| ResolvedArg { name: *name, value })
                .collect();
            let mut args = ResolvedArgs {
                service: service_name,
                values,
            };
            let mut instance = ctor(&mut args)?;
            for injection in &injections {
                (injection.setter)(&mut instance, r)?;
            }
            Ok(Arc::new(instance) as AnyArc)
        });

        // Resolution half for the sync path: resolve the declared list in
        // order, substituting None for absent optionals, then invoke.
        let sync: SyncCtor = {
            let deps = dependencies.clone();
            let invoke = invoke.clone();
            Arc::new(move |r: &ResolverContext| {
                let mut values = Vec::with_capacity(deps.len());
                for dep in &deps {
                    match r.resolve_any(&dep.key) {
                        Ok(value) => values.push(Some(value)),
                        Err(DiError::Unregistered(_)) if dep.optional => values.push(None),
                        Err(e) => return Err(e),
                    }
                }
                invoke(values, r)
            })
        };

        let registration =
            Registration::constructor(lifetime, sync, invoke, dependencies, injection_names);
        let key = match context {
            Some(context) => key_of_type_keyed::<T>(context),
            None => key_of_type::<T>(),
        };
        collection.registry.insert(key, registration);
        collection
    }
}

struct ResolvedArg {
    name: &'static str,
    value: Option<AnyArc>,
}

/// Positional access to a constructor's resolved dependency list.
///
/// Arguments are drawn in declaration order. Drawing past the declared list
/// or at the wrong type fails with [`DiError::InvalidDescriptor`] naming the
/// service, before the instance is produced.
pub struct ResolvedArgs {
    service: &'static str,
    values: VecDeque<ResolvedArg>,
}

impl ResolvedArgs {
    /// Draws the next required dependency.
    pub fn next<D: Send + Sync + 'static>(&mut self) -> DiResult<Arc<D>> {
        let arg = self.pop()?;
        let Some(value) = arg.value else {
            return Err(DiError::InvalidDescriptor {
                key: self.service,
                reason: "optional dependency must be drawn with next_optional",
            });
        };
        downcast_service(value)
    }

    /// Draws the next dependency, which must have been declared optional.
    /// Returns `None` when the dependency was unregistered.
    pub fn next_optional<D: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<D>>> {
        let arg = self.pop()?;
        match arg.value {
            None => Ok(None),
            Some(value) => downcast_service(value).map(Some),
        }
    }

    /// Draws the next required trait-object dependency.
    pub fn next_trait<D: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<D>>
    where
        Arc<D>: 'static,
    {
        let arg = self.pop()?;
        let Some(value) = arg.value else {
            return Err(DiError::InvalidDescriptor {
                key: self.service,
                reason: "optional dependency must be drawn with next_optional",
            });
        };
        downcast_trait(value)
    }

    /// Parameter name of the next argument, if any. Diagnostic aid.
    pub fn peek_name(&self) -> Option<&'static str> {
        self.values.front().map(|arg| arg.name)
    }

    fn pop(&mut self) -> DiResult<ResolvedArg> {
        self.values.pop_front().ok_or(DiError::InvalidDescriptor {
            key: self.service,
            reason: "constructor drew more arguments than declared dependencies",
        })
    }
}
