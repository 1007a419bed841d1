//! Internal service registration records and the registry.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::descriptor::{DependencySpec, ProviderKind, ServiceDescriptor};
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::{AsyncResolverContext, ResolverContext};

/// Type-erased instance as stored in caches and handed between layers.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed future used by async providers.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Synchronous provider closure.
pub(crate) type SyncCtor =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Asynchronous provider closure. Receives an owned context so the returned
/// future can be `'static`.
pub(crate) type AsyncCtor =
    Arc<dyn Fn(AsyncResolverContext) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

pub(crate) enum ProviderCtor {
    Sync(SyncCtor),
    Async(AsyncCtor),
}

/// Invocation half of a constructor-form registration: takes the declared
/// dependency list already resolved (positionally, `None` for absent
/// optionals) plus a resolver for property injections. Kept separate from
/// dependency resolution so the async path can resolve the declared list
/// through `resolve_async` before invoking the synchronous constructor.
pub(crate) type InvokeFn =
    Arc<dyn for<'a> Fn(Vec<Option<AnyArc>>, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// One registered service: lifetime, provider form, and the erased
/// constructor. Immutable once the provider is built.
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) kind: ProviderKind,
    pub(crate) ctor: ProviderCtor,
    pub(crate) invoke: Option<InvokeFn>,
    pub(crate) dependencies: Vec<DependencySpec>,
    pub(crate) property_injections: Vec<&'static str>,
}

impl Registration {
    pub(crate) fn sync(lifetime: Lifetime, kind: ProviderKind, ctor: SyncCtor) -> Self {
        Self {
            lifetime,
            kind,
            ctor: ProviderCtor::Sync(ctor),
            invoke: None,
            dependencies: Vec::new(),
            property_injections: Vec::new(),
        }
    }

    pub(crate) fn constructor(
        lifetime: Lifetime,
        ctor: SyncCtor,
        invoke: InvokeFn,
        dependencies: Vec<DependencySpec>,
        property_injections: Vec<&'static str>,
    ) -> Self {
        Self {
            lifetime,
            kind: ProviderKind::Constructor,
            ctor: ProviderCtor::Sync(ctor),
            invoke: Some(invoke),
            dependencies,
            property_injections,
        }
    }

    pub(crate) fn asynchronous(lifetime: Lifetime, ctor: AsyncCtor) -> Self {
        Self {
            lifetime,
            kind: ProviderKind::AsyncFactory,
            ctor: ProviderCtor::Async(ctor),
            invoke: None,
            dependencies: Vec::new(),
            property_injections: Vec::new(),
        }
    }

    pub(crate) fn async_init(&self) -> bool {
        matches!(self.ctor, ProviderCtor::Async(_))
    }

    pub(crate) fn descriptor(&self, key: &Key) -> ServiceDescriptor {
        ServiceDescriptor {
            key: key.clone(),
            lifetime: self.lifetime,
            provider: self.kind,
            dependencies: self.dependencies.clone(),
            async_init: self.async_init(),
            property_injections: self.property_injections.clone(),
        }
    }
}

/// Service registry: a map from (service, context) key to registration.
///
/// Inserting under an existing key silently overwrites; the replacement is
/// reported through a `tracing` debug event only.
pub(crate) struct Registry {
    map: HashMap<Key, Registration>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: Key, registration: Registration) {
        tracing::debug!(
            target: "rivet_di",
            service = key.display_name(),
            context = ?key.context_key(),
            lifetime = %registration.lifetime,
            "registering service"
        );
        if self.map.insert(key.clone(), registration).is_some() {
            tracing::debug!(
                target: "rivet_di",
                service = key.display_name(),
                context = ?key.context_key(),
                "replaced existing registration"
            );
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.map.get(key)
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.map.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;

    fn noop_registration(lifetime: Lifetime) -> Registration {
        Registration::sync(
            lifetime,
            ProviderKind::Factory,
            Arc::new(|_| Ok(Arc::new(()) as AnyArc)),
        )
    }

    #[test]
    fn insert_silently_overwrites() {
        let mut registry = Registry::new();
        registry.insert(key_of_type::<u32>(), noop_registration(Lifetime::Singleton));
        registry.insert(key_of_type::<u32>(), noop_registration(Lifetime::Transient));

        assert_eq!(registry.len(), 1);
        let reg = registry.get(&key_of_type::<u32>()).unwrap();
        assert_eq!(reg.lifetime, Lifetime::Transient);
    }
}
