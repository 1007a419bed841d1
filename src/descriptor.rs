//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;

/// The provider form backing a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A pre-built value returned as-is. Always singleton.
    Instance,
    /// A closure taking the resolver and returning an instance; pulls
    /// whatever it needs from the resolver, so its dependency list is empty.
    Factory,
    /// A closure invoked with the descriptor's declared dependency list,
    /// resolved by the container in order.
    Constructor,
    /// An async factory; resolvable only through the async path.
    AsyncFactory,
}

/// One declared dependency of a constructor-form registration.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Parameter name, for diagnostics. Defaults to the dependency's type name.
    pub name: &'static str,
    /// The key resolved for this parameter.
    pub key: Key,
    /// Optional dependencies substitute `None` when unregistered instead of
    /// failing the resolution.
    pub optional: bool,
}

impl DependencySpec {
    pub(crate) fn required(key: Key) -> Self {
        Self {
            name: key.display_name(),
            key,
            optional: false,
        }
    }

    pub(crate) fn optional(key: Key) -> Self {
        Self {
            name: key.display_name(),
            key,
            optional: true,
        }
    }
}

/// Immutable description of one registered service.
///
/// Descriptors are built by the registration surface and exposed for
/// debugging, validation, and runtime introspection of the container
/// configuration. They compare by identity; no equality is defined.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Lifetime, ProviderKind};
///
/// struct Database { url: String }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<String, _>(|_| "fresh".to_string());
///
/// let descriptors = services.service_descriptors();
/// let db = descriptors.iter().find(|d| d.type_name().contains("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert_eq!(db.provider, ProviderKind::Instance);
/// assert!(!db.is_keyed());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The full service key, including any context key.
    pub key: Key,
    /// Service lifetime.
    pub lifetime: Lifetime,
    /// Provider form.
    pub provider: ProviderKind,
    /// Declared dependency list (constructor form only; factories pull from
    /// the resolver and declare nothing).
    pub dependencies: Vec<DependencySpec>,
    /// Whether construction suspends and requires the async resolve path.
    pub async_init: bool,
    /// Names of post-construction property injections, in application order.
    pub property_injections: Vec<&'static str>,
}

impl ServiceDescriptor {
    /// The type or trait name.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// The context key, or `None` for unkeyed registrations.
    pub fn context_key(&self) -> Option<&'static str> {
        self.key.context_key()
    }

    /// Whether this registration carries a context key.
    pub fn is_keyed(&self) -> bool {
        self.key.is_keyed()
    }
}
