//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior.
///
/// Defines how service instances are created, cached, and shared within
/// the dependency injection container.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver, Lifetime};
///
/// struct Database { url: String }
/// struct Session { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: one instance for the entire application
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
///
/// // Scoped: one instance per scope
/// services.add_scoped_factory::<Session, _>(|_| Session { id: 1 });
///
/// let provider = services.build();
/// let scope = provider.create_scope();
///
/// let db1 = provider.get_required::<Database>();
/// let db2 = scope.get_required::<Database>();
/// assert!(std::ptr::eq(&*db1, &*db2)); // singletons are shared across scopes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per root provider, cached until the provider closes.
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime.
    ///
    /// Distinct scopes get distinct instances; resolving a scoped service
    /// outside of any scope fails with [`DiError::ScopeRequired`](crate::DiError::ScopeRequired).
    Scoped,
    /// New instance per resolution, never cached. The caller owns it.
    Transient,
}

impl Lifetime {
    /// Whether a service with this lifetime may depend on a service
    /// with the given lifetime.
    ///
    /// A singleton outlives every scope, so capturing a scoped instance in
    /// a singleton is rejected. All other combinations are allowed.
    pub(crate) fn can_depend_on(self, dependency: Lifetime) -> bool {
        !matches!((self, dependency), (Lifetime::Singleton, Lifetime::Scoped))
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(s)
    }
}
