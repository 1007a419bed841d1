//! Service key types for the dependency injection container.

use std::any::TypeId;

/// Key for service storage and lookup.
///
/// Keys uniquely identify services in the container. A key is the pair of a
/// service identity (a concrete type or a trait object) and an optional
/// *context key*: a string qualifier that allows several distinct
/// registrations under the same service type, e.g. two `Config` services
/// registered under the contexts `"db"` and `"cache"`.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{ServiceCollection, Resolver};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(8080u32);
/// services.add_keyed_singleton("admin_port", 9090u32);
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<u32>(), 8080);
/// assert_eq!(*provider.get_keyed_required::<u32>("admin_port"), 9090);
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and type name for diagnostics.
    Type(TypeId, &'static str),
    /// Concrete type key qualified by a context key.
    TypeKeyed(TypeId, &'static str, &'static str),
    /// Trait object key. Traits have no TypeId, so the trait name is the identity.
    Trait(&'static str),
    /// Trait object key qualified by a context key.
    TraitKeyed(&'static str, &'static str),
}

impl Key {
    /// The type or trait name, for diagnostics and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::TypeKeyed(_, name, _) => name,
            Key::Trait(name) => name,
            Key::TraitKeyed(name, _) => name,
        }
    }

    /// The context key for keyed registrations, or `None`.
    pub fn context_key(&self) -> Option<&'static str> {
        match self {
            Key::Type(_, _) | Key::Trait(_) => None,
            Key::TypeKeyed(_, _, ctx) => Some(ctx),
            Key::TraitKeyed(_, ctx) => Some(ctx),
        }
    }

    /// Whether this key carries a context key.
    pub fn is_keyed(&self) -> bool {
        self.context_key().is_some()
    }
}

// Equality compares TypeId first for concrete types; the type-name string is
// diagnostic only and ignored on the hot path.
impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeKeyed(a, _, ctx_a), Key::TypeKeyed(b, _, ctx_b)) => a == b && ctx_a == ctx_b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::TraitKeyed(a, ctx_a), Key::TraitKeyed(b, ctx_b)) => a == b && ctx_a == ctx_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeKeyed(id, _, ctx) => {
                1u8.hash(state);
                id.hash(state);
                ctx.hash(state);
            }
            Key::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            Key::TraitKeyed(name, ctx) => {
                3u8.hash(state);
                name.hash(state);
                ctx.hash(state);
            }
        }
    }
}

#[inline]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

#[inline]
pub fn key_of_type_keyed<T: 'static>(context: &'static str) -> Key {
    Key::TypeKeyed(TypeId::of::<T>(), std::any::type_name::<T>(), context)
}

#[inline]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}

#[inline]
pub fn key_of_trait_keyed<T: ?Sized + 'static>(context: &'static str) -> Key {
    Key::TraitKeyed(std::any::type_name::<T>(), context)
}
