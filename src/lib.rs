//! # rivet-di
//!
//! Descriptor-driven, type-safe dependency injection for Rust, inspired by
//! Microsoft.Extensions.DependencyInjection.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Scoped, and Transient services
//! - **Context keys**: several registrations of one type, qualified by a string key
//! - **Trait support**: single-binding trait resolution
//! - **Cycle detection**: failed resolutions report the full offending path
//! - **Lifecycle enforcement**: scoped-into-singleton capture is rejected at resolve time
//! - **Scopes**: isolated per-scope caches with disposal in reverse build order
//! - **Sync and async resolution**: async initializers build under per-key
//!   construction locks, exactly once even under concurrent resolves
//! - **Lazy proxies**: deferred resolution handles that break construction cycles
//! - **Test mode**: a mock overlay that shadows real registrations without
//!   touching them
//!
//! ## Quick start
//!
//! ```rust
//! use rivet_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|resolver| UserService {
//!     db: resolver.get_required::<Database>(),
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scoped services
//!
//! ```rust
//! use rivet_di::{ServiceCollection, Resolver};
//! use std::sync::{Arc, Mutex};
//!
//! struct RequestId(String);
//!
//! let mut services = ServiceCollection::new();
//! let counter = Arc::new(Mutex::new(0));
//! services.add_scoped_factory::<RequestId, _>(move |_| {
//!     let mut c = counter.lock().unwrap();
//!     *c += 1;
//!     RequestId(format!("req-{}", *c))
//! });
//!
//! let provider = services.build();
//! let scope1 = provider.create_scope();
//! let scope2 = provider.create_scope();
//!
//! let a = scope1.get_required::<RequestId>();
//! let b = scope2.get_required::<RequestId>();
//! assert_ne!(a.0, b.0); // distinct scopes get distinct instances
//! scope1.close();
//! scope2.close();
//! ```
//!
//! ## Test mode
//!
//! ```rust
//! use rivet_di::{ServiceCollection, Resolver};
//!
//! struct ApiKey(&'static str);
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(ApiKey("prod-key"));
//!
//! let provider = services.build();
//! provider.enable_test_mode();
//! provider.mock(ApiKey("test-key"));
//! assert_eq!(provider.get_required::<ApiKey>().0, "test-key");
//!
//! provider.disable_test_mode();
//! assert_eq!(provider.get_required::<ApiKey>().0, "prod-key");
//! ```

pub mod collection;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod lazy;
pub mod lifetime;
pub mod provider;
pub mod traits;

mod cache;
mod internal;
mod registration;

pub use collection::{
    ConstructorBinding, ResolvedArgs, ServiceCollection, ServiceCollectionModuleExt,
    ServiceModule,
};
pub use descriptor::{DependencySpec, ProviderKind, ServiceDescriptor};
pub use error::{BoxError, DiError, DiResult};
pub use key::{key_of_trait, key_of_type, Key};
pub use lazy::Lazy;
pub use lifetime::Lifetime;
pub use provider::{AsyncResolverContext, ResolverContext, ResolverHandle, Scope, ServiceProvider};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn singleton_resolution_shares_one_instance() {
        let mut sc = ServiceCollection::new();
        sc.add_singleton(42usize);

        let sp = sc.build();
        let a = sp.get_required::<usize>();
        let b = sp.get_required::<usize>();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn transient_resolution_builds_fresh_instances() {
        let mut sc = ServiceCollection::new();
        let counter = Arc::new(std::sync::Mutex::new(0));
        sc.add_transient_factory::<String, _>(move |_| {
            let mut c = counter.lock().unwrap();
            *c += 1;
            format!("instance-{}", *c)
        });

        let sp = sc.build();
        let a = sp.get_required::<String>();
        let b = sp.get_required::<String>();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn trait_resolution() {
        trait Greeter: Send + Sync {
            fn greet(&self) -> &'static str;
        }

        struct English;
        impl Greeter for English {
            fn greet(&self) -> &'static str {
                "hello"
            }
        }

        let mut sc = ServiceCollection::new();
        sc.add_singleton_trait::<dyn Greeter>(Arc::new(English));

        let sp = sc.build();
        assert_eq!(sp.get_required_trait::<dyn Greeter>().greet(), "hello");
    }

    #[test]
    fn keyed_resolution_is_isolated_per_context() {
        let mut sc = ServiceCollection::new();
        sc.add_keyed_singleton("db", 5432u16);
        sc.add_keyed_singleton("cache", 6379u16);

        let sp = sc.build();
        assert_eq!(*sp.get_keyed_required::<u16>("db"), 5432);
        assert_eq!(*sp.get_keyed_required::<u16>("cache"), 6379);
        assert!(matches!(
            sp.get::<u16>(),
            Err(DiError::Unregistered(_))
        ));
    }
}
