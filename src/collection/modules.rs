//! Module binder for bulk service registration.
//!
//! A module is a declarative grouping of registrations that can be installed
//! into a target collection in one call. The grouping keeps its name for
//! diagnostics; the registered services land in the flat (service, context)
//! map like any other registration.

use crate::error::DiResult;

use super::ServiceCollection;

/// A named group of service registrations.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{DiResult, Resolver, ServiceCollection, ServiceCollectionModuleExt, ServiceModule};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig { table: &'static str }
/// struct UserRepository { table: &'static str }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(UserConfig { table: "users" });
///         services.add_scoped_factory::<UserRepository, _>(|r| UserRepository {
///             table: r.get_required::<UserConfig>().table,
///         });
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_module(UserModule)?;
/// let provider = services.build();
/// let scope = provider.create_scope();
/// assert_eq!(scope.get_required::<UserRepository>().table, "users");
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Module name used in diagnostics. Defaults to the implementing type's name.
    fn name(&self) -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Installs this module's registrations into the collection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Extension trait adding module binding to [`ServiceCollection`].
pub trait ServiceCollectionModuleExt {
    /// Installs a module's registrations, returning the collection for
    /// chaining.
    fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionModuleExt for ServiceCollection {
    fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        tracing::debug!(target: "rivet_di", module = module.name(), "binding module");
        module.register_services(self)?;
        Ok(self)
    }
}
