//! Error types for the dependency injection container.

use crate::lifetime::Lifetime;

/// Boxed error type accepted from fallible providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dependency injection errors.
///
/// Represents the error conditions that can occur during service
/// registration, resolution, or container teardown.
///
/// # Examples
///
/// ```rust
/// use rivet_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::Unregistered(name)) => assert_eq!(name, "alloc::string::String"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DiError {
    /// No descriptor is registered for the requested (service, context) key
    /// and no mock shadows it.
    #[error("service not registered: {0}")]
    Unregistered(&'static str),

    /// The resolution path revisited a key that is already being constructed.
    /// The path lists every key on the cycle in resolution order.
    #[error("circular dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<&'static str>),

    /// A dependency's lifetime is incompatible with its consumer's, e.g. a
    /// singleton capturing a scoped instance.
    #[error("lifecycle mismatch: {consumer} ({consumer_lifetime}) cannot depend on {dependency} ({dependency_lifetime})")]
    LifecycleMismatch {
        consumer: &'static str,
        consumer_lifetime: Lifetime,
        dependency: &'static str,
        dependency_lifetime: Lifetime,
    },

    /// A synchronous resolve reached a descriptor with an async initializer.
    #[error("{0} has an async initializer and must be resolved through the async path")]
    AsyncRequired(&'static str),

    /// A scoped service was resolved outside of any scope.
    #[error("scoped service {0} resolved outside of a scope")]
    ScopeRequired(&'static str),

    /// Resolution was attempted on a closed scope or provider.
    #[error("scope is closed")]
    ScopeClosed,

    /// A provider failed while building; wraps the underlying cause and
    /// names the offending key.
    #[error("failed to construct {key}: {source}")]
    ConstructionFailed {
        key: &'static str,
        #[source]
        source: BoxError,
    },

    /// A descriptor was malformed, e.g. a constructor drew more arguments
    /// than its declared dependency list provides.
    #[error("invalid descriptor for {key}: {reason}")]
    InvalidDescriptor {
        key: &'static str,
        reason: &'static str,
    },

    /// A resolved instance failed to downcast to the requested type.
    #[error("type mismatch for: {0}")]
    TypeMismatch(&'static str),
}

impl DiError {
    pub(crate) fn construction<E: Into<BoxError>>(key: &'static str, source: E) -> Self {
        DiError::ConstructionFailed {
            key,
            source: source.into(),
        }
    }
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_dependency_reports_full_chain() {
        let err = DiError::CyclicDependency(vec!["A", "B", "A"]);
        assert_eq!(err.to_string(), "circular dependency: A -> B -> A");
    }

    #[test]
    fn lifecycle_mismatch_names_both_sides() {
        let err = DiError::LifecycleMismatch {
            consumer: "UserService",
            consumer_lifetime: Lifetime::Singleton,
            dependency: "Session",
            dependency_lifetime: Lifetime::Scoped,
        };
        let msg = err.to_string();
        assert!(msg.contains("UserService"));
        assert!(msg.contains("Session"));
        assert!(msg.contains("singleton"));
        assert!(msg.contains("scoped"));
    }

    #[test]
    fn construction_failed_carries_source() {
        let err = DiError::construction("Database", "connection refused");
        assert!(err.to_string().contains("Database"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
