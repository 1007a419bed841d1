//! Public traits for resolution and disposal.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};

pub(crate) use resolver::{downcast_service, downcast_trait};
