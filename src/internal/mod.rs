//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use circular::{current_consumer, with_circular_catch, Frame};
pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag};
