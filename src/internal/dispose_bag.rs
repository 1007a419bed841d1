//! Disposal hooks with LIFO execution order.

use std::future::Future;
use std::pin::Pin;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Holds disposal hooks in registration order and runs them in reverse,
/// async hooks before sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    pub(crate) fn push_async(&mut self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.asyncs.push(f);
    }

    /// Runs sync hooks in reverse registration order.
    pub(crate) fn run_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            f();
        }
    }

    /// Runs async hooks in reverse registration order.
    pub(crate) async fn run_async_reverse(&mut self) {
        while let Some(f) = self.asyncs.pop() {
            f().await;
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sync_hooks_run_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let order = order.clone();
            bag.push_sync(Box::new(move || order.lock().unwrap().push(i)));
        }
        bag.run_sync_reverse();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert!(bag.is_empty());
    }
}
