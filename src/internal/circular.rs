//! In-flight resolution tracking for the synchronous resolve path.
//!
//! Each thread keeps a stack of the keys currently under construction.
//! Revisiting a key already on the stack is a cycle; the full path is
//! carried out as a panic payload and converted back into
//! [`DiError::CyclicDependency`](crate::DiError::CyclicDependency) at the
//! nearest resolve boundary. Frames also record the lifetime of the service
//! being built so the resolver can enforce lifecycle compatibility against
//! the consumer frame.

use std::cell::RefCell;
use std::panic;

use crate::error::DiResult;
use crate::lifetime::Lifetime;

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// One in-flight resolution frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) name: &'static str,
    pub(crate) lifetime: Lifetime,
}

/// Panic payload for cycle detection. The path lists every key on the
/// cycle in resolution order, e.g. `["A", "B", "A"]`.
#[derive(Debug)]
pub struct CircularPanic {
    pub path: Box<[&'static str]>,
}

/// Pushes a frame on construction, pops it on drop. Unwinding pops frames
/// naturally, so the stack stays balanced across both success and failure.
struct StackGuard {
    name: &'static str,
}

impl StackGuard {
    fn new(name: &'static str, lifetime: Lifetime) -> Self {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Cycle check before pushing the new frame.
            if stack.iter().any(|f| f.name == name) {
                let mut path: Vec<&'static str> = stack.iter().map(|f| f.name).collect();
                path.push(name);
                drop(stack);
                panic::panic_any(CircularPanic {
                    path: path.into_boxed_slice(),
                });
            }

            stack.push(Frame { name, lifetime });
        });

        Self { name }
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            if let Some(last) = stack.borrow_mut().pop() {
                debug_assert_eq!(last.name, self.name);
            }
        });
    }
}

/// The frame that requested the current resolution, if any.
///
/// Called before a new guard is pushed, so the top of the stack is the
/// consumer of the key about to be resolved.
pub(crate) fn current_consumer() -> Option<Frame> {
    RESOLUTION_STACK.with(|stack| stack.borrow().last().copied())
}

/// Runs `f` with `(name, lifetime)` on the in-flight stack, converting a
/// detected cycle into `DiError::CyclicDependency`.
pub(crate) fn with_circular_catch<T, F>(name: &'static str, lifetime: Lifetime, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    use std::panic::AssertUnwindSafe;

    let _guard = StackGuard::new(name, lifetime);

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            if let Some(circular) = payload.downcast_ref::<CircularPanic>() {
                Err(crate::error::DiError::CyclicDependency(
                    circular.path.iter().copied().collect(),
                ))
            } else {
                panic::resume_unwind(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;

    #[test]
    fn nested_frames_report_the_full_cycle() {
        let result: DiResult<()> = with_circular_catch("A", Lifetime::Transient, || {
            with_circular_catch("B", Lifetime::Transient, || {
                with_circular_catch("A", Lifetime::Transient, || Ok(()))
            })
        });

        match result {
            Err(DiError::CyclicDependency(path)) => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn stack_is_balanced_after_a_cycle_error() {
        let _ = with_circular_catch("A", Lifetime::Transient, || {
            with_circular_catch("A", Lifetime::Transient, || Ok(()))
        });
        // A fresh resolution of the same name must succeed.
        let ok = with_circular_catch("A", Lifetime::Transient, || Ok(42));
        assert_eq!(ok.unwrap(), 42);
        assert!(current_consumer().is_none());
    }

    #[test]
    fn consumer_frame_is_visible_to_nested_resolutions() {
        with_circular_catch("Outer", Lifetime::Singleton, || {
            let consumer = current_consumer().unwrap();
            assert_eq!(consumer.name, "Outer");
            assert_eq!(consumer.lifetime, Lifetime::Singleton);
            Ok(())
        })
        .unwrap();
    }
}
