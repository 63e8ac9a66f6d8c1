/// Stack-disciplined render target binding.
///
/// The stack is created with the default target at its base, which can never
/// be popped. `scoped` pushes a target for the duration of a closure and
/// restores the previous one on every exit path, so the default target is
/// always bound again at frame end even when a pass is skipped.
#[derive(Debug)]
pub struct TargetStack<T> {
    stack: Vec<T>,
}

impl<T> TargetStack<T> {
    pub fn new(default_target: T) -> Self {
        Self {
            stack: vec![default_target],
        }
    }

    /// The currently bound target.
    pub fn current(&self) -> &T {
        // The base entry is never popped.
        self.stack.last().expect("target stack has a base entry")
    }

    /// How many targets are bound, including the default.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bind `target` for the duration of `body`, then restore the previous
    /// binding. Restoration also happens if `body` unwinds.
    pub fn scoped<R>(&mut self, target: T, body: impl FnOnce(&mut Self) -> R) -> R {
        struct Restore<'a, T>(&'a mut TargetStack<T>);

        impl<T> Drop for Restore<'_, T> {
            fn drop(&mut self) {
                self.0.stack.pop();
            }
        }

        self.stack.push(target);
        let mut guard = Restore(self);
        body(&mut *guard.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_target_is_current_initially() {
        let stack = TargetStack::new("surface");
        assert_eq!(*stack.current(), "surface");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn scoped_binds_and_restores() {
        let mut stack = TargetStack::new("surface");
        stack.scoped("offscreen", |stack| {
            assert_eq!(*stack.current(), "offscreen");
            stack.scoped("shadow", |stack| {
                assert_eq!(*stack.current(), "shadow");
                assert_eq!(stack.depth(), 3);
            });
            assert_eq!(*stack.current(), "offscreen");
        });
        assert_eq!(*stack.current(), "surface");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn scoped_restores_on_early_return() {
        let mut stack = TargetStack::new(0);
        let skipped = stack.scoped(1, |stack| {
            if stack.depth() > 1 {
                // Conditionally skipped pass body.
                return true;
            }
            false
        });
        assert!(skipped);
        assert_eq!(*stack.current(), 0);
    }

    #[test]
    fn scoped_restores_on_unwind() {
        let mut stack = TargetStack::new("surface");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            stack.scoped("offscreen", |_| panic!("pass failed"));
        }));
        assert!(result.is_err());
        assert_eq!(*stack.current(), "surface");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn scoped_passes_through_results() {
        let mut stack = TargetStack::new(0u32);
        let sum = stack.scoped(7, |stack| *stack.current() + 1);
        assert_eq!(sum, 8);
    }
}
