use std::cell::Cell;

/// A memoized derived value with explicit invalidation.
///
/// The owner of upstream state calls `invalidate` from its setters; readers
/// call `get_or_compute`, which recomputes only when the cell is dirty. This
/// keeps matrix math off the per-frame path while the camera is stationary.
#[derive(Debug, Default)]
pub struct Memo<T: Copy> {
    slot: Cell<Option<T>>,
}

impl<T: Copy> Memo<T> {
    pub const fn new() -> Self {
        Self {
            slot: Cell::new(None),
        }
    }

    /// Mark the value dirty; the next read recomputes it.
    pub fn invalidate(&self) {
        self.slot.set(None);
    }

    pub fn is_dirty(&self) -> bool {
        self.slot.get().is_none()
    }

    /// Return the cached value, computing it first if dirty.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T {
        match self.slot.get() {
            Some(value) => value,
            None => {
                let value = compute();
                self.slot.set(Some(value));
                value
            }
        }
    }
}

impl<T: Copy> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Cell::new(self.slot.get()),
        }
    }
}

/// A value memoized per timestamp: reading at a new time recomputes, reading
/// at the same time reuses the cached value across passes within a frame.
#[derive(Debug, Default)]
pub struct TimeTagged<T: Copy> {
    slot: Cell<Option<(f32, T)>>,
}

impl<T: Copy> TimeTagged<T> {
    pub const fn new() -> Self {
        Self {
            slot: Cell::new(None),
        }
    }

    pub fn invalidate(&self) {
        self.slot.set(None);
    }

    /// Return the value for `time`, computing it if the tag differs.
    pub fn get_at(&self, time: f32, compute: impl FnOnce(f32) -> T) -> T {
        match self.slot.get() {
            Some((tag, value)) if tag == time => value,
            _ => {
                let value = compute(time);
                self.slot.set(Some((time, value)));
                value
            }
        }
    }
}

impl<T: Copy> Clone for TimeTagged<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Cell::new(self.slot.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;

    #[test]
    fn memo_computes_once_until_invalidated() {
        let calls = StdCell::new(0);
        let memo = Memo::new();
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };
        assert_eq!(memo.get_or_compute(compute), 42);
        assert_eq!(memo.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 1);

        memo.invalidate();
        assert!(memo.is_dirty());
        assert_eq!(memo.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn memo_starts_dirty() {
        let memo: Memo<i32> = Memo::new();
        assert!(memo.is_dirty());
    }

    #[test]
    fn time_tagged_reuses_same_timestamp() {
        let calls = StdCell::new(0);
        let tagged = TimeTagged::new();
        let compute = |t: f32| {
            calls.set(calls.get() + 1);
            t * 2.0
        };
        assert_eq!(tagged.get_at(1.0, compute), 2.0);
        assert_eq!(tagged.get_at(1.0, compute), 2.0);
        assert_eq!(calls.get(), 1);
        assert_eq!(tagged.get_at(2.0, compute), 4.0);
        assert_eq!(calls.get(), 2);
    }
}
