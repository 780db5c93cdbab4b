use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// A single-slot container guarded by a mutual-exclusion lock.
///
/// Every piece of state shared between loops lives in one of these: the
/// live sensor reading, the live camera frame, the frozen capture, and the
/// monitor's prediction result. Writers replace the held value wholesale;
/// readers always observe a value that was actually stored, never a
/// half-written composite.
///
/// Multi-cell operations (the freeze) acquire guards via [`SharedCell::lock`]
/// in a fixed global order; see `station::freeze`.
pub struct SharedCell<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Replaces the held value.
    pub async fn set(&self, value: T) {
        *self.inner.lock().await = value;
    }

    /// Acquires this cell's lock for the duration of a composite
    /// read/update. Hold time must stay bounded to the critical section.
    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }
}

impl<T: Clone> SharedCell<T> {
    /// Returns a copy of the most recently set value.
    pub async fn get(&self) -> T {
        self.inner.lock().await.clone()
    }
}

impl<T> Clone for SharedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_last_set_value() {
        let cell = SharedCell::new(None::<u32>);
        assert_eq!(cell.get().await, None);

        cell.set(Some(7)).await;
        assert_eq!(cell.get().await, Some(7));

        cell.set(Some(11)).await;
        assert_eq!(cell.get().await, Some(11));
    }

    #[tokio::test]
    async fn concurrent_reads_never_observe_torn_values() {
        // Writers store pairs whose second half is derived from the first;
        // a torn read would surface as a pair violating the relation.
        let cell = SharedCell::new((0u64, 0u64));

        let mut tasks = Vec::new();
        for writer in 0..4u64 {
            let cell = cell.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..250u64 {
                    let value = writer * 1000 + i;
                    cell.set((value, value * 2)).await;
                }
            }));
        }
        for _ in 0..4 {
            let cell = cell.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..250 {
                    let (a, b) = cell.get().await;
                    assert_eq!(b, a * 2, "observed a value that was never set");
                }
            }));
        }

        for task in tasks {
            task.await.expect("cell task panicked");
        }
    }

    #[tokio::test]
    async fn lock_serializes_composite_updates() {
        let cell = SharedCell::new(0u32);
        {
            let mut guard = cell.lock().await;
            *guard += 1;
            *guard += 1;
        }
        assert_eq!(cell.get().await, 2);
    }
}
