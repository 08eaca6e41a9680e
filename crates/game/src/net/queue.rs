use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Multi-producer/single-consumer FIFO guarded by a mutex and condition
/// variable. The transport's I/O thread pushes; the game thread pops.
#[derive(Debug, Default)]
pub struct SafeQueue<T> {
    inner: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> SafeQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, value: T) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(value);
        drop(queue);
        self.available.notify_one();
    }

    /// Non-blocking pop.
    pub fn pop(&self) -> Option<T> {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.pop_front()
    }

    /// Blocking pop, waiting until an element is available.
    pub fn pop_wait(&self) -> T {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(value) = queue.pop_front() {
                return value;
            }
            queue = self
                .available
                .wait(queue)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
