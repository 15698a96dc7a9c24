//! Closable counting semaphore.

use parking_lot::{Condvar, Mutex};

/// Returned by [`Semaphore::acquire`] once the semaphore has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed;

#[derive(Debug)]
struct State {
    permits: usize,
    closed: bool,
}

/// A counting semaphore built on a mutex and a condition variable.
///
/// Waiters block without spinning. Wakeups are roughly FIFO: parking_lot
/// signals the longest waiter first, but a fresh `acquire` can still take
/// the permit before that waiter reacquires the lock. Closing is permanent:
/// every current and future `acquire` returns [`Closed`], regardless of
/// how many permits remain.
#[derive(Debug)]
pub(crate) struct Semaphore {
    state: Mutex<State>,
    available: Condvar,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Takes one permit, blocking while none are available.
    pub(crate) fn acquire(&self) -> Result<(), Closed> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(Closed);
            }
            if state.permits > 0 {
                state.permits -= 1;
                return Ok(());
            }
            self.available.wait(&mut state);
        }
    }

    /// Returns one permit and wakes a single waiter.
    pub(crate) fn release(&self) {
        let mut state = self.state.lock();
        state.permits += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Closes the semaphore and wakes every waiter.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn permits(&self) -> usize {
        self.state.lock().permits
    }
}
