use std::sync::{Condvar, Mutex, MutexGuard};

/// Default number of simultaneous requests a remote backend may have in flight.
pub const DEFAULT_CONNECTION_LIMIT: usize = 10;

/// Counting permit that caps outstanding network operations.
///
/// `acquire()` blocks while all permits are out. A [`Permit`] hands its slot
/// back when dropped, so callers scope it to the request itself and let it
/// go before streaming the response body.
#[derive(Debug)]
pub struct ConnectionLimiter {
    available: Mutex<usize>,
    released: Condvar,
    limit: usize,
}

impl ConnectionLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            available: Mutex::new(limit),
            released: Condvar::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn acquire(&self) -> Permit<'_> {
        let mut available = self.lock();
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(|e| e.into_inner());
        }
        *available -= 1;
        Permit { limiter: self }
    }

    fn release(&self) {
        let mut available = self.lock();
        *available += 1;
        drop(available);
        self.released.notify_one();
    }
}

impl Default for ConnectionLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_LIMIT)
    }
}

/// One checked-out slot of a [`ConnectionLimiter`].
#[derive(Debug)]
pub struct Permit<'a> {
    limiter: &'a ConnectionLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
