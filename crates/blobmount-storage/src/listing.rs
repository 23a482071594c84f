use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and a listing.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Names decoded from a single listing response.
///
/// Iteration checks the cancel token before every item; once cancelled the
/// sequence ends. `rewind()` starts over from the first name.
#[derive(Debug, Clone)]
pub struct NameList {
    names: Vec<String>,
    pos: usize,
    cancel: CancelToken,
}

impl NameList {
    pub fn new(names: Vec<String>, cancel: CancelToken) -> Self {
        Self {
            names,
            pos: 0,
            cancel,
        }
    }

    /// An already-finished listing.
    pub fn empty() -> Self {
        Self::new(Vec::new(), CancelToken::new())
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for NameList {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let name = self.names.get(self.pos)?.clone();
        self.pos += 1;
        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.names.len().saturating_sub(self.pos)))
    }
}
