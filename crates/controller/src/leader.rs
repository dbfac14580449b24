//! Leadership predicate
//!
//! The election itself lives outside the controller core; the store only asks
//! whether this process currently holds leadership.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether this controller instance is the elected leader
///
/// Called under the topology lock, so implementations must not block or
/// re-enter the store.
pub trait Leadership: Send + Sync {
    fn is_leader(&self) -> bool;
}

impl<F> Leadership for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_leader(&self) -> bool {
        self()
    }
}

/// Leadership flag flipped by an election loop (or fixed in standalone mode)
#[derive(Debug, Clone, Default)]
pub struct LeaderFlag {
    inner: Arc<AtomicBool>,
}

impl LeaderFlag {
    pub fn new(is_leader: bool) -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(is_leader)),
        }
    }

    pub fn set(&self, is_leader: bool) {
        self.inner.store(is_leader, Ordering::SeqCst);
    }
}

impl Leadership for LeaderFlag {
    fn is_leader(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_shared_between_clones() {
        let flag = LeaderFlag::new(true);
        let other = flag.clone();
        assert!(other.is_leader());

        flag.set(false);
        assert!(!other.is_leader());
    }

    #[test]
    fn test_closure_predicate() {
        let always = || true;
        assert!(always.is_leader());
    }
}
