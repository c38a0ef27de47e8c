//! # Copy-on-write target list.
//!
//! Readers load an `Arc` snapshot lock-free and iterate it; writers serialize
//! on a mutex and swap in a whole new vector. Removing a target while a pass
//! is running therefore never invalidates that pass, and never skips a live
//! target.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::dispatch::target::TargetRef;

/// Ordered, duplicate-free list of dispatch targets.
pub struct TargetList {
    current: ArcSwap<Vec<TargetRef>>,
    write: Mutex<()>,
}

impl Default for TargetList {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            write: Mutex::new(()),
        }
    }
}

/// Identity comparison ignoring vtable pointers.
fn same(a: &TargetRef, b: &TargetRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl TargetList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable view of the current targets, in registration order.
    pub fn snapshot(&self) -> Arc<Vec<TargetRef>> {
        self.current.load_full()
    }

    /// Appends a target. Returns `false` if it is already present.
    pub fn add(&self, target: TargetRef) -> bool {
        let _w = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        let cur = self.current.load();
        if cur.iter().any(|t| same(t, &target)) {
            return false;
        }
        let mut next = Vec::with_capacity(cur.len() + 1);
        next.extend(cur.iter().cloned());
        next.push(target);
        self.current.store(Arc::new(next));
        true
    }

    /// Removes a target by identity. Returns `false` if it was not present.
    pub fn remove(&self, target: &TargetRef) -> bool {
        self.retain(|t| !same(t, target))
    }

    /// Removes every target with the given name.
    pub fn remove_named(&self, name: &str) -> bool {
        self.retain(|t| t.name() != name)
    }

    fn retain(&self, keep: impl Fn(&TargetRef) -> bool) -> bool {
        let _w = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        let cur = self.current.load();
        let next: Vec<TargetRef> = cur.iter().filter(|t| keep(t)).cloned().collect();
        if next.len() == cur.len() {
            return false;
        }
        self.current.store(Arc::new(next));
        true
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// True if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Target;
    use crate::error::SubmitError;
    use crate::message::Message;

    struct Named(&'static str);

    impl Target for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn is_running(&self) -> bool {
            true
        }
        fn submit(&self, _message: Message) -> Result<(), SubmitError> {
            Ok(())
        }
    }

    #[test]
    fn snapshot_is_stable_across_removal() {
        let list = TargetList::new();
        let a: TargetRef = Arc::new(Named("a"));
        let b: TargetRef = Arc::new(Named("b"));
        assert!(list.add(a.clone()));
        assert!(list.add(b.clone()));
        assert!(!list.add(a.clone()));

        let snap = list.snapshot();
        assert!(list.remove(&a));
        assert!(!list.remove(&a));

        let names: Vec<&str> = snap.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(list.len(), 1);
        assert!(list.remove_named("b"));
        assert!(list.is_empty());
    }
}
