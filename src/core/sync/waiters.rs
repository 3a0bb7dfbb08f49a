/*!
 * Waiter List
 *
 * Intrusive singly-linked list of waiter records. Each record lives in the
 * stack frame of the thread waiting on it and embeds that thread's private
 * semaphore.
 *
 * # Design
 *
 * - Records are linked at the head and spliced out by a pointer walk
 * - The list and every `next` link are touched only under the waiters lock
 * - Notifiers only release semaphores; a record leaves the list only when
 *   its own thread unregisters it
 * - A record is pinned and borrowed by its `Registration`, so it cannot move
 *   or be dropped while linked
 */

use super::semaphore::Semaphore;
use crate::core::errors::{contract_violation, ContractViolation};
use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::marker::PhantomPinned;
use std::pin::Pin;
use std::ptr::NonNull;
use tracing::error;

/// One blocked (or about to block) thread
pub(crate) struct Waiter {
    sem: Semaphore,
    /// Guarded by the owning list's lock
    next: UnsafeCell<Option<NonNull<Waiter>>>,
    _pin: PhantomPinned,
}

// SAFETY: `sem` is atomic and `next` is only accessed with the waiters lock held.
unsafe impl Sync for Waiter {}

impl Waiter {
    pub(crate) fn new() -> Self {
        Self {
            sem: Semaphore::binary(),
            next: UnsafeCell::new(None),
            _pin: PhantomPinned,
        }
    }

    #[inline]
    pub(crate) fn semaphore(&self) -> &Semaphore {
        &self.sem
    }
}

/// Head of the intrusive list plus its length
pub(crate) struct WaiterList {
    first: Option<NonNull<Waiter>>,
    len: usize,
}

// SAFETY: the raw links point at records whose owners keep them alive until
// they unlink under the same lock that guards this list.
unsafe impl Send for WaiterList {}

impl WaiterList {
    pub(crate) const fn new() -> Self {
        Self {
            first: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// # Safety
    ///
    /// `node` must stay valid and pinned until it is removed again.
    unsafe fn push_front(&mut self, node: NonNull<Waiter>) {
        *node.as_ref().next.get() = self.first;
        self.first = Some(node);
        self.len += 1;
    }

    /// Splice `node` out; `false` if it was not linked
    unsafe fn remove(&mut self, node: NonNull<Waiter>) -> bool {
        let mut prev: Option<NonNull<Waiter>> = None;
        let mut cursor = self.first;

        while let Some(current) = cursor {
            let next = *current.as_ref().next.get();
            if current == node {
                match prev {
                    None => self.first = next,
                    Some(p) => *p.as_ref().next.get() = next,
                }
                *current.as_ref().next.get() = None;
                self.len -= 1;
                return true;
            }
            prev = cursor;
            cursor = next;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, node: &Waiter) -> bool {
        let target = NonNull::from(node);
        self.iter().any(|w| NonNull::from(w) == target)
    }

    /// Release every linked waiter's semaphore, returning how many there were
    pub(crate) fn signal_all(&self) -> usize {
        let mut count = 0;
        for waiter in self.iter() {
            waiter.semaphore().release();
            count += 1;
        }
        count
    }

    fn iter(&self) -> Iter<'_> {
        Iter {
            cursor: self.first,
            _list: self,
        }
    }
}

struct Iter<'a> {
    cursor: Option<NonNull<Waiter>>,
    _list: &'a WaiterList,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Waiter;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        // SAFETY: linked records are alive while the list is borrowed, and
        // the list is only reachable through the waiters lock.
        unsafe {
            self.cursor = *current.as_ref().next.get();
            Some(&*current.as_ptr())
        }
    }
}

/// A waiter's presence in a list, undone on `unregister` or drop
///
/// Holding the registration keeps the pinned record borrowed, so the record
/// provably outlives its time in the list.
pub(crate) struct Registration<'a> {
    list: &'a Mutex<WaiterList>,
    waiter: Pin<&'a Waiter>,
    linked: bool,
}

impl<'a> Registration<'a> {
    /// Link `waiter` at the head of `list`
    pub(crate) fn register(list: &'a Mutex<WaiterList>, waiter: Pin<&'a Waiter>) -> Self {
        {
            let mut guard = list.lock();
            // SAFETY: `waiter` is pinned for 'a and `Drop` unlinks it before
            // the borrow ends.
            unsafe { guard.push_front(NonNull::from(waiter.get_ref())) };
        }
        Self {
            list,
            waiter,
            linked: true,
        }
    }

    #[inline]
    pub(crate) fn waiter(&self) -> &Waiter {
        self.waiter.get_ref()
    }

    /// Splice the record out of the list
    ///
    /// # Panics
    ///
    /// If the record is no longer linked.
    pub(crate) fn unregister(mut self) {
        if !self.unlink() {
            contract_violation(ContractViolation::WaiterVanished);
        }
    }

    fn unlink(&mut self) -> bool {
        if !self.linked {
            return true;
        }
        self.linked = false;
        let mut guard = self.list.lock();
        // SAFETY: the record is pinned and still borrowed by `self`.
        unsafe { guard.remove(NonNull::from(self.waiter.get_ref())) }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.unlink() {
            return;
        }
        if std::thread::panicking() {
            error!("Waiter missing from condition variable list during unwind");
        } else {
            contract_violation(ContractViolation::WaiterVanished);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::pin;

    #[test]
    fn test_register_links_at_head() {
        let list = Mutex::new(WaiterList::new());
        let a = pin!(Waiter::new());
        let b = pin!(Waiter::new());

        let reg_a = Registration::register(&list, a.as_ref());
        let reg_b = Registration::register(&list, b.as_ref());

        {
            let guard = list.lock();
            assert_eq!(guard.len(), 2);
            let first = guard.iter().next().unwrap();
            assert!(std::ptr::eq(first, reg_b.waiter()));
        }

        reg_a.unregister();
        assert_eq!(list.lock().len(), 1);
        assert!(list.lock().contains(reg_b.waiter()));
        drop(reg_b);
        assert!(list.lock().is_empty());
    }

    #[test]
    fn test_unregister_middle_node() {
        let list = Mutex::new(WaiterList::new());
        let a = pin!(Waiter::new());
        let b = pin!(Waiter::new());
        let c = pin!(Waiter::new());

        let reg_a = Registration::register(&list, a.as_ref());
        let reg_b = Registration::register(&list, b.as_ref());
        let reg_c = Registration::register(&list, c.as_ref());

        reg_b.unregister();
        {
            let guard = list.lock();
            assert_eq!(guard.len(), 2);
            assert!(guard.contains(reg_a.waiter()));
            assert!(guard.contains(reg_c.waiter()));
        }

        drop(reg_c);
        drop(reg_a);
        assert!(list.lock().is_empty());
    }

    #[test]
    fn test_signal_all_releases_every_semaphore() {
        let list = Mutex::new(WaiterList::new());
        let a = pin!(Waiter::new());
        let b = pin!(Waiter::new());

        let reg_a = Registration::register(&list, a.as_ref());
        let reg_b = Registration::register(&list, b.as_ref());

        assert_eq!(list.lock().signal_all(), 2);
        assert!(reg_a.waiter().semaphore().try_acquire());
        assert!(reg_b.waiter().semaphore().try_acquire());
    }

    #[test]
    #[should_panic(expected = "inexplicably disappeared")]
    fn test_unregister_after_foreign_removal_panics() {
        let list = Mutex::new(WaiterList::new());
        let a = pin!(Waiter::new());
        let reg = Registration::register(&list, a.as_ref());

        // SAFETY: the record stays pinned and alive for the whole test.
        let removed = unsafe { list.lock().remove(NonNull::from(reg.waiter())) };
        assert!(removed);

        reg.unregister();
    }

    #[test]
    fn test_drop_during_unwind_does_not_panic_again() {
        let outcome = std::panic::catch_unwind(|| {
            let list = Mutex::new(WaiterList::new());
            let a = pin!(Waiter::new());
            let reg = Registration::register(&list, a.as_ref());

            // SAFETY: the record stays pinned and alive until the unwind ends.
            unsafe { list.lock().remove(NonNull::from(reg.waiter())) };
            panic!("unrelated failure while waiting");
        });

        // A second panic in drop would abort the test process instead
        let payload = outcome.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<&str>(),
            Some(&"unrelated failure while waiting")
        );
    }

    #[test]
    fn test_drop_of_foreign_removed_waiter_panics() {
        let outcome = std::panic::catch_unwind(|| {
            let list = Mutex::new(WaiterList::new());
            let a = pin!(Waiter::new());
            let reg = Registration::register(&list, a.as_ref());

            // SAFETY: the record stays pinned and alive until `reg` drops.
            unsafe { list.lock().remove(NonNull::from(reg.waiter())) };
            drop(reg);
        });

        let payload = outcome.unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();
        assert!(message.contains("inexplicably disappeared"));
    }

    #[test]
    fn test_signal_all_on_empty_list() {
        let list = WaiterList::new();
        assert_eq!(list.signal_all(), 0);
    }
}
