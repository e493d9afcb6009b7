//! Spin lock for state shared with interrupt handlers.
//!
//! Taking the lock first saves and clears the local interrupt-enable flag,
//! so a handler on the same hart can never spin on a lock its own hart
//! already holds. Dropping the guard releases the lock and then puts the
//! saved interrupt state back.

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::arch::interrupts::{self, IrqState};

/// Mutual exclusion with local interrupts disabled for the critical section.
///
/// Usable in `static` items. Hold it only for bounded work: no blocking and
/// no calls that could try to take the same lock again.
pub struct IrqSpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: Access to `data` is serialized by `locked`. `T: Send` because the
// holder may run on any hart.
unsafe impl<T: Send> Send for IrqSpinLock<T> {}
unsafe impl<T: Send> Sync for IrqSpinLock<T> {}

impl<T> IrqSpinLock<T> {
    /// Wraps `value` in an unlocked lock.
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Disables interrupts, then spins until the lock is free.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T> {
        let saved = interrupts::save_and_disable();
        loop {
            if self.acquire_weak() {
                return self.guard(saved);
            }
            // Wait on plain loads so the cache line stays shared while held.
            while self.is_locked() {
                core::hint::spin_loop();
            }
        }
    }

    /// Takes the lock if it is free. Interrupts are left as they were on
    /// failure.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T>> {
        let saved = interrupts::save_and_disable();
        let won = self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if won {
            Some(self.guard(saved))
        } else {
            interrupts::restore(saved);
            None
        }
    }

    /// Returns `true` if some context currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Borrows the data mutably without locking; `&mut self` already proves
    /// exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Unwraps the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn acquire_weak(&self) -> bool {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn guard(&self, saved: IrqState) -> IrqSpinLockGuard<'_, T> {
        IrqSpinLockGuard {
            lock: self,
            saved,
            _not_send: PhantomData,
        }
    }
}

/// Access to the data of a held [`IrqSpinLock`].
pub struct IrqSpinLockGuard<'a, T> {
    lock: &'a IrqSpinLock<T>,
    saved: IrqState,
    // The saved state belongs to this hart; the guard must not migrate.
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for IrqSpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Holding the guard means holding the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for IrqSpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Holding the guard means holding the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for IrqSpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
        interrupts::restore(self.saved);
    }
}
