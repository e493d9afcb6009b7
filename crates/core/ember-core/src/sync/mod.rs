//! Synchronization primitives for interrupt-context code.
//!
//! Provides [`IrqSpinLock`], the lock every piece of state shared between
//! normal kernel execution and trap handlers is kept behind.

mod irq_spinlock;

pub use irq_spinlock::{IrqSpinLock, IrqSpinLockGuard};
