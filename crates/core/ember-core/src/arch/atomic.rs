//! Relaxed read-modify-write operations on machine words.
//!
//! These are for non-blocking counters and simple flags only. Every
//! operation uses [`Ordering::Relaxed`]; callers that need the update ordered
//! against other memory accesses pair it with a fence from
//! [`barrier`](super::barrier).

use core::sync::atomic::{AtomicI32, AtomicIsize, AtomicU32, AtomicUsize, Ordering};

/// Relaxed atomic arithmetic and bit operations.
///
/// Each method returns the value held *before* the operation.
pub trait RelaxedAtomic {
    /// The plain integer type stored in the atomic.
    type Value: Copy;

    /// Adds `val` (wrapping on overflow).
    fn add(&self, val: Self::Value) -> Self::Value;
    /// Bitwise-ORs `val` into the stored value.
    fn or(&self, val: Self::Value) -> Self::Value;
    /// Bitwise-ANDs `val` into the stored value.
    fn and(&self, val: Self::Value) -> Self::Value;
    /// Stores `val`.
    fn swap(&self, val: Self::Value) -> Self::Value;
}

macro_rules! impl_relaxed_atomic {
    ($($atomic:ty => $value:ty),* $(,)?) => {
        $(
            impl RelaxedAtomic for $atomic {
                type Value = $value;

                #[inline]
                fn add(&self, val: $value) -> $value {
                    self.fetch_add(val, Ordering::Relaxed)
                }

                #[inline]
                fn or(&self, val: $value) -> $value {
                    self.fetch_or(val, Ordering::Relaxed)
                }

                #[inline]
                fn and(&self, val: $value) -> $value {
                    self.fetch_and(val, Ordering::Relaxed)
                }

                #[inline]
                fn swap(&self, val: $value) -> $value {
                    <$atomic>::swap(self, val, Ordering::Relaxed)
                }
            }
        )*
    };
}

impl_relaxed_atomic! {
    AtomicI32 => i32,
    AtomicU32 => u32,
    AtomicIsize => isize,
    AtomicUsize => usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn operations_return_previous_value() {
        let v = AtomicI32::new(5);
        assert_eq!(v.add(3), 5);
        assert_eq!(v.or(0b1_0000), 8);
        assert_eq!(v.and(0b1_1000), 0b1_1000);
        assert_eq!(RelaxedAtomic::swap(&v, -1), 0b1_1000);
        assert_eq!(v.load(Ordering::Relaxed), -1);
    }

    #[test]
    fn add_wraps() {
        let v = AtomicU32::new(u32::MAX);
        assert_eq!(v.add(2), u32::MAX);
        assert_eq!(v.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn concurrent_counter_loses_no_increments() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10_000;

        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        counter.add(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), THREADS * PER_THREAD);
    }

    #[test]
    fn concurrent_or_sets_every_bit() {
        let flags = Arc::new(AtomicIsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|bit| {
                let flags = Arc::clone(&flags);
                thread::spawn(move || {
                    flags.or(1 << bit);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(flags.load(Ordering::Relaxed), 0xFFFF);
    }
}
