//! Memory fences.
//!
//! [`mb`], [`wmb`] and [`rmb`] always emit a hardware fence, including
//! device I/O on RISC-V. The `smp_*` variants only order normal memory
//! between harts: with the `smp` feature they emit a real fence, without it
//! they reduce to a compiler fence.

#[cfg(not(all(
    target_os = "none",
    any(target_arch = "riscv32", target_arch = "riscv64")
)))]
use core::sync::atomic::{Ordering, fence};

#[cfg(all(
    target_os = "none",
    any(target_arch = "riscv32", target_arch = "riscv64")
))]
macro_rules! riscv_fence {
    ($pred_succ:literal) => {
        // SAFETY: A fence has no effect besides ordering memory accesses.
        unsafe {
            core::arch::asm!(concat!("fence ", $pred_succ), options(nostack, preserves_flags));
        }
    };
}

/// Full fence: orders all prior loads, stores and device I/O before all
/// subsequent ones.
#[inline]
pub fn mb() {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    riscv_fence!("iorw,iorw");

    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    fence(Ordering::SeqCst);
}

/// Write fence: orders prior stores and device output before subsequent ones.
#[inline]
pub fn wmb() {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    riscv_fence!("ow,ow");

    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    fence(Ordering::Release);
}

/// Read fence: orders prior loads and device input before subsequent ones.
#[inline]
pub fn rmb() {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    riscv_fence!("ir,ir");

    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    fence(Ordering::Acquire);
}

#[cfg(feature = "smp")]
mod smp {
    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    use core::sync::atomic::{Ordering, fence};

    /// SMP full fence.
    #[inline]
    pub fn smp_mb() {
        #[cfg(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        riscv_fence!("rw,rw");

        #[cfg(not(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        )))]
        fence(Ordering::SeqCst);
    }

    /// SMP write fence.
    #[inline]
    pub fn smp_wmb() {
        #[cfg(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        riscv_fence!("w,w");

        #[cfg(not(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        )))]
        fence(Ordering::Release);
    }

    /// SMP read fence.
    #[inline]
    pub fn smp_rmb() {
        #[cfg(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        riscv_fence!("r,r");

        #[cfg(not(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        )))]
        fence(Ordering::Acquire);
    }
}

#[cfg(not(feature = "smp"))]
mod smp {
    use core::sync::atomic::{Ordering, compiler_fence};

    /// SMP full fence (single-hart build: compiler fence only).
    #[inline]
    pub fn smp_mb() {
        compiler_fence(Ordering::SeqCst);
    }

    /// SMP write fence (single-hart build: compiler fence only).
    #[inline]
    pub fn smp_wmb() {
        compiler_fence(Ordering::SeqCst);
    }

    /// SMP read fence (single-hart build: compiler fence only).
    #[inline]
    pub fn smp_rmb() {
        compiler_fence(Ordering::SeqCst);
    }
}

pub use smp::{smp_mb, smp_rmb, smp_wmb};
