//! Architecture-exposed primitives.
//!
//! The selection between instruction sequences happens at compile time via
//! `target_arch`, `target_os` and the crate's Cargo features. Host builds
//! (`target_os != "none"`) get portable fallbacks.

pub mod atomic;
pub mod barrier;
pub mod interrupts;

/// Parks the current hart forever.
///
/// Does not touch the interrupt-enable state; callers that must not be
/// woken into a handler disable interrupts first.
pub fn halt() -> ! {
    loop {
        #[cfg(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        // SAFETY: `wfi` only stalls the hart until the next interrupt.
        unsafe {
            core::arch::asm!("wfi", options(nomem, nostack));
        }

        #[cfg(not(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        )))]
        core::hint::spin_loop();
    }
}

#[cfg(not(all(
    target_os = "none",
    any(
        target_arch = "riscv32",
        target_arch = "riscv64",
        target_arch = "mips",
        target_arch = "x86_64",
        target_arch = "aarch64"
    )
)))]
static HOST_CYCLES: core::sync::atomic::AtomicUsize = core::sync::atomic::AtomicUsize::new(0);

#[cfg(all(target_os = "none", target_arch = "mips"))]
unsafe extern "C" {
    fn arch_mips_read_count() -> u32;
}

/// Free-running cycle counter of the current hart.
///
/// Reads `mcycle` in machine mode and `cycle` otherwise on RISC-V, CP0
/// `Count` on MIPS, the TSC on x86_64 and `CNTVCT_EL0` on aarch64. On
/// RV32 and MIPS only the low 32 bits are returned, so the value wraps.
/// Host builds return a per-process counter that grows on every call.
#[inline]
pub fn cycle_count() -> u64 {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    {
        let ticks: usize;
        #[cfg(feature = "riscv-m-mode")]
        // SAFETY: Reading `mcycle` has no side effects.
        unsafe {
            core::arch::asm!("csrr {}, mcycle", out(reg) ticks, options(nomem, nostack));
        }
        #[cfg(not(feature = "riscv-m-mode"))]
        // SAFETY: Reading `cycle` has no side effects.
        unsafe {
            core::arch::asm!("csrr {}, cycle", out(reg) ticks, options(nomem, nostack));
        }
        ticks as u64
    }

    #[cfg(all(target_os = "none", target_arch = "mips"))]
    {
        // SAFETY: `mfc0 $9` has no side effects.
        u64::from(unsafe { arch_mips_read_count() })
    }

    #[cfg(all(target_os = "none", target_arch = "x86_64"))]
    {
        let lo: u32;
        let hi: u32;
        // SAFETY: `rdtsc` only reads the time-stamp counter.
        unsafe {
            core::arch::asm!(
                "rdtsc",
                out("eax") lo,
                out("edx") hi,
                options(nomem, nostack, preserves_flags)
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }

    #[cfg(all(target_os = "none", target_arch = "aarch64"))]
    {
        let ticks: u64;
        // SAFETY: Reading CNTVCT_EL0 has no side effects.
        unsafe {
            core::arch::asm!("mrs {}, cntvct_el0", out(reg) ticks, options(nomem, nostack));
        }
        ticks
    }

    #[cfg(not(all(
        target_os = "none",
        any(
            target_arch = "riscv32",
            target_arch = "riscv64",
            target_arch = "mips",
            target_arch = "x86_64",
            target_arch = "aarch64"
        )
    )))]
    {
        HOST_CYCLES.fetch_add(1, core::sync::atomic::Ordering::Relaxed) as u64
    }
}
