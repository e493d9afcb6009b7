//! Local interrupt-enable control.
//!
//! On RISC-V the global enable bit lives in `sstatus.SIE`, or `mstatus.MIE`
//! with the `riscv-m-mode` feature. On MIPS it is CP0 `Status.IE`, toggled by
//! `di`/`ei` helpers linked in from the board's trap-entry assembly (stable
//! Rust has no MIPS inline assembly). On x86_64 it is `RFLAGS.IF`, on AArch64
//! the DAIF mask. Host builds have no interrupts to mask: every operation is
//! a no-op and interrupts always read as enabled.

/// Interrupt-enable state captured by [`save_and_disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "dropping the saved state leaves interrupts disabled"]
pub struct IrqState(usize);

impl IrqState {
    /// Returns `true` if interrupts were enabled when the state was saved.
    pub fn was_enabled(self) -> bool {
        #[cfg(all(
            target_os = "none",
            any(target_arch = "riscv32", target_arch = "riscv64")
        ))]
        {
            self.0 & riscv::XSTATUS_IE != 0
        }
        #[cfg(all(target_os = "none", target_arch = "mips"))]
        {
            self.0 & mips::STATUS_IE != 0
        }
        #[cfg(all(target_os = "none", target_arch = "x86_64"))]
        {
            self.0 & (1 << 9) != 0
        }
        #[cfg(all(target_os = "none", target_arch = "aarch64"))]
        {
            // DAIF.I set means IRQs are masked.
            self.0 & (1 << 7) == 0
        }
        #[cfg(not(target_os = "none"))]
        {
            self.0 != 0
        }
    }
}

// ---------------------------------------------------------------------------
// RISC-V
// ---------------------------------------------------------------------------

#[cfg(all(
    target_os = "none",
    any(target_arch = "riscv32", target_arch = "riscv64")
))]
mod riscv {
    #[cfg(feature = "riscv-m-mode")]
    macro_rules! xstatus {
        () => {
            "mstatus"
        };
    }
    #[cfg(not(feature = "riscv-m-mode"))]
    macro_rules! xstatus {
        () => {
            "sstatus"
        };
    }

    /// `mstatus.MIE` (bit 3) or `sstatus.SIE` (bit 1).
    #[cfg(feature = "riscv-m-mode")]
    pub(super) const XSTATUS_IE: usize = 1 << 3;
    #[cfg(not(feature = "riscv-m-mode"))]
    pub(super) const XSTATUS_IE: usize = 1 << 1;

    #[inline]
    pub(super) fn set_ie() {
        // SAFETY: Setting the global interrupt-enable bit is safe in kernel mode.
        unsafe {
            core::arch::asm!(
                concat!("csrsi ", xstatus!(), ", {ie}"),
                ie = const XSTATUS_IE,
                options(nomem, nostack),
            );
        }
    }

    #[inline]
    pub(super) fn clear_ie() {
        // SAFETY: Clearing the global interrupt-enable bit is safe in kernel mode.
        unsafe {
            core::arch::asm!(
                concat!("csrci ", xstatus!(), ", {ie}"),
                ie = const XSTATUS_IE,
                options(nomem, nostack),
            );
        }
    }

    #[inline]
    pub(super) fn read() -> usize {
        let status: usize;
        // SAFETY: Reading the status CSR has no side effects.
        unsafe {
            core::arch::asm!(
                concat!("csrr {}, ", xstatus!()),
                out(reg) status,
                options(nomem, nostack),
            );
        }
        status
    }

    #[inline]
    pub(super) fn read_and_clear_ie() -> usize {
        let status: usize;
        // SAFETY: Atomically reading the status CSR and masking interrupts is
        // safe in kernel mode.
        unsafe {
            core::arch::asm!(
                concat!("csrrci {}, ", xstatus!(), ", {ie}"),
                out(reg) status,
                ie = const XSTATUS_IE,
                options(nomem, nostack),
            );
        }
        status
    }
}

// ---------------------------------------------------------------------------
// MIPS
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "none", target_arch = "mips"))]
mod mips {
    /// CP0 `Status.IE`.
    pub(super) const STATUS_IE: usize = 1 << 0;

    unsafe extern "C" {
        fn arch_mips_ei();
        fn arch_mips_di() -> u32;
        fn arch_mips_read_status() -> u32;
    }

    #[inline]
    pub(super) fn set_ie() {
        // SAFETY: `ei` only sets Status.IE.
        unsafe { arch_mips_ei() }
    }

    #[inline]
    pub(super) fn read_and_clear_ie() -> usize {
        // SAFETY: `di` clears Status.IE and returns the previous Status.
        unsafe { arch_mips_di() as usize }
    }

    #[inline]
    pub(super) fn read() -> usize {
        // SAFETY: `mfc0 $12` has no side effects.
        unsafe { arch_mips_read_status() as usize }
    }
}

/// Enables interrupts on the current hart.
#[inline]
pub fn enable() {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    riscv::set_ie();

    #[cfg(all(target_os = "none", target_arch = "mips"))]
    mips::set_ie();

    #[cfg(all(target_os = "none", target_arch = "x86_64"))]
    // SAFETY: Enabling interrupts is safe in kernel mode.
    unsafe {
        core::arch::asm!("sti", options(nomem, nostack, preserves_flags));
    }

    #[cfg(all(target_os = "none", target_arch = "aarch64"))]
    // SAFETY: Unmasking IRQs is safe in kernel mode.
    unsafe {
        core::arch::asm!("msr DAIFClr, #0x2", options(nomem, nostack, preserves_flags));
    }
}

/// Disables interrupts on the current hart.
#[inline]
pub fn disable() {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    riscv::clear_ie();

    #[cfg(all(target_os = "none", target_arch = "mips"))]
    let _ = mips::read_and_clear_ie();

    #[cfg(all(target_os = "none", target_arch = "x86_64"))]
    // SAFETY: Disabling interrupts is safe in kernel mode.
    unsafe {
        core::arch::asm!("cli", options(nomem, nostack, preserves_flags));
    }

    #[cfg(all(target_os = "none", target_arch = "aarch64"))]
    // SAFETY: Masking IRQs is safe in kernel mode.
    unsafe {
        core::arch::asm!("msr DAIFSet, #0x2", options(nomem, nostack, preserves_flags));
    }
}

/// Returns `true` if interrupts are currently disabled on this hart.
#[inline]
pub fn are_disabled() -> bool {
    !read_state().was_enabled()
}

#[inline]
fn read_state() -> IrqState {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    {
        IrqState(riscv::read())
    }
    #[cfg(all(target_os = "none", target_arch = "mips"))]
    {
        IrqState(mips::read())
    }
    #[cfg(all(target_os = "none", target_arch = "x86_64"))]
    {
        let flags: u64;
        // SAFETY: Reading RFLAGS has no side effects.
        unsafe {
            core::arch::asm!("pushfq", "pop {}", out(reg) flags, options(nomem));
        }
        #[allow(clippy::cast_possible_truncation)]
        let flags = flags as usize;
        IrqState(flags)
    }
    #[cfg(all(target_os = "none", target_arch = "aarch64"))]
    {
        let daif: u64;
        // SAFETY: Reading DAIF has no side effects.
        unsafe {
            core::arch::asm!("mrs {}, DAIF", out(reg) daif, options(nomem, nostack));
        }
        #[allow(clippy::cast_possible_truncation)]
        let daif = daif as usize;
        IrqState(daif)
    }
    #[cfg(not(target_os = "none"))]
    {
        IrqState(1)
    }
}

/// Saves the current interrupt-enable state and disables interrupts.
///
/// Pair with [`restore`]; nested save/restore pairs must unwind in reverse
/// order of creation.
#[inline]
pub fn save_and_disable() -> IrqState {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    {
        IrqState(riscv::read_and_clear_ie())
    }
    #[cfg(all(target_os = "none", target_arch = "mips"))]
    {
        IrqState(mips::read_and_clear_ie())
    }
    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64", target_arch = "mips")
    )))]
    {
        let state = read_state();
        disable();
        state
    }
}

/// Restores a state previously returned by [`save_and_disable`].
///
/// Only re-enables interrupts; never disables them.
#[inline]
pub fn restore(state: IrqState) {
    if state.was_enabled() {
        enable();
    }
}
