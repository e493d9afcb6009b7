//! Current-thread and current-CPU accessors.
//!
//! On RISC-V the current thread pointer lives in `tp`. The current hart is
//! read from `mhartid` in machine mode; supervisor mode cannot read it, so the
//! platform registers a lookup with [`set_hart_id_fn`] during bring-up.
//!
//! Logical CPU numbers are assigned by boot code through [`HART_TO_CPU`].
//! A hart that reaches [`curr_cpu_num`] without an assignment is a
//! topology bug and halts the system.

use core::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

use crate::id::{CpuId, HartId};

/// Upper bound on hart numbers the hart → CPU table can hold.
pub const MAX_HARTS: usize = 32;

// ---------------------------------------------------------------------------
// Current thread
// ---------------------------------------------------------------------------

#[cfg(not(all(
    target_os = "none",
    any(target_arch = "riscv32", target_arch = "riscv64")
)))]
static CURRENT_THREAD: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Returns the thread running on this hart, as recorded by
/// [`set_current_thread`].
#[inline]
pub fn current_thread<T>() -> *mut T {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    {
        let thread: *mut T;
        // SAFETY: Reading `tp` has no side effects.
        unsafe {
            core::arch::asm!("mv {}, tp", out(reg) thread, options(nomem, nostack));
        }
        thread
    }
    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    {
        CURRENT_THREAD.load(Ordering::Relaxed).cast()
    }
}

/// Records `thread` as the thread running on this hart.
///
/// Host builds keep a single process-wide slot.
#[inline]
pub fn set_current_thread<T>(thread: *mut T) {
    #[cfg(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    // SAFETY: The kernel reserves `tp` for the current thread pointer and
    // never uses it for thread-local storage.
    unsafe {
        core::arch::asm!("mv tp, {}", in(reg) thread, options(nomem, nostack));
    }

    #[cfg(not(all(
        target_os = "none",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    CURRENT_THREAD.store(thread.cast(), Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Current hart
// ---------------------------------------------------------------------------

/// The signature of the platform's current-hart lookup.
pub type HartIdFn = fn() -> HartId;

fn boot_hart() -> HartId {
    HartId::new(0)
}

static HART_ID_FN: AtomicPtr<()> = AtomicPtr::new(boot_hart as *mut ());

/// Registers the platform's current-hart lookup.
///
/// Until this is called every hart reports itself as hart 0. Ignored when
/// built with `riscv-m-mode` on RISC-V, where `mhartid` is read directly.
///
/// # Safety
///
/// `f` must be callable from any context, including trap handlers with
/// interrupts disabled, and must return the id of the hart it runs on.
pub unsafe fn set_hart_id_fn(f: HartIdFn) {
    HART_ID_FN.store(f as *mut (), Ordering::Release);
}

/// Returns the hardware id of the hart executing this call.
#[inline]
pub fn current_hart() -> HartId {
    #[cfg(all(
        target_os = "none",
        feature = "riscv-m-mode",
        any(target_arch = "riscv32", target_arch = "riscv64")
    ))]
    {
        let hart: usize;
        // SAFETY: Reading `mhartid` has no side effects.
        unsafe {
            core::arch::asm!("csrr {}, mhartid", out(reg) hart, options(nomem, nostack));
        }
        #[allow(clippy::cast_possible_truncation)]
        let hart = hart as u32;
        HartId::new(hart)
    }
    #[cfg(not(all(
        target_os = "none",
        feature = "riscv-m-mode",
        any(target_arch = "riscv32", target_arch = "riscv64")
    )))]
    {
        let ptr = HART_ID_FN.load(Ordering::Acquire);
        // SAFETY: We only ever store valid `HartIdFn` pointers into HART_ID_FN.
        let f = unsafe { core::mem::transmute::<*mut (), HartIdFn>(ptr) };
        f()
    }
}

// ---------------------------------------------------------------------------
// Hart -> logical CPU
// ---------------------------------------------------------------------------

const UNASSIGNED: i32 = -1;

/// Table mapping hart numbers to logical CPU numbers.
///
/// Entries are written once during bring-up and read lock-free afterwards.
pub struct HartMap {
    cpus: [AtomicI32; MAX_HARTS],
}

impl HartMap {
    /// Creates a table with every hart unassigned.
    pub const fn new() -> Self {
        Self {
            cpus: [const { AtomicI32::new(UNASSIGNED) }; MAX_HARTS],
        }
    }

    /// Assigns logical CPU `cpu` to `hart`.
    ///
    /// A hart number beyond [`MAX_HARTS`] is a boot configuration error and
    /// halts the system.
    pub fn assign(&self, hart: HartId, cpu: CpuId) {
        let Some(slot) = self.cpus.get(hart.as_usize()) else {
            crate::fatal!("hart {hart} exceeds MAX_HARTS ({MAX_HARTS})");
        };
        let Ok(cpu) = i32::try_from(cpu.as_u32()) else {
            crate::fatal!("cpu {cpu} for hart {hart} is out of range");
        };
        slot.store(cpu, Ordering::Release);
    }

    /// Returns the logical CPU assigned to `hart`, if any.
    pub fn lookup(&self, hart: HartId) -> Option<CpuId> {
        let cpu = self.cpus.get(hart.as_usize())?.load(Ordering::Acquire);
        u32::try_from(cpu).ok().map(CpuId::new)
    }

    /// Returns the logical CPU assigned to `hart`.
    ///
    /// Halts the system if `hart` was never assigned one.
    pub fn cpu_of(&self, hart: HartId) -> CpuId {
        match self.lookup(hart) {
            Some(cpu) => cpu,
            None => crate::fatal!("hart {hart} not assigned a cpu"),
        }
    }
}

impl Default for HartMap {
    fn default() -> Self {
        Self::new()
    }
}

/// The system-wide hart → logical CPU table, filled in by boot code.
pub static HART_TO_CPU: HartMap = HartMap::new();

/// Returns the logical CPU number of the calling hart.
///
/// Single-hart builds always run on [`CpuId::BOOT`].
#[inline]
pub fn curr_cpu_num() -> CpuId {
    #[cfg(feature = "smp")]
    {
        HART_TO_CPU.cpu_of(current_hart())
    }
    #[cfg(not(feature = "smp"))]
    {
        CpuId::BOOT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_thread_round_trip() {
        let mut slot = 7u64;
        set_current_thread(&raw mut slot);
        assert_eq!(current_thread::<u64>(), &raw mut slot);
        set_current_thread::<u64>(core::ptr::null_mut());
    }

    #[test]
    fn default_hart_is_zero() {
        assert_eq!(current_hart(), HartId::new(0));
    }

    #[test]
    fn assign_and_lookup() {
        let map = HartMap::new();
        assert_eq!(map.lookup(HartId::new(3)), None);
        map.assign(HartId::new(3), CpuId::new(1));
        assert_eq!(map.lookup(HartId::new(3)), Some(CpuId::new(1)));
        assert_eq!(map.cpu_of(HartId::new(3)), CpuId::new(1));
    }

    #[test]
    fn lookup_out_of_range_hart_is_none() {
        let map = HartMap::new();
        assert_eq!(map.lookup(HartId::new(MAX_HARTS as u32)), None);
    }

    #[test]
    #[should_panic(expected = "hart 5 not assigned a cpu")]
    fn unassigned_hart_is_fatal() {
        let map = HartMap::new();
        map.assign(HartId::new(0), CpuId::BOOT);
        let _ = map.cpu_of(HartId::new(5));
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_HARTS")]
    fn assigning_beyond_table_is_fatal() {
        HartMap::new().assign(HartId::new(MAX_HARTS as u32), CpuId::BOOT);
    }

    #[cfg(not(feature = "smp"))]
    #[test]
    fn single_hart_build_is_always_boot_cpu() {
        assert_eq!(curr_cpu_num(), CpuId::BOOT);
    }

    #[cfg(feature = "smp")]
    #[test]
    fn smp_build_maps_current_hart() {
        HART_TO_CPU.assign(HartId::new(0), CpuId::new(0));
        assert_eq!(curr_cpu_num(), CpuId::new(0));
    }
}
