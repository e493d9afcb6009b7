//! Saved register state and the CP0 registers that describe a trap.

use core::fmt;

bitflags::bitflags! {
    /// CP0 Status register (MIPS32).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Global interrupt enable.
        const IE  = 1 << 0;
        /// Exception level.
        const EXL = 1 << 1;
        /// Error level.
        const ERL = 1 << 2;
        /// User mode.
        const UM  = 1 << 4;
        /// Interrupt mask, one bit per CPU interrupt line.
        const IM0 = 1 << 8;
        /// Interrupt mask, line 1.
        const IM1 = 1 << 9;
        /// Interrupt mask, line 2.
        const IM2 = 1 << 10;
        /// Interrupt mask, line 3.
        const IM3 = 1 << 11;
        /// Interrupt mask, line 4.
        const IM4 = 1 << 12;
        /// Interrupt mask, line 5.
        const IM5 = 1 << 13;
        /// Interrupt mask, line 6.
        const IM6 = 1 << 14;
        /// Interrupt mask, line 7.
        const IM7 = 1 << 15;
        /// Bootstrap exception vectors.
        const BEV = 1 << 22;
        /// Coprocessor 0 usable in user mode.
        const CU0 = 1 << 28;
        /// Coprocessor 1 (FPU) usable.
        const CU1 = 1 << 29;

        const _ = !0;
    }
}

bitflags::bitflags! {
    /// CP0 Cause register (MIPS32).
    ///
    /// The multi-bit fields (`ExcCode`, `CE`) are read with
    /// [`exc_code`](Self::exc_code) and [`coprocessor`](Self::coprocessor).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cause: u32 {
        /// Software interrupt 0 pending.
        const IP0 = 1 << 8;
        /// Software interrupt 1 pending.
        const IP1 = 1 << 9;
        /// Hardware line 2 pending.
        const IP2 = 1 << 10;
        /// Hardware line 3 pending.
        const IP3 = 1 << 11;
        /// Hardware line 4 pending.
        const IP4 = 1 << 12;
        /// Hardware line 5 pending.
        const IP5 = 1 << 13;
        /// Hardware line 6 pending.
        const IP6 = 1 << 14;
        /// Hardware line 7 (timer) pending.
        const IP7 = 1 << 15;
        /// Interrupts use the special vector.
        const IV  = 1 << 23;
        /// Timer interrupt pending.
        const TI  = 1 << 30;
        /// The faulting instruction sits in a branch delay slot.
        const BD  = 1 << 31;

        const _ = !0;
    }
}

impl Cause {
    const EXC_CODE_SHIFT: u32 = 2;
    const EXC_CODE_MASK: u32 = 0x1F;
    const CE_SHIFT: u32 = 28;
    const CE_MASK: u32 = 0x3;

    /// The ExcCode field (bits 6:2).
    #[allow(clippy::cast_possible_truncation)]
    pub const fn exc_code(self) -> u8 {
        ((self.bits() >> Self::EXC_CODE_SHIFT) & Self::EXC_CODE_MASK) as u8
    }

    /// The CE field (bits 29:28): coprocessor unit of a coprocessor-unusable
    /// exception.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn coprocessor(self) -> u8 {
        ((self.bits() >> Self::CE_SHIFT) & Self::CE_MASK) as u8
    }
}

/// Register state saved by the low-level trap entry.
///
/// Layout is shared with the assembly stub.
#[repr(C)]
#[derive(Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct TrapFrame {
    pub at: u32,
    pub v0: u32,
    pub v1: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub t0: u32,
    pub t1: u32,
    pub t2: u32,
    pub t3: u32,
    pub t4: u32,
    pub t5: u32,
    pub t6: u32,
    pub t7: u32,
    pub t8: u32,
    pub t9: u32,
    pub gp: u32,
    pub sp: u32,
    pub ra: u32,
    pub status: u32,
    pub cause: u32,
    pub epc: u32,
}

impl TrapFrame {
    /// Saved Status register.
    pub const fn status(&self) -> Status {
        Status::from_bits_retain(self.status)
    }

    /// Saved Cause register.
    pub const fn cause(&self) -> Cause {
        Cause::from_bits_retain(self.cause)
    }
}

impl fmt::Debug for TrapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrapFrame")
            .field("epc", &format_args!("{:#010x}", self.epc))
            .field("status", &format_args!("{:#010x}", self.status))
            .field("cause", &format_args!("{:#010x}", self.cause))
            .field("sp", &format_args!("{:#010x}", self.sp))
            .field("ra", &format_args!("{:#010x}", self.ra))
            .finish_non_exhaustive()
    }
}
