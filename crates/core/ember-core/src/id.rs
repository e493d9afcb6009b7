//! Identifier newtypes for harts, logical CPUs and interrupt vectors.
//!
//! Hart numbers come from the hardware, logical CPU numbers from boot-time
//! assignment, and vectors from the interrupt controller. Keeping them as
//! distinct types stops one from being passed where another is expected.

use core::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($raw:ty), $as_raw:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name($raw);

        impl $name {
            /// Wraps a raw number.
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            /// The raw number.
            pub const fn $as_raw(self) -> $raw {
                self.0
            }

        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id! {
    /// Hardware thread number (`mhartid` on RISC-V).
    HartId(u32), as_u32
}

define_id! {
    /// Logical CPU number assigned at boot.
    CpuId(u32), as_u32
}

define_id! {
    /// Interrupt vector at the platform controller.
    IrqVector(u8), as_u8
}

impl HartId {
    /// The raw number, widened for table indexing.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl CpuId {
    /// The boot CPU, and the only CPU of a single-hart build.
    pub const BOOT: Self = Self(0);

    /// The raw number, widened for table indexing.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl IrqVector {
    /// The raw number, widened for table indexing.
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_survive_wrapping() {
        assert_eq!(HartId::new(3).as_u32(), 3);
        assert_eq!(HartId::new(3).as_usize(), 3);
        assert_eq!(IrqVector::new(12).as_usize(), 12);
    }

    #[test]
    fn widest_raw_values_index_unchanged() {
        assert_eq!(IrqVector::new(u8::MAX).as_usize(), 255);
        assert_eq!(CpuId::new(u32::MAX).as_usize(), 0xffff_ffff);
        assert_eq!(HartId::new(1 << 31).as_usize(), 0x8000_0000);
    }

    #[test]
    fn boot_cpu_is_zero() {
        assert_eq!(CpuId::BOOT, CpuId::new(0));
        assert_eq!(format!("{}", CpuId::new(2)), "2");
    }

    #[test]
    fn vectors_order_numerically() {
        assert!(IrqVector::new(7) < IrqVector::new(8));
        assert_eq!(format!("{:>3}", IrqVector::new(9)), "  9");
    }
}
