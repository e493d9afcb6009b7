//! Classification of trap causes.

use core::fmt;

use super::frame::Cause;
use crate::config::{ISA_CPU_LINE, TIMER_CPU_LINE};

/// A decoded Cause.ExcCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// External or software interrupt.
    Interrupt,
    /// Store to a clean TLB page.
    TlbModified,
    /// TLB miss or invalid entry on load or fetch.
    TlbLoad,
    /// TLB miss or invalid entry on store.
    TlbStore,
    /// Misaligned or privileged address on load or fetch.
    AddressErrorLoad,
    /// Misaligned or privileged address on store.
    AddressErrorStore,
    /// Bus error on instruction fetch.
    BusErrorFetch,
    /// Bus error on data access.
    BusErrorData,
    /// `syscall` instruction.
    Syscall,
    /// `break` instruction.
    Breakpoint,
    /// Reserved instruction.
    ReservedInstruction,
    /// Coprocessor `unit` is not enabled in Status.
    CoprocessorUnusable {
        /// Cause.CE.
        unit: u8,
    },
    /// Signed arithmetic overflow.
    Overflow,
    /// Trap instruction condition met.
    Trap,
    /// Floating-point exception.
    FloatingPoint,
    /// Coprocessor 2 implementation-specific exception.
    Coprocessor2,
    /// MDMX unusable.
    Mdmx,
    /// Watchpoint hit.
    Watch,
    /// Machine check (duplicate TLB entry).
    MachineCheck,
    /// MT thread exception.
    Thread,
    /// DSP ASE disabled.
    DspDisabled,
    /// Cache parity or ECC error.
    CacheError,
    /// Any code not listed above.
    Reserved {
        /// Raw ExcCode.
        code: u8,
    },
}

impl Exception {
    /// Decodes the ExcCode field of `cause`.
    pub const fn from_cause(cause: Cause) -> Self {
        match cause.exc_code() {
            0 => Self::Interrupt,
            1 => Self::TlbModified,
            2 => Self::TlbLoad,
            3 => Self::TlbStore,
            4 => Self::AddressErrorLoad,
            5 => Self::AddressErrorStore,
            6 => Self::BusErrorFetch,
            7 => Self::BusErrorData,
            8 => Self::Syscall,
            9 => Self::Breakpoint,
            10 => Self::ReservedInstruction,
            11 => Self::CoprocessorUnusable {
                unit: cause.coprocessor(),
            },
            12 => Self::Overflow,
            13 => Self::Trap,
            15 => Self::FloatingPoint,
            18 => Self::Coprocessor2,
            22 => Self::Mdmx,
            23 => Self::Watch,
            24 => Self::MachineCheck,
            25 => Self::Thread,
            26 => Self::DspDisabled,
            30 => Self::CacheError,
            code => Self::Reserved { code },
        }
    }

    /// The ExcCode value this variant decodes from.
    pub const fn code(self) -> u8 {
        match self {
            Self::Interrupt => 0,
            Self::TlbModified => 1,
            Self::TlbLoad => 2,
            Self::TlbStore => 3,
            Self::AddressErrorLoad => 4,
            Self::AddressErrorStore => 5,
            Self::BusErrorFetch => 6,
            Self::BusErrorData => 7,
            Self::Syscall => 8,
            Self::Breakpoint => 9,
            Self::ReservedInstruction => 10,
            Self::CoprocessorUnusable { .. } => 11,
            Self::Overflow => 12,
            Self::Trap => 13,
            Self::FloatingPoint => 15,
            Self::Coprocessor2 => 18,
            Self::Mdmx => 22,
            Self::Watch => 23,
            Self::MachineCheck => 24,
            Self::Thread => 25,
            Self::DspDisabled => 26,
            Self::CacheError => 30,
            Self::Reserved { code } => code,
        }
    }

    /// Mnemonic as used in the MIPS32 architecture manual.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "Int",
            Self::TlbModified => "Mod",
            Self::TlbLoad => "TLBL",
            Self::TlbStore => "TLBS",
            Self::AddressErrorLoad => "AdEL",
            Self::AddressErrorStore => "AdES",
            Self::BusErrorFetch => "IBE",
            Self::BusErrorData => "DBE",
            Self::Syscall => "Sys",
            Self::Breakpoint => "Bp",
            Self::ReservedInstruction => "RI",
            Self::CoprocessorUnusable { .. } => "CpU",
            Self::Overflow => "Ov",
            Self::Trap => "Tr",
            Self::FloatingPoint => "FPE",
            Self::Coprocessor2 => "C2E",
            Self::Mdmx => "MDMX",
            Self::Watch => "WATCH",
            Self::MachineCheck => "MCheck",
            Self::Thread => "Thread",
            Self::DspDisabled => "DSPDis",
            Self::CacheError => "CacheErr",
            Self::Reserved { .. } => "reserved",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoprocessorUnusable { unit } => {
                write!(f, "{} (excode {}, cp{unit})", self.name(), self.code())
            }
            _ => write!(f, "{} (excode {})", self.name(), self.code()),
        }
    }
}

/// A CPU interrupt line and what is wired to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuIrqLine {
    /// Output of the ISA interrupt controller.
    Isa,
    /// CP0 count/compare timer.
    Timer,
    /// Nothing is routed on this line.
    Unrouted(u8),
}

impl CpuIrqLine {
    /// Classifies CPU interrupt line `line`.
    pub const fn from_line(line: u8) -> Self {
        match line {
            ISA_CPU_LINE => Self::Isa,
            TIMER_CPU_LINE => Self::Timer,
            other => Self::Unrouted(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cause_with(code: u32) -> Cause {
        Cause::from_bits_retain(code << 2)
    }

    #[test]
    fn syscall_is_code_eight() {
        assert_eq!(Exception::from_cause(cause_with(8)), Exception::Syscall);
        // Pending-interrupt and delay-slot bits do not disturb the field.
        let noisy = Cause::from_bits_retain((8 << 2) | Cause::BD.bits() | Cause::IP2.bits());
        assert_eq!(Exception::from_cause(noisy), Exception::Syscall);
    }

    #[test]
    fn coprocessor_unit_is_decoded() {
        let cause = Cause::from_bits_retain((2 << 28) | (11 << 2));
        let exc = Exception::from_cause(cause);
        assert_eq!(exc, Exception::CoprocessorUnusable { unit: 2 });
        assert_eq!(exc.to_string(), "CpU (excode 11, cp2)");
    }

    #[test]
    fn late_architecture_codes_are_named() {
        let named = [
            (18, Exception::Coprocessor2, "C2E"),
            (22, Exception::Mdmx, "MDMX"),
            (25, Exception::Thread, "Thread"),
            (26, Exception::DspDisabled, "DSPDis"),
            (30, Exception::CacheError, "CacheErr"),
        ];
        for (code, exc, name) in named {
            assert_eq!(Exception::from_cause(cause_with(code)), exc);
            assert_eq!(exc.name(), name);
        }
        assert_eq!(Exception::CacheError.to_string(), "CacheErr (excode 30)");
    }

    #[test]
    fn unlisted_codes_are_reserved() {
        for code in [14, 16, 17, 19, 20, 21, 27, 28, 29] {
            assert_eq!(Exception::from_cause(cause_with(code)), Exception::Reserved { code: code as u8 });
        }
        assert_eq!(Exception::from_cause(cause_with(31)).to_string(), "reserved (excode 31)");
    }

    #[test]
    fn cpu_line_routing() {
        assert_eq!(CpuIrqLine::from_line(2), CpuIrqLine::Isa);
        assert_eq!(CpuIrqLine::from_line(7), CpuIrqLine::Timer);
        assert_eq!(CpuIrqLine::from_line(5), CpuIrqLine::Unrouted(5));
    }
}
