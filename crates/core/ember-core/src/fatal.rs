//! Fail-stop path for unrecoverable conditions.
//!
//! Misconfiguration (an out-of-range handler registration, a hart with no
//! logical CPU) and unclassified CPU faults are never returned as values.
//! They end here, in a fixed sequence:
//!
//! 1. interrupts are disabled on the current hart,
//! 2. the report goes to the log sink at [`LogLevel::Fatal`]; the sink call
//!    is synchronous, so the report is handed off before it returns,
//! 3. a full fence orders the report ahead of the halt,
//! 4. the hart parks forever. Host builds panic with the same message
//!    instead, so the path can be exercised by `#[should_panic]` tests.
//!
//! [`LogLevel::Fatal`]: crate::log::LogLevel::Fatal

use core::fmt;

use crate::arch::{barrier, interrupts};

/// Reports `args` and stops forward progress on this hart. Never returns.
///
/// Prefer the [`fatal!`](crate::fatal!) macro.
#[cold]
pub fn halt_and_report(args: fmt::Arguments<'_>) -> ! {
    interrupts::disable();
    crate::kfatal!("{}", args);
    barrier::mb();

    #[cfg(target_os = "none")]
    {
        crate::arch::halt()
    }
    #[cfg(not(target_os = "none"))]
    {
        panic!("{}", args)
    }
}

/// Runs the halt-and-report sequence with a formatted diagnostic.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::fatal::halt_and_report(format_args!($($arg)*))
    };
}
