//! Leveled kernel log.
//!
//! Messages go to one sink function installed with [`set_log_fn`]. The sink
//! is called synchronously for every message; this module neither buffers
//! nor filters. Until a sink is installed, messages are dropped.
//!
//! Use [`klog!`] with an explicit [`LogLevel`], or one of the per-level
//! shorthands: [`kfatal!`], [`kerr!`], [`kwarn!`], [`kinfo!`], [`kdebug!`],
//! [`ktrace!`].

use core::fmt;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Message severity. Compares so that more severe levels are smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// The system is about to halt.
    Fatal = 0,
    /// An operation failed; the kernel keeps running.
    Error = 1,
    /// Something looks wrong but was tolerated.
    Warn = 2,
    /// Bring-up and configuration milestones.
    Info = 3,
    /// State useful when debugging a subsystem.
    Debug = 4,
    /// Per-trap and per-delivery detail.
    Trace = 5,
}

impl LogLevel {
    /// Five-character tag, padded so log columns line up.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().trim_end())
    }
}

/// Sink signature: receives every message with its level.
pub type LogFn = fn(LogLevel, fmt::Arguments<'_>);

fn discard(_: LogLevel, _: fmt::Arguments<'_>) {}

static SINK: AtomicPtr<()> = AtomicPtr::new(discard as LogFn as *mut ());

/// Installs `f` as the log sink, replacing the previous one.
///
/// # Safety
///
/// `f` is called from trap context with interrupts disabled, including on the
/// fatal path. It must not block, must not log recursively, and must have
/// finished with the message when it returns.
pub unsafe fn set_log_fn(f: LogFn) {
    SINK.store(f as *mut (), Ordering::Release);
}

#[inline]
fn sink() -> LogFn {
    let raw = SINK.load(Ordering::Acquire);
    // SAFETY: SINK is only ever written with `LogFn` pointers.
    unsafe { core::mem::transmute::<*mut (), LogFn>(raw) }
}

/// Entry point used by the logging macros.
#[doc(hidden)]
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    sink()(level, args);
}

/// Logs a formatted message at `level`.
#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::emit($level, format_args!($($arg)*))
    };
}

/// [`klog!`] at [`LogLevel::Fatal`](crate::log::LogLevel::Fatal).
#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Fatal, $($arg)*) };
}

/// [`klog!`] at [`LogLevel::Error`](crate::log::LogLevel::Error).
#[macro_export]
macro_rules! kerr {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Error, $($arg)*) };
}

/// [`klog!`] at [`LogLevel::Warn`](crate::log::LogLevel::Warn).
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// [`klog!`] at [`LogLevel::Info`](crate::log::LogLevel::Info).
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Info, $($arg)*) };
}

/// [`klog!`] at [`LogLevel::Debug`](crate::log::LogLevel::Debug).
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Debug, $($arg)*) };
}

/// [`klog!`] at [`LogLevel::Trace`](crate::log::LogLevel::Trace).
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Trace, $($arg)*) };
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Fatal < LogLevel::Error);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn level_names_are_fixed_width() {
        for level in [
            LogLevel::Fatal,
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert_eq!(level.name().len(), 5);
        }
        assert_eq!(std::format!("{}", LogLevel::Warn), "WARN");
    }

    #[test]
    fn macros_reach_registered_sink() {
        test_sink::install();
        crate::kwarn!("vector {} spurious", 9);
        crate::ktrace!("epc {:#x}", 0x8000_0010u32);

        assert_eq!(
            test_sink::matching("vector 9 spurious"),
            [(LogLevel::Warn, String::from("vector 9 spurious"))]
        );
        assert_eq!(
            test_sink::matching("epc 0x80000010"),
            [(LogLevel::Trace, String::from("epc 0x80000010"))]
        );
    }
}
