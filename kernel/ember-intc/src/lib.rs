//! Interrupt and exception core of the Ember kernel.
//!
//! Turns raw trap events into calls against the kernel's handler table:
//!
//! - [`registry`]: fixed-size vector → handler table.
//! - [`i8259`]: the cascaded master/slave 8259 controller, its mask cache
//!   and acknowledgment protocol.
//! - [`intc`]: the platform controller that combines both behind
//!   interrupt-safe locks and implements delivery.
//! - [`trap`]: MIPS trap classification, the syscall fast path, the
//!   fail-stop path for faults, and routing of CPU interrupt lines.
//!
//! Register access goes through the [`io::IsaBus`] seam, so everything above
//! it runs on the host under `cargo test`.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod i8259;
pub mod intc;
pub mod io;
pub mod registry;
pub mod trap;

#[cfg(target_os = "none")]
pub mod platform;

#[cfg(test)]
pub(crate) mod testing;

pub use error::IntcError;
pub use intc::Intc;
pub use registry::{HandlerEntry, HandlerRegistry, HandlerReturn, IrqHandler};
