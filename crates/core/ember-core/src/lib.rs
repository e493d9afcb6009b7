//! Leaf primitives for the Ember interrupt core.
//!
//! Everything the interrupt layer consumes from below lives here: relaxed
//! atomics and fences, local interrupt-enable control, hart and CPU identity,
//! the interrupt-safe spin lock, the pass-through log sink, and the fatal
//! halt-and-report path.
//!
//! Architecture-specific instructions are selected at compile time. On host
//! targets every primitive has a plain-Rust fallback, so the crate can be
//! tested with `cargo test` without a kernel target.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod arch;
pub mod cpu;
pub mod fatal;
pub mod id;
pub mod log;
pub mod sync;
