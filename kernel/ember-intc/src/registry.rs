//! Vector → handler table.
//!
//! One slot per interrupt vector, each holding an optional `'static` handler.
//! Registration may happen at any time, including concurrently with delivery;
//! the slot array lives behind an [`IrqSpinLock`] and delivery copies the
//! entry out before invoking it, so a handler may itself register, mask, or
//! look up handlers without deadlocking.

use ember_core::fatal;
use ember_core::id::IrqVector;
use ember_core::sync::IrqSpinLock;

/// What the interrupted context should do after a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum HandlerReturn {
    /// Resume the interrupted thread.
    NoReschedule,
    /// Run the scheduler before returning from the trap.
    Reschedule,
}

impl HandlerReturn {
    /// Returns `true` for [`HandlerReturn::Reschedule`].
    pub const fn needs_reschedule(self) -> bool {
        matches!(self, Self::Reschedule)
    }
}

/// An interrupt handler.
///
/// Runs in interrupt context: it must not block and must not assume
/// interrupts are enabled.
pub trait IrqHandler: Sync {
    /// Services the interrupt.
    fn handle(&self) -> HandlerReturn;
}

impl<F> IrqHandler for F
where
    F: Fn() -> HandlerReturn + Sync,
{
    fn handle(&self) -> HandlerReturn {
        self()
    }
}

/// A plain function paired with the argument it is invoked with.
///
/// This is the registration form for drivers that keep their state in a
/// static and want it passed back on every delivery.
pub struct HandlerEntry<A: Sync> {
    handler: fn(&A) -> HandlerReturn,
    arg: A,
}

impl<A: Sync> HandlerEntry<A> {
    /// Pairs `handler` with `arg`.
    pub const fn new(handler: fn(&A) -> HandlerReturn, arg: A) -> Self {
        Self { handler, arg }
    }

    /// The argument passed to the handler.
    pub const fn arg(&self) -> &A {
        &self.arg
    }
}

impl<A: Sync> IrqHandler for HandlerEntry<A> {
    fn handle(&self) -> HandlerReturn {
        (self.handler)(&self.arg)
    }
}

/// Fixed-capacity table of `N` handler slots.
pub struct HandlerRegistry<const N: usize> {
    slots: IrqSpinLock<[Option<&'static dyn IrqHandler>; N]>,
}

impl<const N: usize> HandlerRegistry<N> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: IrqSpinLock::new([None; N]),
        }
    }

    /// Number of vectors the registry covers.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Installs `handler` for `vector`, replacing any previous handler.
    ///
    /// An out-of-range vector is a kernel bug and takes the fatal path.
    pub fn register(&self, vector: IrqVector, handler: &'static dyn IrqHandler) {
        if vector.as_usize() >= N {
            fatal!("register_int_handler: vector out of range {vector}");
        }
        self.slots.lock()[vector.as_usize()] = Some(handler);
    }

    /// Returns the handler currently installed for `vector`, if any.
    pub fn lookup(&self, vector: IrqVector) -> Option<&'static dyn IrqHandler> {
        self.slots.lock().get(vector.as_usize()).copied().flatten()
    }

    /// Invokes the handler for `vector` and returns its hint.
    ///
    /// Empty slots and out-of-range vectors are spurious and yield
    /// [`HandlerReturn::NoReschedule`].
    pub fn dispatch(&self, vector: IrqVector) -> HandlerReturn {
        match self.lookup(vector) {
            Some(handler) => handler.handle(),
            None => HandlerReturn::NoReschedule,
        }
    }
}

impl<const N: usize> Default for HandlerRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
