//! Platform interrupt controller: handler table plus the 8259 pair.
//!
//! [`Intc`] owns the vector registry and the controller driver, each behind
//! its own [`IrqSpinLock`]. Delivery looks up the handler, runs it with no
//! lock held, then acknowledges the vector, so a handler may mask, unmask or
//! register vectors without deadlocking.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use ember_core::arch::atomic::RelaxedAtomic;
use ember_core::id::IrqVector;
use ember_core::sync::IrqSpinLock;
use ember_core::{kdebug, kinfo, ktrace};

use crate::config::{PIC1_BASE, PIC2_BASE};
use crate::error::IntcError;
use crate::i8259::{I8259, MaskState, VECTOR_COUNT};
use crate::io::IsaBus;
use crate::registry::{HandlerRegistry, HandlerReturn, IrqHandler};
use crate::trap::{PlatformIrq, TrapFrame};

/// Per-vector delivery counters.
pub struct IrqStats {
    total: AtomicUsize,
    per_vector: [AtomicU32; VECTOR_COUNT],
}

impl IrqStats {
    const fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            per_vector: [const { AtomicU32::new(0) }; VECTOR_COUNT],
        }
    }

    fn record(&self, vector: IrqVector) {
        self.total.add(1);
        if let Some(count) = self.per_vector.get(vector.as_usize()) {
            count.add(1);
        }
    }

    /// Deliveries across all vectors, spurious ones included.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Deliveries of `vector`.
    pub fn count(&self, vector: IrqVector) -> u32 {
        self.per_vector
            .get(vector.as_usize())
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }
}

/// The cascaded-8259 interrupt controller of an ISA platform.
pub struct Intc<B> {
    handlers: HandlerRegistry<VECTOR_COUNT>,
    pic: IrqSpinLock<I8259<B>>,
    stats: IrqStats,
}

impl<B: IsaBus> Intc<B> {
    /// Creates a controller on `bus`. Does **not** touch the hardware; call
    /// [`init`](Self::init) first.
    pub const fn new(bus: B) -> Self {
        Self {
            handlers: HandlerRegistry::new(),
            pic: IrqSpinLock::new(I8259::new(bus)),
            stats: IrqStats::new(),
        }
    }

    /// Programs both chips with the platform vector bases and leaves every
    /// line masked.
    pub fn init(&self) {
        self.pic.lock().remap(PIC1_BASE, PIC2_BASE);
        kinfo!("i8259: master base {}, slave base {}, all lines masked", PIC1_BASE, PIC2_BASE);
    }

    /// Installs `handler` for `vector`. Out-of-range vectors are fatal.
    pub fn register_handler(&self, vector: IrqVector, handler: &'static dyn IrqHandler) {
        self.handlers.register(vector, handler);
        kdebug!("i8259: handler registered for vector {}", vector);
    }

    /// Disables `vector` at the controller.
    pub fn mask(&self, vector: IrqVector) -> Result<(), IntcError> {
        self.pic.lock().set_enabled(vector, false)
    }

    /// Enables `vector` at the controller.
    pub fn unmask(&self, vector: IrqVector) -> Result<(), IntcError> {
        self.pic.lock().set_enabled(vector, true)
    }

    /// Returns `Ok(true)` if `vector` is currently enabled.
    pub fn is_unmasked(&self, vector: IrqVector) -> Result<bool, IntcError> {
        if vector.as_usize() >= VECTOR_COUNT {
            return Err(IntcError::InvalidVector(vector));
        }
        Ok(self.pic.lock().is_enabled(vector))
    }

    /// Masks every line and returns the prior masks for
    /// [`restore_all`](Self::restore_all).
    pub fn mask_all_and_capture(&self) -> MaskState {
        self.pic.lock().mask_all()
    }

    /// Writes back masks captured by [`mask_all_and_capture`](Self::mask_all_and_capture).
    pub fn restore_all(&self, saved: MaskState) {
        self.pic.lock().restore(saved);
    }

    /// The cached controller masks.
    pub fn mask_state(&self) -> MaskState {
        self.pic.lock().mask_state()
    }

    /// Runs the handler for `vector`, then acknowledges it.
    pub fn deliver(&self, vector: IrqVector) -> HandlerReturn {
        self.stats.record(vector);
        ktrace!("i8259: deliver vector {}", vector);

        let ret = self.handlers.dispatch(vector);
        self.pic.lock().eoi(vector);
        ret
    }

    /// Delivery counters.
    pub fn stats(&self) -> &IrqStats {
        &self.stats
    }
}

impl<B: IsaBus + Send> PlatformIrq for Intc<B> {
    fn platform_irq(&self, _frame: &TrapFrame, vector: IrqVector) -> HandlerReturn {
        self.deliver(vector)
    }
}
