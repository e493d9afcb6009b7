//! qemu-mips board wiring: the global controller and the trap entry points
//! called by the assembly vectors.

use ember_core::id::IrqVector;

use crate::config::QEMU_MIPS_ISA_IO_BASE;
use crate::error::IntcError;
use crate::i8259::MaskState;
use crate::intc::Intc;
use crate::io::IsaWindow;
use crate::registry::IrqHandler;
use crate::trap::{self, TrapDispatcher, TrapFrame};

// SAFETY: QEMU_MIPS_ISA_IO_BASE is the uncached KSEG1 window of the board's
// ISA I/O space, which is always mapped, and this is the only handle to it.
static INTC: Intc<IsaWindow> = Intc::new(unsafe { IsaWindow::new(QEMU_MIPS_ISA_IO_BASE) });

static DISPATCHER: TrapDispatcher<'static> = TrapDispatcher::new(&INTC);

/// Initializes the interrupt controller with every line masked.
pub fn platform_init_interrupts() {
    INTC.init();
}

/// Installs `handler` for `vector`. Out-of-range vectors are fatal.
pub fn register_int_handler(vector: IrqVector, handler: &'static dyn IrqHandler) {
    INTC.register_handler(vector, handler);
}

/// Disables `vector` at the controller.
pub fn mask_interrupt(vector: IrqVector) -> Result<(), IntcError> {
    INTC.mask(vector)
}

/// Enables `vector` at the controller.
pub fn unmask_interrupt(vector: IrqVector) -> Result<(), IntcError> {
    INTC.unmask(vector)
}

/// Masks every controller line, returning the previous masks.
pub fn platform_mask_irqs() -> MaskState {
    INTC.mask_all_and_capture()
}

/// Restores masks returned by [`platform_mask_irqs`].
pub fn platform_restore_irqs(saved: MaskState) {
    INTC.restore_all(saved);
}

/// General exception entry.
#[unsafe(no_mangle)]
extern "C" fn mips_gen_exception(frame: &mut TrapFrame) {
    trap::handle_exception(frame);
}

/// Interrupt entry for CPU line `num`.
#[unsafe(no_mangle)]
extern "C" fn mips_irq(frame: &mut TrapFrame, num: u32) {
    let _ = DISPATCHER.irq_entry(frame, num);
}
