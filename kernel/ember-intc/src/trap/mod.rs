//! MIPS trap dispatch.
//!
//! The low-level entry saves a [`TrapFrame`] and hands it here along one of
//! two paths:
//!
//! - **synchronous exceptions**: `syscall` is acknowledged by stepping EPC
//!   past the instruction; every other cause is unrecoverable and takes the
//!   fatal path with the saved Status, Cause and EPC.
//! - **CPU interrupt lines**: the ISA line is forwarded to the platform
//!   controller, the timer line to the registered tick handler, anything
//!   else is ignored.
//!
//! Both paths return a [`HandlerReturn`]; the entry glue passes it to
//! [`finish_irq`], which runs the registered preempt hook on
//! [`HandlerReturn::Reschedule`].

pub mod exception;
pub mod frame;

use core::sync::atomic::{AtomicPtr, Ordering};

use ember_core::id::IrqVector;
use ember_core::{fatal, ktrace};

pub use self::exception::{CpuIrqLine, Exception};
pub use self::frame::{Cause, Status, TrapFrame};
use crate::registry::{HandlerReturn, IrqHandler};

/// Width of the `syscall` instruction.
const SYSCALL_INSN_LEN: u32 = 4;

/// Platform-level delivery for one interrupt-controller family.
pub trait PlatformIrq: Sync {
    /// Services `vector` and acknowledges it at the controller.
    fn platform_irq(&self, frame: &TrapFrame, vector: IrqVector) -> HandlerReturn;
}

/// Which path a trap entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// General exception vector.
    Exception,
    /// CPU interrupt line `line` is pending.
    Irq {
        /// CPU interrupt line number (0-7).
        line: u8,
    },
}

/// Routes traps to the syscall path, the fatal path, or interrupt handlers.
pub struct TrapDispatcher<'a> {
    platform: &'a dyn PlatformIrq,
    timer: Option<&'a dyn IrqHandler>,
}

impl<'a> TrapDispatcher<'a> {
    /// Creates a dispatcher forwarding the ISA line to `platform`, with no
    /// timer handler.
    pub const fn new(platform: &'a dyn PlatformIrq) -> Self {
        Self {
            platform,
            timer: None,
        }
    }

    /// Routes the timer line to `timer`.
    #[must_use]
    pub const fn with_timer(mut self, timer: &'a dyn IrqHandler) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Single entry point for both paths.
    pub fn dispatch(&self, frame: &mut TrapFrame, trap: Trap) -> HandlerReturn {
        match trap {
            Trap::Exception => {
                handle_exception(frame);
                HandlerReturn::NoReschedule
            }
            Trap::Irq { line } => self.irq(frame, line),
        }
    }

    /// Handles a pending CPU interrupt line.
    pub fn irq(&self, frame: &TrapFrame, line: u8) -> HandlerReturn {
        ktrace!("IRQ {}, EPC {:#x}", line, frame.epc);

        match CpuIrqLine::from_line(line) {
            // The controller is wired so that its vectors line up with the
            // CPU line it arrives on.
            CpuIrqLine::Isa => self.platform.platform_irq(frame, IrqVector::new(line)),
            CpuIrqLine::Timer => self
                .timer
                .map_or(HandlerReturn::NoReschedule, |timer| timer.handle()),
            CpuIrqLine::Unrouted(_) => HandlerReturn::NoReschedule,
        }
    }

    /// Interrupt entry for a raw CPU line number as passed by the assembly
    /// vector: dispatches the line, then completes it with [`finish_irq`].
    ///
    /// Numbers that do not fit a line are ignored rather than truncated.
    pub fn irq_entry(&self, frame: &TrapFrame, num: u32) -> HandlerReturn {
        let ret = match u8::try_from(num) {
            Ok(line) => self.irq(frame, line),
            Err(_) => HandlerReturn::NoReschedule,
        };
        finish_irq(ret);
        ret
    }
}

/// Handles a synchronous exception.
///
/// Returns only for `syscall`, with EPC advanced past the instruction.
pub fn handle_exception(frame: &mut TrapFrame) {
    let exc = Exception::from_cause(frame.cause());

    match exc {
        Exception::Syscall => {
            ktrace!("syscall at {:#x}", frame.epc);
            frame.epc = frame.epc.wrapping_add(SYSCALL_INSN_LEN);
        }
        Exception::Interrupt
        | Exception::TlbModified
        | Exception::TlbLoad
        | Exception::TlbStore
        | Exception::AddressErrorLoad
        | Exception::AddressErrorStore
        | Exception::BusErrorFetch
        | Exception::BusErrorData
        | Exception::Breakpoint
        | Exception::ReservedInstruction
        | Exception::CoprocessorUnusable { .. }
        | Exception::Overflow
        | Exception::Trap
        | Exception::FloatingPoint
        | Exception::Coprocessor2
        | Exception::Mdmx
        | Exception::Watch
        | Exception::MachineCheck
        | Exception::Thread
        | Exception::DspDisabled
        | Exception::CacheError
        | Exception::Reserved { .. } => fatal!(
            "unhandled exception {}: status {:#x}, cause {:#x}, epc {:#x}",
            exc,
            frame.status,
            frame.cause,
            frame.epc
        ),
    }
}

// ---------------------------------------------------------------------------
// Preemption hook
// ---------------------------------------------------------------------------

/// Scheduler entry invoked when a handler requests rescheduling.
pub type PreemptFn = fn();

fn nop_preempt() {}

static PREEMPT_FN: AtomicPtr<()> = AtomicPtr::new(nop_preempt as PreemptFn as *mut ());

/// Registers the function that preempts the current thread.
///
/// # Safety
///
/// `f` must be callable from interrupt context with interrupts disabled.
pub unsafe fn set_preempt_fn(f: PreemptFn) {
    PREEMPT_FN.store(f as *mut (), Ordering::Release);
}

/// Completes interrupt handling: preempts the interrupted thread if `ret`
/// asks for it.
pub fn finish_irq(ret: HandlerReturn) {
    if ret.needs_reschedule() {
        let ptr = PREEMPT_FN.load(Ordering::Acquire);
        // SAFETY: Only valid `PreemptFn` pointers are stored in PREEMPT_FN.
        let preempt = unsafe { core::mem::transmute::<*mut (), PreemptFn>(ptr) };
        preempt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use core::fmt;
    use ember_core::log::{LogLevel, set_log_fn};

    use crate::Intc;
    use crate::testing::FakeIsa;

    /// Records every vector it is asked to deliver.
    #[derive(Default)]
    struct RecordingPlatform {
        delivered: Mutex<Vec<u8>>,
        reply: Option<HandlerReturn>,
    }

    impl PlatformIrq for RecordingPlatform {
        fn platform_irq(&self, _frame: &TrapFrame, vector: IrqVector) -> HandlerReturn {
            self.delivered.lock().unwrap().push(vector.as_u8());
            self.reply.unwrap_or(HandlerReturn::NoReschedule)
        }
    }

    fn frame_for(code: u32) -> TrapFrame {
        TrapFrame {
            status: 0x0000_ff03,
            cause: code << 2,
            epc: 0x8000_1000,
            a0: 7,
            ..TrapFrame::default()
        }
    }

    #[test]
    fn syscall_steps_over_instruction() {
        let mut frame = frame_for(8);
        handle_exception(&mut frame);

        assert_eq!(frame.epc, 0x8000_1004);
        assert_eq!(frame.a0, 7);
        assert_eq!(frame.status, 0x0000_ff03);
    }

    #[test]
    #[should_panic(expected = "unhandled exception TLBL")]
    fn tlb_miss_is_fatal() {
        let mut frame = frame_for(2);
        handle_exception(&mut frame);
    }

    #[test]
    #[should_panic(expected = "epc 0x80001000")]
    fn fatal_report_carries_epc() {
        let mut frame = frame_for(10);
        handle_exception(&mut frame);
    }

    #[test]
    #[should_panic(expected = "unhandled exception reserved (excode 21)")]
    fn reserved_code_is_fatal() {
        let mut frame = frame_for(21);
        handle_exception(&mut frame);
    }

    static LOGGED: Mutex<Vec<(LogLevel, String)>> = Mutex::new(Vec::new());

    fn capture(level: LogLevel, args: fmt::Arguments<'_>) {
        LOGGED.lock().unwrap().push((level, args.to_string()));
    }

    #[test]
    fn fatal_exception_report_reaches_log() {
        // SAFETY: `capture` only touches a std mutex.
        unsafe { set_log_fn(capture) };

        let mut frame = TrapFrame {
            status: 0x1000_ff01,
            cause: 2 << 2,
            epc: 0x8000_2468,
            ..TrapFrame::default()
        };
        let result = catch_unwind(AssertUnwindSafe(|| handle_exception(&mut frame)));
        assert!(result.is_err());

        let logged: Vec<_> = LOGGED
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m.contains("epc 0x80002468"))
            .cloned()
            .collect();
        assert_eq!(
            logged,
            [(
                LogLevel::Fatal,
                String::from(
                    "unhandled exception TLBL (excode 2): status 0x1000ff01, cause 0x8, epc 0x80002468"
                )
            )]
        );
    }

    #[test]
    #[should_panic(expected = "unhandled exception CacheErr (excode 30)")]
    fn cache_error_is_fatal() {
        let mut frame = frame_for(30);
        handle_exception(&mut frame);
    }

    #[test]
    fn isa_line_forwards_line_number_as_vector() {
        let platform = RecordingPlatform {
            reply: Some(HandlerReturn::Reschedule),
            ..RecordingPlatform::default()
        };
        let dispatcher = TrapDispatcher::new(&platform);
        let mut frame = TrapFrame::default();

        let ret = dispatcher.dispatch(&mut frame, Trap::Irq { line: 2 });
        assert_eq!(ret, HandlerReturn::Reschedule);
        assert_eq!(*platform.delivered.lock().unwrap(), vec![2]);
    }

    #[test]
    fn timer_line_uses_timer_handler() {
        let platform = RecordingPlatform::default();
        let ticks = AtomicUsize::new(0);
        let tick = || {
            ticks.fetch_add(1, Ordering::Relaxed);
            HandlerReturn::Reschedule
        };
        let dispatcher = TrapDispatcher::new(&platform).with_timer(&tick);

        assert_eq!(dispatcher.irq(&TrapFrame::default(), 7), HandlerReturn::Reschedule);
        assert_eq!(ticks.load(Ordering::Relaxed), 1);
        assert!(platform.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn timer_line_without_handler_is_ignored() {
        let platform = RecordingPlatform::default();
        let dispatcher = TrapDispatcher::new(&platform);
        assert_eq!(dispatcher.irq(&TrapFrame::default(), 7), HandlerReturn::NoReschedule);
    }

    #[test]
    fn unrouted_lines_are_ignored() {
        let platform = RecordingPlatform::default();
        let dispatcher = TrapDispatcher::new(&platform);

        for line in [0, 1, 3, 4, 5, 6] {
            assert_eq!(dispatcher.irq(&TrapFrame::default(), line), HandlerReturn::NoReschedule);
        }
        assert!(platform.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn exception_path_through_dispatch() {
        let platform = RecordingPlatform::default();
        let dispatcher = TrapDispatcher::new(&platform);
        let mut frame = frame_for(8);

        let ret = dispatcher.dispatch(&mut frame, Trap::Exception);
        assert_eq!(ret, HandlerReturn::NoReschedule);
        assert_eq!(frame.epc, 0x8000_1004);
    }

    #[test]
    fn isa_line_reaches_controller_handler_and_acks() {
        let fake = FakeIsa::new();
        let intc: &'static Intc<FakeIsa> = Box::leak(Box::new(Intc::new(fake.clone())));
        intc.init();
        intc.register_handler(IrqVector::new(2), Box::leak(Box::new(|| HandlerReturn::Reschedule)));
        intc.unmask(IrqVector::new(2)).unwrap();
        fake.clear_trace();

        let dispatcher = TrapDispatcher::new(intc);
        let ret = dispatcher.irq(&TrapFrame::default(), 2);

        assert_eq!(ret, HandlerReturn::Reschedule);
        assert_eq!(fake.writes(), vec![(0x20, 0x20)]);
    }

    // The preempt hook is global; this is the only test that installs it.
    #[test]
    fn reschedule_hint_runs_preempt_hook() {
        static PREEMPTS: AtomicUsize = AtomicUsize::new(0);

        fn preempt() {
            PREEMPTS.fetch_add(1, Ordering::Relaxed);
        }

        // SAFETY: `preempt` only bumps a counter.
        unsafe { set_preempt_fn(preempt) };

        finish_irq(HandlerReturn::NoReschedule);
        assert_eq!(PREEMPTS.load(Ordering::Relaxed), 0);
        finish_irq(HandlerReturn::Reschedule);
        assert_eq!(PREEMPTS.load(Ordering::Relaxed), 1);

        let platform = RecordingPlatform {
            reply: Some(HandlerReturn::Reschedule),
            ..RecordingPlatform::default()
        };
        let dispatcher = TrapDispatcher::new(&platform);
        let frame = TrapFrame::default();

        assert_eq!(dispatcher.irq_entry(&frame, 2), HandlerReturn::Reschedule);
        assert_eq!(PREEMPTS.load(Ordering::Relaxed), 2);

        // 258 would truncate to the ISA line.
        assert_eq!(dispatcher.irq_entry(&frame, 258), HandlerReturn::NoReschedule);
        assert_eq!(PREEMPTS.load(Ordering::Relaxed), 2);
        assert_eq!(*platform.delivered.lock().unwrap(), vec![2]);
    }
}
