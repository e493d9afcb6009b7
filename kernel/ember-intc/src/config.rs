//! Build-time platform configuration for the qemu-mips board.

/// Vector number programmed for master line 0 (ICW2).
///
/// MIPS delivers all external interrupts through CPU interrupt lines rather
/// than an exception vector table, so the controller keeps its identity
/// numbering and a vector equals its controller line.
pub const PIC1_BASE: u8 = 0;

/// Vector number programmed for slave line 0 (ICW2).
pub const PIC2_BASE: u8 = 8;

/// Base of the ISA I/O window (KSEG1 alias of physical `0x1400_0000`).
pub const QEMU_MIPS_ISA_IO_BASE: usize = 0xb400_0000;

/// CPU interrupt line the 8259 output is wired to.
pub const ISA_CPU_LINE: u8 = 2;

/// CPU interrupt line of the CP0 count/compare timer.
pub const TIMER_CPU_LINE: u8 = 7;
