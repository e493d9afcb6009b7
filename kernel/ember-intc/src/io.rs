//! Byte-wide ISA register access.
//!
//! The 8259 pair is addressed through 8-bit I/O registers. On qemu-mips those
//! sit in a memory-mapped ISA window ([`IsaWindow`]); on x86 they are real
//! I/O ports ([`PortIo`]). The driver only sees [`IsaBus`].

/// Access to 8-bit ISA I/O registers.
pub trait IsaBus {
    /// Reads the register at `port`.
    fn read_u8(&mut self, port: u16) -> u8;
    /// Writes `value` to the register at `port`.
    fn write_u8(&mut self, port: u16, value: u8);
}

/// ISA I/O space mapped into memory at a fixed base address.
#[derive(Debug)]
pub struct IsaWindow {
    base: usize,
}

impl IsaWindow {
    /// Creates a handle for the window at `base`. Does **not** perform any I/O.
    ///
    /// # Safety
    ///
    /// `base` must be the uncached virtual address of the platform's ISA I/O
    /// window, mapped for the lifetime of the handle, and nothing else may
    /// drive the registers behind it.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn register(&self, port: u16) -> *mut u8 {
        core::ptr::with_exposed_provenance_mut(self.base + usize::from(port))
    }
}

impl IsaBus for IsaWindow {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        // SAFETY: `new` guarantees the window is mapped device memory.
        unsafe { core::ptr::read_volatile(self.register(port)) }
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        // SAFETY: `new` guarantees the window is mapped device memory.
        unsafe { core::ptr::write_volatile(self.register(port), value) }
    }
}

/// x86 port-mapped I/O.
#[cfg(all(target_os = "none", target_arch = "x86_64"))]
#[derive(Debug)]
pub struct PortIo {
    _private: (),
}

#[cfg(all(target_os = "none", target_arch = "x86_64"))]
impl PortIo {
    /// Creates a port I/O handle.
    ///
    /// # Safety
    ///
    /// The caller must own the legacy 8259 ports (`0x20`, `0x21`, `0xA0`,
    /// `0xA1`) for the lifetime of the handle.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(all(target_os = "none", target_arch = "x86_64"))]
impl IsaBus for PortIo {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        let val: u8;
        // SAFETY: `new` guarantees exclusive ownership of the ports; `in al, dx`
        // reads a single byte.
        unsafe {
            core::arch::asm!(
                "in al, dx",
                in("dx") port,
                out("al") val,
                options(nomem, nostack, preserves_flags),
            );
        }
        val
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        // SAFETY: `new` guarantees exclusive ownership of the ports; `out dx, al`
        // writes a single byte.
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") value,
                options(nomem, nostack, preserves_flags),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_addresses_registers_by_offset() {
        let mut regs = [0u8; 0x100];
        let base = regs.as_mut_ptr().expose_provenance();
        // SAFETY: `regs` stands in for the device window and outlives `bus`.
        let mut bus = unsafe { IsaWindow::new(base) };

        bus.write_u8(0x21, 0xFB);
        assert_eq!(bus.read_u8(0x21), 0xFB);
        assert_eq!(regs[0x21], 0xFB);
        assert_eq!(regs[0x20], 0);
    }
}
