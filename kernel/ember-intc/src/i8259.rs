//! Cascaded 8259 PIC driver.
//!
//! Two chips: the master serves lines 0-7 and the slave lines 8-15, with the
//! slave's output wired into master line 2. The driver keeps a cached copy of
//! both interrupt mask registers (IMR), where a set bit means the line is
//! disabled.
//!
//! Mask updates are read-modify-write against the hardware register and the
//! cache is refreshed from a read-back afterwards, so it always mirrors the
//! last observed hardware state. Requests that would not change the cached
//! state perform no I/O at all.

use ember_core::id::IrqVector;

use crate::error::IntcError;
use crate::io::IsaBus;

const PIC1_CMD: u16 = 0x20;
const PIC1_DATA: u16 = 0x21;
const PIC2_CMD: u16 = 0xA0;
const PIC2_DATA: u16 = 0xA1;

/// ICW1: initialize, cascade mode, ICW4 follows.
const ICW1_INIT: u8 = 0x11;
/// ICW3 (master): a slave is attached to line 2.
const ICW3_MASTER: u8 = 1 << CASCADE_LINE;
/// ICW3 (slave): cascade identity.
const ICW3_SLAVE: u8 = CASCADE_LINE;
/// ICW4 (master): 8086 mode, buffered master.
const ICW4_MASTER: u8 = 0x05;
/// ICW4 (slave): 8086 mode.
const ICW4_SLAVE: u8 = 0x01;
/// OCW2: non-specific end of interrupt.
const OCW2_EOI: u8 = 0x20;

/// Number of vectors served by the pair.
pub const VECTOR_COUNT: usize = 16;

/// Master line the slave is cascaded through.
pub const CASCADE_LINE: u8 = 2;

/// One of the two chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip {
    /// Lines 0-7, wired to the CPU.
    Master,
    /// Lines 8-15, wired to master line 2.
    Slave,
}

impl Chip {
    /// Command register (ICW1, OCW2).
    pub const fn command_port(self) -> u16 {
        match self {
            Self::Master => PIC1_CMD,
            Self::Slave => PIC2_CMD,
        }
    }

    /// Data register (ICW2-4, IMR).
    pub const fn data_port(self) -> u16 {
        match self {
            Self::Master => PIC1_DATA,
            Self::Slave => PIC2_DATA,
        }
    }

    /// Resolves `vector` to its chip and IMR bit, or `None` if the pair does
    /// not serve it.
    pub const fn line_of(vector: IrqVector) -> Option<(Self, u8)> {
        match vector.as_u8() {
            v @ 0..8 => Some((Self::Master, 1 << v)),
            v @ 8..16 => Some((Self::Slave, 1 << (v - 8))),
            _ => None,
        }
    }
}

/// Snapshot of both interrupt mask registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskState {
    /// Master IMR.
    pub master: u8,
    /// Slave IMR.
    pub slave: u8,
}

impl MaskState {
    /// Every line disabled.
    pub const ALL_MASKED: Self = Self {
        master: 0xFF,
        slave: 0xFF,
    };

    /// Returns `true` if `vector` is served by the pair and enabled.
    pub const fn is_enabled(&self, vector: IrqVector) -> bool {
        match Chip::line_of(vector) {
            Some((chip, bit)) => self.get(chip) & bit == 0,
            None => false,
        }
    }

    const fn get(&self, chip: Chip) -> u8 {
        match chip {
            Chip::Master => self.master,
            Chip::Slave => self.slave,
        }
    }

    fn get_mut(&mut self, chip: Chip) -> &mut u8 {
        match chip {
            Chip::Master => &mut self.master,
            Chip::Slave => &mut self.slave,
        }
    }
}

/// The master/slave pair behind an [`IsaBus`].
///
/// Not synchronized on its own; callers serialize access (the platform
/// controller keeps it behind an `IrqSpinLock`).
pub struct I8259<B> {
    bus: B,
    mask: MaskState,
}

impl<B: IsaBus> I8259<B> {
    /// Wraps `bus`. Does **not** touch the hardware; call [`remap`](Self::remap)
    /// before anything else.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            mask: MaskState::ALL_MASKED,
        }
    }

    /// Runs the ICW1-ICW4 initialization sequence on both chips, programming
    /// `master_base`/`slave_base` as the vector offsets, then masks every line.
    pub fn remap(&mut self, master_base: u8, slave_base: u8) {
        // ICW1: start initialization, ICW4 follows.
        self.bus.write_u8(PIC1_CMD, ICW1_INIT);
        self.bus.write_u8(PIC2_CMD, ICW1_INIT);

        // ICW2: vector offsets.
        self.bus.write_u8(PIC1_DATA, master_base);
        self.bus.write_u8(PIC2_DATA, slave_base);

        // ICW3: cascade wiring.
        self.bus.write_u8(PIC1_DATA, ICW3_MASTER);
        self.bus.write_u8(PIC2_DATA, ICW3_SLAVE);

        // ICW4
        self.bus.write_u8(PIC1_DATA, ICW4_MASTER);
        self.bus.write_u8(PIC2_DATA, ICW4_SLAVE);

        self.bus.write_u8(PIC1_DATA, 0xFF);
        self.bus.write_u8(PIC2_DATA, 0xFF);
        self.mask = MaskState::ALL_MASKED;
    }

    /// Enables or disables `vector`.
    ///
    /// After any slave-line change the cascade line is re-derived: master
    /// line 2 is enabled exactly when at least one slave line is.
    pub fn set_enabled(&mut self, vector: IrqVector, enabled: bool) -> Result<(), IntcError> {
        let (chip, bit) = Chip::line_of(vector).ok_or(IntcError::InvalidVector(vector))?;
        self.set_line(chip, bit, enabled);

        if chip == Chip::Slave {
            let any_slave_enabled = self.mask.slave != 0xFF;
            self.set_line(Chip::Master, 1 << CASCADE_LINE, any_slave_enabled);
        }
        Ok(())
    }

    fn set_line(&mut self, chip: Chip, bit: u8, enabled: bool) {
        let masked = self.mask.get(chip) & bit != 0;
        if masked != enabled {
            return;
        }

        let port = chip.data_port();
        let current = self.bus.read_u8(port);
        let next = if enabled { current & !bit } else { current | bit };
        self.bus.write_u8(port, next);
        *self.mask.get_mut(chip) = self.bus.read_u8(port);
    }

    /// Returns `true` if `vector` is enabled according to the cache.
    pub fn is_enabled(&self, vector: IrqVector) -> bool {
        self.mask.is_enabled(vector)
    }

    /// Acknowledges `vector`.
    ///
    /// Slave vectors are acknowledged on the slave first and then on the
    /// master, which saw them arrive on the cascade line. Vectors the pair
    /// does not serve are ignored.
    pub fn eoi(&mut self, vector: IrqVector) {
        match Chip::line_of(vector) {
            Some((Chip::Master, _)) => self.bus.write_u8(PIC1_CMD, OCW2_EOI),
            Some((Chip::Slave, _)) => {
                self.bus.write_u8(PIC2_CMD, OCW2_EOI);
                self.bus.write_u8(PIC1_CMD, OCW2_EOI);
            }
            None => {}
        }
    }

    /// Disables every line on both chips and returns the hardware masks as
    /// they were before.
    pub fn mask_all(&mut self) -> MaskState {
        let previous = self.read_hw();
        self.bus.write_u8(PIC1_DATA, 0xFF);
        self.bus.write_u8(PIC2_DATA, 0xFF);
        self.mask = self.read_hw();
        previous
    }

    /// Writes back a snapshot taken by [`mask_all`](Self::mask_all).
    pub fn restore(&mut self, saved: MaskState) {
        self.bus.write_u8(PIC1_DATA, saved.master);
        self.bus.write_u8(PIC2_DATA, saved.slave);
        self.mask = self.read_hw();
    }

    /// The cached masks.
    pub fn mask_state(&self) -> MaskState {
        self.mask
    }

    fn read_hw(&mut self) -> MaskState {
        MaskState {
            master: self.bus.read_u8(PIC1_DATA),
            slave: self.bus.read_u8(PIC2_DATA),
        }
    }
}
