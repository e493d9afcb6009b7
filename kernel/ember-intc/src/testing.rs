//! Host-side model of the 8259 pair for unit tests.
//!
//! [`FakeIsa`] implements [`IsaBus`] and behaves like the two chips as far as
//! the driver can observe: ICW1 starts an initialization sequence that
//! swallows the following data writes as ICW2-4, other data writes land in
//! the IMR, and command writes of `0x20` count as EOIs. Every access is
//! recorded in order. Clones share state, so a test keeps one handle while
//! the driver owns another.

use std::sync::{Arc, Mutex};

use crate::i8259::{Chip, MaskState};
use crate::io::IsaBus;

/// One recorded register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// A read and the value it returned.
    Read { port: u16, value: u8 },
    /// A write and the value written.
    Write { port: u16, value: u8 },
}

#[derive(Default)]
struct FakeChip {
    imr: u8,
    icws: Vec<u8>,
    icw_pending: u8,
    eois: usize,
}

impl FakeChip {
    fn command(&mut self, value: u8) {
        if value & 0x10 != 0 {
            // ICW1 resets the IMR; ICW2 and ICW3 always follow, ICW4 if IC4.
            self.imr = 0;
            self.icws = vec![value];
            self.icw_pending = if value & 0x01 != 0 { 3 } else { 2 };
        } else if value == 0x20 {
            self.eois += 1;
        }
    }

    fn data(&mut self, value: u8) {
        if self.icw_pending > 0 {
            self.icws.push(value);
            self.icw_pending -= 1;
        } else {
            self.imr = value;
        }
    }
}

#[derive(Default)]
struct State {
    master: FakeChip,
    slave: FakeChip,
    trace: Vec<IoOp>,
}

impl State {
    fn chip(&mut self, chip: Chip) -> &mut FakeChip {
        match chip {
            Chip::Master => &mut self.master,
            Chip::Slave => &mut self.slave,
        }
    }
}

/// Shared fake ISA bus with both 8259 chips behind it.
#[derive(Clone, Default)]
pub struct FakeIsa {
    state: Arc<Mutex<State>>,
}

impl FakeIsa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every access since creation or the last [`clear_trace`](Self::clear_trace).
    pub fn trace(&self) -> Vec<IoOp> {
        self.state.lock().unwrap().trace.clone()
    }

    /// Only the writes from [`trace`](Self::trace), as `(port, value)`.
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.trace()
            .into_iter()
            .filter_map(|op| match op {
                IoOp::Write { port, value } => Some((port, value)),
                IoOp::Read { .. } => None,
            })
            .collect()
    }

    pub fn clear_trace(&self) {
        self.state.lock().unwrap().trace.clear();
    }

    /// Current hardware IMRs.
    pub fn imr(&self) -> MaskState {
        let state = self.state.lock().unwrap();
        MaskState {
            master: state.master.imr,
            slave: state.slave.imr,
        }
    }

    /// Overwrites the IMRs without recording an access.
    pub fn set_imr(&self, mask: MaskState) {
        let mut state = self.state.lock().unwrap();
        state.master.imr = mask.master;
        state.slave.imr = mask.slave;
    }

    /// ICW1-ICW4 as last received by `chip`.
    pub fn icws(&self, chip: Chip) -> Vec<u8> {
        self.state.lock().unwrap().chip(chip).icws.clone()
    }

    pub fn eoi_count(&self, chip: Chip) -> usize {
        self.state.lock().unwrap().chip(chip).eois
    }
}

impl IsaBus for FakeIsa {
    fn read_u8(&mut self, port: u16) -> u8 {
        let mut state = self.state.lock().unwrap();
        let value = match port {
            0x21 => state.master.imr,
            0xA1 => state.slave.imr,
            _ => 0,
        };
        state.trace.push(IoOp::Read { port, value });
        value
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        let mut state = self.state.lock().unwrap();
        state.trace.push(IoOp::Write { port, value });
        match port {
            0x20 => state.master.command(value),
            0x21 => state.master.data(value),
            0xA0 => state.slave.command(value),
            0xA1 => state.slave.data(value),
            _ => {}
        }
    }
}
