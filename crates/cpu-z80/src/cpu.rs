//! Z80 core: context, deadline loop, interrupts, bus-request gating.
//!
//! The host drives the core with [`Z80::run`]. One call converts the host
//! cycle budget to T-states, executes whole instructions until the budget is
//! spent, then folds the remainder back into `current_cycle`. Instructions
//! always complete; overshoot is repaid on the next call.

#![allow(clippy::cast_possible_truncation)]

mod execute;

use emu_core::{Bank, BusWidth, MemoryMap, CYCLE_NEVER, MAP_READ, MAP_WRITE};
use serde::{Deserialize, Serialize};

use crate::registers::Registers;
use crate::tables::{self, CycleTables, FlagTables, DEFAULT_CYCLES};

/// One interrupt-request window in host cycles: IRQ is sampled at
/// instruction boundaries inside `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct IntPulse {
    pub start: u32,
    pub end: u32,
}

impl IntPulse {
    /// A window that never opens.
    pub const NEVER: Self = Self {
        start: CYCLE_NEVER,
        end: CYCLE_NEVER,
    };
}

/// Snapshot of everything `run` needs to resume deterministically.
#[derive(Serialize, Deserialize)]
struct SavedState {
    regs: Registers,
    current_cycle: u32,
    int_pulse_start: u32,
    int_pulse_end: u32,
    nmi_start: u32,
    busreq: bool,
    busack: bool,
    reset: bool,
    after_ei: bool,
    after_ldair: bool,
    irq_databus: u32,
}

/// Zilog Z80 execution context.
pub struct Z80<S> {
    pub regs: Registers,

    map: MemoryMap<S>,
    iomap: MemoryMap<S>,
    read_banks: Vec<Option<Bank>>,
    write_banks: Vec<Option<Bank>>,
    clock_divider: u32,

    cc: CycleTables,
    ft: &'static FlagTables,

    /// T-states remaining in the current `run` slice. May go negative by the
    /// cost of the instruction in flight.
    icount: i32,
    /// Deadline of the current `run` slice.
    target_cycle: u32,
    /// Host-cycle position, valid between `run` slices.
    pub current_cycle: u32,

    int_pulse_start: u32,
    int_pulse_end: u32,
    nmi_start: u32,
    next_int_pulse: Option<fn(&mut S) -> IntPulse>,

    busreq: bool,
    busack: bool,
    reset: bool,

    /// EI shadow: the instruction after EI runs before IRQ sampling.
    after_ei: bool,
    /// LD A,I / LD A,R executed last (NMOS parity quirk latch).
    after_ldair: bool,
    /// Byte(s) the interrupting device drives onto the bus during
    /// acknowledge. Low byte doubles as the IM2 vector.
    irq_databus: u32,
    /// Scratch effective address for (IX/IY+d) sequences.
    ea: u16,
}

impl<S> Z80<S> {
    /// Build a context over a memory map and an I/O map.
    ///
    /// Reset registers take their documented power-on values (IX=IY=0xFFFF,
    /// F has Z set). The fast bank tables are built here by walking the map.
    #[must_use]
    pub fn new(map: MemoryMap<S>, iomap: MemoryMap<S>, clock_divider: u32) -> Self {
        debug_assert!(clock_divider > 0);
        let read_banks = map.build_banks(13, 0x1_0000, MAP_READ);
        let write_banks = map.build_banks(13, 0x1_0000, MAP_WRITE);
        let mut regs = Registers::default();
        regs.ix = 0xFFFF;
        regs.iy = 0xFFFF;
        regs.af = u16::from(crate::flags::ZF);
        Self {
            regs,
            map,
            iomap,
            read_banks,
            write_banks,
            clock_divider,
            cc: DEFAULT_CYCLES,
            ft: tables::flag_tables(),
            icount: 0,
            target_cycle: 0,
            current_cycle: 0,
            int_pulse_start: CYCLE_NEVER,
            int_pulse_end: CYCLE_NEVER,
            nmi_start: CYCLE_NEVER,
            next_int_pulse: None,
            busreq: false,
            busack: false,
            reset: false,
            after_ei: false,
            after_ldair: false,
            irq_databus: 0,
            ea: 0,
        }
    }

    /// An empty I/O map (every port reads 0, writes drop).
    #[must_use]
    pub fn open_io() -> MemoryMap<S> {
        MemoryMap::new(BusWidth::Eight, 0xFF)
    }

    /// Install the host callback that supplies interrupt pulse windows.
    pub fn set_next_int_pulse(&mut self, f: fn(&mut S) -> IntPulse) {
        self.next_int_pulse = Some(f);
    }

    /// Drive the interrupt-acknowledge databus (IM0 inline opcode or IM2
    /// vector in the low byte).
    pub fn set_irq_databus(&mut self, value: u32) {
        self.irq_databus = value;
    }

    /// Swap any subset of the six cycle tables; `None` restores the default.
    pub fn set_cycle_tables(
        &mut self,
        op: Option<&'static [u8; 256]>,
        cb: Option<&'static [u8; 256]>,
        ed: Option<&'static [u8; 256]>,
        xy: Option<&'static [u8; 256]>,
        xycb: Option<&'static [u8; 256]>,
        ex: Option<&'static [u8; 256]>,
    ) {
        self.cc = CycleTables {
            op: op.unwrap_or(DEFAULT_CYCLES.op),
            cb: cb.unwrap_or(DEFAULT_CYCLES.cb),
            ed: ed.unwrap_or(DEFAULT_CYCLES.ed),
            xy: xy.unwrap_or(DEFAULT_CYCLES.xy),
            xycb: xycb.unwrap_or(DEFAULT_CYCLES.xycb),
            ex: ex.unwrap_or(DEFAULT_CYCLES.ex),
        };
    }

    /// The memory map, for host-side buffer access.
    pub fn map(&mut self) -> &mut MemoryMap<S> {
        &mut self.map
    }

    // === Run loop ===

    /// Execute until `current_cycle >= target_cycle`.
    ///
    /// While the bus is granted away or reset is held, time passes without
    /// execution.
    pub fn run(&mut self, sys: &mut S, target_cycle: u32) {
        if self.busack || self.reset {
            self.current_cycle = target_cycle;
            return;
        }
        if self.current_cycle >= target_cycle {
            return;
        }
        if self.next_int_pulse.is_some()
            && (self.int_pulse_end < self.current_cycle || self.int_pulse_end == CYCLE_NEVER)
        {
            self.refresh_int_pulse(sys);
        }

        let div = self.clock_divider;
        self.target_cycle = target_cycle;
        self.icount = ((target_cycle - self.current_cycle + div - 1) / div) as i32;
        let mut int_icount = self.int_threshold(target_cycle);

        loop {
            if self.nmi_start != CYCLE_NEVER {
                self.take_nmi(sys);
            } else if self.icount <= int_icount && self.regs.iff1 && !self.after_ei {
                self.take_interrupt(sys);
                self.current_cycle = self.cycle_at_icount(target_cycle);
                self.refresh_int_pulse(sys);
                int_icount = self.int_threshold(target_cycle);
            }

            self.after_ei = false;
            self.after_ldair = false;

            self.regs.prvpc = self.regs.pc;
            self.regs.r = self.regs.r.wrapping_add(1);
            let op = self.rop(sys);
            self.exec_op(sys, op);

            if self.busreq {
                self.busack = true;
                self.icount = 0;
            }
            if self.icount <= 0 {
                break;
            }
        }
        self.current_cycle = self.cycle_at_icount(target_cycle);
    }

    fn cycle_at_icount(&self, target: u32) -> u32 {
        (i64::from(target) - i64::from(self.icount) * i64::from(self.clock_divider)) as u32
    }

    /// Host-cycle position mid-slice, for callbacks.
    fn cycle(&self) -> u32 {
        if self.icount > 0 {
            self.cycle_at_icount(self.target_cycle)
        } else {
            self.target_cycle
        }
    }

    fn refresh_int_pulse(&mut self, sys: &mut S) {
        if let Some(f) = self.next_int_pulse {
            let pulse = f(sys);
            self.int_pulse_start = pulse.start;
            self.int_pulse_end = pulse.end;
        }
    }

    /// The icount threshold below which the IRQ window is open.
    fn int_threshold(&self, target: u32) -> i32 {
        if self.int_pulse_start >= target {
            return i32::MIN;
        }
        if self.int_pulse_start < self.current_cycle {
            self.icount
        } else {
            let div = self.clock_divider;
            ((self.int_pulse_start - self.current_cycle + div - 1) / div) as i32
        }
    }

    // === Interrupt delivery ===

    fn take_interrupt(&mut self, sys: &mut S) {
        // Defensive sentinel: interrupt entry has no meaningful previous PC.
        self.regs.prvpc = 0xFFFF;
        self.leave_halt();

        self.regs.iff1 = false;
        self.regs.iff2 = false;

        match self.regs.im {
            2 => {
                // CALL [(I << 8) | databyte]. All eight vector bits are used;
                // the "must be even" note in the datasheet does not hold.
                let table = u16::from(self.regs.i) << 8 | (self.irq_databus & 0xFF) as u16;
                self.push16(sys, self.regs.pc);
                self.regs.pc = self.rm16(sys, table);
                self.icount -= i32::from(self.cc.op[0xCD]) + i32::from(self.cc.ex[0xFF]);
            }
            1 => {
                self.push16(sys, self.regs.pc);
                self.regs.pc = 0x0038;
                self.icount -= i32::from(self.cc.op[0xFF]) + i32::from(self.cc.ex[0xFF]);
            }
            _ => {
                // IM 0: the device drives an opcode. CALL and JP are
                // recognised; any other byte is treated as an RST.
                let vector = self.irq_databus;
                if vector != 0 {
                    match vector & 0x00FF_0000 {
                        0x00CD_0000 => {
                            self.push16(sys, self.regs.pc);
                            self.regs.pc = vector as u16;
                            self.icount -= i32::from(self.cc.op[0xCD]);
                        }
                        0x00C3_0000 => {
                            self.regs.pc = vector as u16;
                            self.icount -= i32::from(self.cc.op[0xC3]);
                        }
                        _ => {
                            self.push16(sys, self.regs.pc);
                            self.regs.pc = (vector & 0x38) as u16;
                            self.icount -= i32::from(self.cc.op[0xFF]);
                        }
                    }
                }
                self.icount -= i32::from(self.cc.ex[0xFF]);
            }
        }
        self.regs.wz = self.regs.pc;

        #[cfg(feature = "ldair-quirk")]
        if self.after_ldair {
            let f = self.regs.f() & !crate::flags::PF;
            self.regs.set_f(f);
        }
    }

    fn take_nmi(&mut self, sys: &mut S) {
        self.regs.prvpc = 0xFFFF;
        self.leave_halt();

        #[cfg(feature = "ldair-quirk")]
        if self.after_ldair {
            let f = self.regs.f() & !crate::flags::PF;
            self.regs.set_f(f);
        }

        self.regs.iff1 = false;
        self.push16(sys, self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.wz = self.regs.pc;
        self.icount -= 11;
        self.nmi_start = CYCLE_NEVER;
    }

    // === External control lines ===

    /// Latch an NMI request at `cycle`; taken at the next instruction
    /// boundary while reset is not held.
    pub fn assert_nmi(&mut self, cycle: u32) {
        self.nmi_start = cycle;
    }

    /// Pull the reset line low: catch up to `cycle`, then freeze.
    pub fn assert_reset(&mut self, sys: &mut S, cycle: u32) {
        self.run(sys, cycle);
        self.reset = true;
    }

    /// Release reset and apply the edge: PC, I, R clear and interrupts
    /// disable.
    pub fn clear_reset(&mut self, sys: &mut S, cycle: u32) {
        if !self.reset {
            return;
        }
        self.run(sys, cycle);
        self.regs.pc = 0x0000;
        self.regs.i = 0;
        self.regs.r = 0;
        self.regs.r2 = 0;
        self.after_ei = false;
        self.after_ldair = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.reset = false;
        self.regs.wz = self.regs.pc;
    }

    /// Request the bus. The core acknowledges at the end of the instruction
    /// in flight and then freezes until the request clears.
    pub fn assert_busreq(&mut self, _cycle: u32) {
        self.busreq = true;
    }

    /// Release the bus request.
    pub fn clear_busreq(&mut self, _cycle: u32) {
        self.busreq = false;
        self.busack = false;
    }

    /// Catch up to `cycle` and report the bus-acknowledge line.
    pub fn busack(&mut self, sys: &mut S, cycle: u32) -> bool {
        self.run(sys, cycle);
        self.busack
    }

    /// Rebase all latched cycle timestamps after the host subtracts a window
    /// from its clock.
    pub fn adjust_cycles(&mut self, deduction: u32) {
        if self.current_cycle < deduction {
            log::warn!(
                "deduction of {deduction} cycles with Z80 cycle counter at {}",
                self.current_cycle
            );
            self.current_cycle = 0;
        } else {
            self.current_cycle -= deduction;
        }
        if self.int_pulse_end != CYCLE_NEVER {
            if self.int_pulse_end < deduction {
                // Window entirely in the past: invalidate it.
                self.int_pulse_start = CYCLE_NEVER;
                self.int_pulse_end = CYCLE_NEVER;
            } else {
                self.int_pulse_end -= deduction;
                self.int_pulse_start = self.int_pulse_start.saturating_sub(deduction);
            }
        }
        if self.nmi_start != CYCLE_NEVER {
            self.nmi_start = self.nmi_start.saturating_sub(deduction);
        }
    }

    // === State snapshot ===

    /// Append a state snapshot to `buf`.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        let state = SavedState {
            regs: self.regs,
            current_cycle: self.current_cycle,
            int_pulse_start: self.int_pulse_start,
            int_pulse_end: self.int_pulse_end,
            nmi_start: self.nmi_start,
            busreq: self.busreq,
            busack: self.busack,
            reset: self.reset,
            after_ei: self.after_ei,
            after_ldair: self.after_ldair,
            irq_databus: self.irq_databus,
        };
        buf.extend(bincode::serialize(&state).expect("Z80 state serializes"));
    }

    /// Apply a snapshot produced by [`Z80::serialize`] onto this context.
    pub fn deserialize(&mut self, data: &[u8]) -> Result<(), String> {
        let state: SavedState =
            bincode::deserialize(data).map_err(|e| format!("bad Z80 state snapshot: {e}"))?;
        self.regs = state.regs;
        self.current_cycle = state.current_cycle;
        self.int_pulse_start = state.int_pulse_start;
        self.int_pulse_end = state.int_pulse_end;
        self.nmi_start = state.nmi_start;
        self.busreq = state.busreq;
        self.busack = state.busack;
        self.reset = state.reset;
        self.after_ei = state.after_ei;
        self.after_ldair = state.after_ldair;
        self.irq_databus = state.irq_databus;
        Ok(())
    }

    // === Memory interface ===

    pub(crate) fn rm(&mut self, sys: &mut S, addr: u16) -> u8 {
        if let Some(bank) = self.read_banks[usize::from(addr >> 13)] {
            return self.map.bank_read_8(bank, u32::from(addr), 0x1FFF);
        }
        let cycle = self.cycle();
        self.map.read_8(sys, u32::from(addr), cycle)
    }

    pub(crate) fn wm(&mut self, sys: &mut S, addr: u16, value: u8) {
        if let Some(bank) = self.write_banks[usize::from(addr >> 13)] {
            self.map.bank_write_8(bank, u32::from(addr), 0x1FFF, value);
            return;
        }
        let cycle = self.cycle();
        self.map.write_8(sys, u32::from(addr), value, cycle);
    }

    pub(crate) fn rm16(&mut self, sys: &mut S, addr: u16) -> u16 {
        let lo = self.rm(sys, addr);
        let hi = self.rm(sys, addr.wrapping_add(1));
        u16::from(hi) << 8 | u16::from(lo)
    }

    pub(crate) fn wm16(&mut self, sys: &mut S, addr: u16, value: u16) {
        self.wm(sys, addr, value as u8);
        self.wm(sys, addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Opcode fetch: read at PC and advance.
    pub(crate) fn rop(&mut self, sys: &mut S) -> u8 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(1);
        self.rm(sys, pc)
    }

    /// Operand fetch (same path as opcode fetch, no refresh increment).
    pub(crate) fn arg(&mut self, sys: &mut S) -> u8 {
        self.rop(sys)
    }

    pub(crate) fn arg16(&mut self, sys: &mut S) -> u16 {
        let lo = self.arg(sys);
        let hi = self.arg(sys);
        u16::from(hi) << 8 | u16::from(lo)
    }

    pub(crate) fn io_in(&mut self, sys: &mut S, port: u16) -> u8 {
        let cycle = self.cycle();
        self.iomap.read_8(sys, u32::from(port), cycle)
    }

    pub(crate) fn io_out(&mut self, sys: &mut S, port: u16, value: u8) {
        let cycle = self.cycle();
        self.iomap.write_8(sys, u32::from(port), value, cycle);
    }

    // === Stack and halt helpers ===

    pub(crate) fn push16(&mut self, sys: &mut S, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        self.wm16(sys, self.regs.sp, value);
    }

    pub(crate) fn pop16(&mut self, sys: &mut S) -> u16 {
        let value = self.rm16(sys, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// HALT backs PC up one so the fetch loop re-executes it until an
    /// interrupt arrives.
    pub(crate) fn enter_halt(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        self.regs.halt = true;
    }

    pub(crate) fn leave_halt(&mut self) {
        if self.regs.halt {
            self.regs.halt = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    // === Cycle accounting used by execute ===

    pub(crate) fn ft(&self) -> &'static FlagTables {
        self.ft
    }

    pub(crate) fn cc_ex(&mut self, op: u8) {
        self.icount -= i32::from(self.cc.ex[usize::from(op)]);
    }

    /// T-states remaining in the current slice (test hook).
    #[must_use]
    pub fn icount(&self) -> i32 {
        self.icount
    }

    /// Set internal flags used by EI and LD A,I/R shadows.
    pub(crate) fn set_after_ei(&mut self) {
        self.after_ei = true;
    }

    pub(crate) fn set_after_ldair(&mut self) {
        self.after_ldair = true;
    }
}
