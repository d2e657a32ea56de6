//! 68k core: context, deadline loop, interrupt servicing, memory interface.

#![allow(clippy::cast_possible_truncation)]

use emu_core::{Bank, MemoryMap, MAP_READ, MAP_WRITE};
use serde::{Deserialize, Serialize};

use crate::cycles::{base_cycles, exception_cycle_table};
use crate::flags::{SR_M, SR_S, SR_T0, SR_T1};
use crate::registers::Registers;
use crate::variant::CpuVariant;

/// Interrupt-acknowledge result asking for the autovector.
pub const INT_ACK_AUTOVECTOR: u32 = 0xFFFF_FFFF;
/// Interrupt-acknowledge result reporting no responding device.
pub const INT_ACK_SPURIOUS: u32 = 0xFFFF_FFFE;

/// No interrupt pending.
const INT_NONE: u8 = 0xFF;

/// STOP instruction reached.
pub(crate) const STOP_LEVEL_STOP: u32 = 1;
/// Double fault; only reset recovers.
pub(crate) const STOP_LEVEL_HALT: u32 = 2;

/// Run-mode state machine: trace is suppressed during the reset sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum RunMode {
    Normal,
    BerrAerrReset,
}

#[derive(Serialize, Deserialize)]
struct SavedState {
    regs: Registers,
    current_cycle: u32,
    stopped: u32,
    run_mode: RunMode,
    instr_mode: bool,
    int_pending: u8,
    int_ack: u8,
    ir: u16,
}

/// 68000-family execution context.
pub struct M68k<S> {
    pub regs: Registers,

    variant: CpuVariant,
    map: MemoryMap<S>,
    read_banks: Vec<Option<Bank>>,
    write_banks: Vec<Option<Bank>>,
    clock_divider: u32,
    address_mask: u32,
    sr_mask: u16,

    /// Per-opcode base cost, pre-multiplied by the clock divider.
    cyc_instruction: Box<[u32]>,
    /// Per-vector exception cost, pre-multiplied by the clock divider.
    cyc_exception: Box<[u32]>,
    // Branch/loop adjustments, pre-multiplied.
    pub(crate) cyc_bcc_notake_b: i32,
    pub(crate) cyc_bcc_notake_w: i32,
    pub(crate) cyc_dbcc_f_noexp: i32,
    pub(crate) cyc_dbcc_f_exp: i32,
    pub(crate) cyc_scc_r_true: u32,
    /// Shift amounts applied to the register count (not divider-scaled).
    pub(crate) cyc_movem_w: u32,
    pub(crate) cyc_movem_l: u32,
    pub(crate) cyc_shift: u32,
    pub(crate) cyc_reset: u32,

    pub current_cycle: u32,
    pub(crate) target_cycle: u32,
    /// Signed timing adjustment from the current instruction (branch
    /// not-taken refunds and the like), folded in with the base charge.
    pending_adjust: i32,
    /// Current instruction word.
    pub(crate) ir: u16,
    pub(crate) stopped: u32,
    pub(crate) run_mode: RunMode,
    /// Inside normal instruction execution (cleared during exception entry
    /// on the 68000, where group-0 faults would push a short frame).
    pub(crate) instr_mode: bool,
    int_pending: u8,
    /// Last acknowledged interrupt level, for the host to consume.
    pub int_ack: u8,

    int_ack_handler: Option<fn(&mut S, u8) -> u32>,
    reset_instr_handler: Option<fn(&mut S)>,
}

impl<S> M68k<S> {
    /// Build a context over a memory map.
    ///
    /// Installs the variant cycle tables multiplied by `clock_divider` and
    /// walks the map to populate the 64 KiB fast-path bank tables over the
    /// low 16 MB.
    #[must_use]
    pub fn new(map: MemoryMap<S>, variant: CpuVariant, clock_divider: u32) -> Self {
        debug_assert!(clock_divider > 0);
        let read_banks = map.build_banks(16, 0x0100_0000, MAP_READ);
        let write_banks = map.build_banks(16, 0x0100_0000, MAP_WRITE);
        let div = clock_divider;
        let mut cyc_instruction = vec![0u32; 0x1_0000].into_boxed_slice();
        for (op, slot) in cyc_instruction.iter_mut().enumerate() {
            *slot = base_cycles(op as u16) * div;
        }
        Self {
            regs: Registers::new(),
            variant,
            map,
            read_banks,
            write_banks,
            clock_divider,
            address_mask: variant.address_mask(),
            sr_mask: variant.sr_mask(),
            cyc_instruction,
            cyc_exception: exception_cycle_table(variant, div),
            cyc_bcc_notake_b: -2 * div as i32,
            cyc_bcc_notake_w: 2 * div as i32,
            cyc_dbcc_f_noexp: -2 * div as i32,
            cyc_dbcc_f_exp: 2 * div as i32,
            cyc_scc_r_true: 2 * div,
            cyc_movem_w: 2,
            cyc_movem_l: 3,
            cyc_shift: 1,
            cyc_reset: 132 * div,
            current_cycle: 0,
            target_cycle: 0,
            pending_adjust: 0,
            ir: 0,
            stopped: 0,
            run_mode: RunMode::Normal,
            instr_mode: true,
            int_pending: INT_NONE,
            int_ack: 0,
            int_ack_handler: None,
            reset_instr_handler: None,
        }
    }

    #[must_use]
    pub fn variant(&self) -> CpuVariant {
        self.variant
    }

    /// The memory map, for host-side buffer access.
    pub fn map(&mut self) -> &mut MemoryMap<S> {
        &mut self.map
    }

    /// Install a vector-acknowledge handler; without one every interrupt is
    /// autovectored.
    pub fn set_int_ack_handler(&mut self, f: fn(&mut S, u8) -> u32) {
        self.int_ack_handler = Some(f);
    }

    /// Invoked when the RESET instruction pulses the external reset line.
    pub fn set_reset_instr_handler(&mut self, f: fn(&mut S)) {
        self.reset_instr_handler = Some(f);
    }

    // === Reset and interrupts ===

    /// Hardware reset: supervisor mode, interrupts masked, SP and PC loaded
    /// from vectors 0 and 1, reset exception cycles charged.
    pub fn reset(&mut self, sys: &mut S) {
        self.stopped = 0;
        self.run_mode = RunMode::BerrAerrReset;
        let sr = self.regs.sr & !(SR_T1 | SR_T0 | SR_M) | SR_S | 0x0700;
        self.regs.sr = sr & self.sr_mask;
        let sp = self.read_32(sys, 0);
        let pc = self.read_32(sys, 4);
        self.regs.ssp = sp;
        self.regs.pc = pc & self.address_mask;
        self.run_mode = RunMode::Normal;
        self.current_cycle += self.cyc_exception[0];
    }

    /// Record a pending interrupt level (1-7; 7 is non-maskable; 0 clears).
    pub fn interrupt(&mut self, level: u8) {
        self.int_pending = match level {
            0 => INT_NONE,
            l => l.min(7),
        };
    }

    fn check_interrupts(&mut self, sys: &mut S) {
        let level = self.int_pending;
        if level == INT_NONE {
            return;
        }
        if level == 7 || level > self.regs.int_mask_level() {
            self.exception_interrupt(sys, level);
        }
    }

    // === Run loop ===

    /// Execute until `current_cycle >= target_cycle` or the CPU is halted
    /// by STOP or a double fault.
    pub fn run(&mut self, sys: &mut S, target_cycle: u32) {
        self.target_cycle = target_cycle;

        self.check_interrupts(sys);

        if self.stopped == 0 {
            while self.current_cycle < target_cycle {
                // Trace is evaluated once per instruction, on the state at
                // its start.
                let trace = self.regs.sr & SR_T1 != 0 && self.run_mode == RunMode::Normal;

                self.regs.ppc = self.regs.pc;
                self.run_mode = RunMode::Normal;

                let ir = self.read_imm_16(sys);
                self.ir = ir;
                self.execute(sys, ir);
                let charge = i64::from(self.cyc_instruction[usize::from(ir)])
                    + i64::from(core::mem::take(&mut self.pending_adjust));
                self.current_cycle = (i64::from(self.current_cycle) + charge.max(0)) as u32;

                if trace {
                    self.exception_trace(sys);
                }
                if self.stopped != 0 {
                    break;
                }
            }
            self.regs.ppc = self.regs.pc;
        }
        if self.stopped != 0 && self.current_cycle < target_cycle {
            self.current_cycle = target_cycle;
        }
    }

    /// Rebase the cycle counter after the host subtracts a window.
    pub fn adjust_cycles(&mut self, deduction: u32) {
        if self.current_cycle < deduction {
            log::warn!(
                "deduction of {deduction} cycles with 68k cycle counter at {}",
                self.current_cycle
            );
            self.current_cycle = 0;
        } else {
            self.current_cycle -= deduction;
        }
        self.target_cycle = self.target_cycle.saturating_sub(deduction);
    }

    // === Interrupt exception entry ===

    pub(crate) fn exception_interrupt(&mut self, sys: &mut S, mut level: u8) {
        if self.variant.is_000() {
            self.instr_mode = false;
        }
        self.stopped &= !STOP_LEVEL_STOP;
        if self.stopped != 0 {
            // Halted by a double fault; only reset recovers.
            return;
        }
        level &= 7;

        // Acknowledge: consume the latch, publish the level.
        self.int_ack = level;
        self.int_pending = INT_NONE;

        let ack = match self.int_ack_handler {
            Some(f) => f(sys, level),
            None => INT_ACK_AUTOVECTOR,
        };
        let vector = match ack {
            INT_ACK_AUTOVECTOR => {
                // Autovectored acknowledge aligns with the E clock.
                let e_clock = self.current_cycle / self.clock_divider;
                self.current_cycle += ((9 - 4) + e_clock % 10) * self.clock_divider;
                24 + u32::from(level)
            }
            INT_ACK_SPURIOUS => 24,
            v if v > 255 => return,
            v => v,
        };

        let sr = self.init_exception();

        // Mask interrupts at and below the serviced level.
        self.regs.sr = self.regs.sr & !0x0700 | u16::from(level) << 8;

        let mut new_pc = self.read_32(sys, vector << 2);
        if new_pc == 0 {
            new_pc = self.read_32(sys, 15 << 2);
        }

        self.stack_frame_0000(sys, self.regs.pc, sr, vector);
        if self.regs.sr & SR_M != 0 && self.variant.is_020_or_later() {
            // Throwaway frame on the interrupt stack.
            self.regs.sr &= !SR_M;
            let sr = sr | SR_S;
            self.stack_frame_0001(sys, self.regs.pc, sr, vector);
        }

        self.jump(new_pc);
        self.current_cycle += self.cyc_exception[vector as usize];
    }

    // === Cycle accounting ===

    /// Charge `cpu_cycles` scaled by the clock divider.
    pub(crate) fn charge(&mut self, cpu_cycles: u32) {
        self.current_cycle += cpu_cycles * self.clock_divider;
    }

    /// Record a pre-multiplied signed adjustment, applied together with the
    /// opcode's base charge.
    pub(crate) fn charge_scaled(&mut self, scaled: i32) {
        self.pending_adjust += scaled;
    }

    pub(crate) fn exception_cost(&self, vector: u32) -> u32 {
        self.cyc_exception[(vector & 0xFF) as usize]
    }

    // === Status register ===

    /// Write the full SR through the variant's legal mask.
    pub(crate) fn set_sr(&mut self, value: u16) {
        self.regs.sr = value & self.sr_mask;
    }

    pub(crate) fn set_ccr(&mut self, value: u16) {
        self.regs.sr = self.regs.sr & 0xFF00 | value & 0x001F;
    }

    // === Control flow ===

    pub(crate) fn jump(&mut self, address: u32) {
        self.regs.pc = address & self.address_mask;
    }

    // === Memory interface ===

    pub(crate) fn read_8(&mut self, sys: &mut S, address: u32) -> u8 {
        let address = address & self.address_mask;
        let base = (address >> 16) as usize;
        if let Some(Some(bank)) = self.read_banks.get(base) {
            return self.map.bank_read_8(*bank, address, 0xFFFF);
        }
        let cycle = self.current_cycle;
        self.map.read_8(sys, address, cycle)
    }

    pub(crate) fn read_16(&mut self, sys: &mut S, address: u32) -> u16 {
        let address = address & self.address_mask;
        let base = (address >> 16) as usize;
        if let Some(Some(bank)) = self.read_banks.get(base) {
            return self.map.bank_read_16(*bank, address, 0xFFFF);
        }
        let cycle = self.current_cycle;
        self.map.read_16(sys, address, cycle)
    }

    pub(crate) fn read_32(&mut self, sys: &mut S, address: u32) -> u32 {
        let hi = self.read_16(sys, address);
        let lo = self.read_16(sys, address.wrapping_add(2));
        u32::from(hi) << 16 | u32::from(lo)
    }

    pub(crate) fn write_8(&mut self, sys: &mut S, address: u32, value: u8) {
        let address = address & self.address_mask;
        let base = (address >> 16) as usize;
        if let Some(Some(bank)) = self.write_banks.get(base) {
            self.map.bank_write_8(*bank, address, 0xFFFF, value);
            return;
        }
        let cycle = self.current_cycle;
        self.map.write_8(sys, address, value, cycle);
    }

    pub(crate) fn write_16(&mut self, sys: &mut S, address: u32, value: u16) {
        let address = address & self.address_mask;
        let base = (address >> 16) as usize;
        if let Some(Some(bank)) = self.write_banks.get(base) {
            self.map.bank_write_16(*bank, address, 0xFFFF, value);
            return;
        }
        let cycle = self.current_cycle;
        self.map.write_16(sys, address, value, cycle);
    }

    pub(crate) fn write_32(&mut self, sys: &mut S, address: u32, value: u32) {
        self.write_16(sys, address, (value >> 16) as u16);
        self.write_16(sys, address.wrapping_add(2), value as u16);
    }

    /// Instruction-stream word fetch.
    pub(crate) fn read_imm_16(&mut self, sys: &mut S) -> u16 {
        let pc = self.regs.pc;
        self.regs.pc = pc.wrapping_add(2);
        self.read_16(sys, pc)
    }

    pub(crate) fn read_imm_32(&mut self, sys: &mut S) -> u32 {
        let hi = self.read_imm_16(sys);
        let lo = self.read_imm_16(sys);
        u32::from(hi) << 16 | u32::from(lo)
    }

    // === Stack ===

    pub(crate) fn push_16(&mut self, sys: &mut S, value: u16) {
        let sp = self.regs.active_sp().wrapping_sub(2);
        self.regs.set_active_sp(sp);
        self.write_16(sys, sp, value);
    }

    pub(crate) fn push_32(&mut self, sys: &mut S, value: u32) {
        let sp = self.regs.active_sp().wrapping_sub(4);
        self.regs.set_active_sp(sp);
        self.write_32(sys, sp, value);
    }

    pub(crate) fn pop_16(&mut self, sys: &mut S) -> u16 {
        let sp = self.regs.active_sp();
        let value = self.read_16(sys, sp);
        self.regs.set_active_sp(sp.wrapping_add(2));
        value
    }

    pub(crate) fn pop_32(&mut self, sys: &mut S) -> u32 {
        let sp = self.regs.active_sp();
        let value = self.read_32(sys, sp);
        self.regs.set_active_sp(sp.wrapping_add(4));
        value
    }

    // === RESET instruction hook ===

    pub(crate) fn reset_peripherals(&mut self, sys: &mut S) {
        if let Some(f) = self.reset_instr_handler {
            f(sys);
        }
    }

    // === State snapshot ===

    /// Append a state snapshot to `buf`.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        let state = SavedState {
            regs: self.regs,
            current_cycle: self.current_cycle,
            stopped: self.stopped,
            run_mode: self.run_mode,
            instr_mode: self.instr_mode,
            int_pending: self.int_pending,
            int_ack: self.int_ack,
            ir: self.ir,
        };
        buf.extend(bincode::serialize(&state).expect("68k state serializes"));
    }

    /// Apply a snapshot produced by [`M68k::serialize`] onto this context.
    pub fn deserialize(&mut self, data: &[u8]) -> Result<(), String> {
        let state: SavedState =
            bincode::deserialize(data).map_err(|e| format!("bad 68k state snapshot: {e}"))?;
        self.regs = state.regs;
        self.current_cycle = state.current_cycle;
        self.stopped = state.stopped;
        self.run_mode = state.run_mode;
        self.instr_mode = state.instr_mode;
        self.int_pending = state.int_pending;
        self.int_ack = state.int_ack;
        self.ir = state.ir;
        Ok(())
    }
}
