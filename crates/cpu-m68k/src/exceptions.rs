//! Exception entry, stack frames and RTE.
//!
//! Frame formats: the 68000 pushes a three-word frame (SR, PC); the 68010
//! and later append a format/vector word; interrupt entry on a 68020-class
//! part with M set additionally pushes a throwaway format-1 frame. Bus and
//! address errors are counted and logged but never delivered.

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::{M68k, RunMode, STOP_LEVEL_HALT};
use crate::flags::{SR_S, SR_T0, SR_T1};

// Stable vector numbers.
pub(crate) const EX_ILLEGAL: u32 = 4;
pub(crate) const EX_ZERO_DIVIDE: u32 = 5;
pub(crate) const EX_CHK: u32 = 6;
pub(crate) const EX_TRAPV: u32 = 7;
pub(crate) const EX_PRIVILEGE: u32 = 8;
pub(crate) const EX_TRACE: u32 = 9;
pub(crate) const EX_LINE_1010: u32 = 10;
pub(crate) const EX_LINE_1111: u32 = 11;
pub(crate) const EX_FORMAT_ERROR: u32 = 14;
pub(crate) const EX_TRAP_BASE: u32 = 32;

impl<S> M68k<S> {
    /// Common exception prologue: save SR, enter supervisor mode with trace
    /// disabled. Returns the SR value to stack.
    pub(crate) fn init_exception(&mut self) -> u16 {
        let sr = self.regs.sr;
        self.regs.sr = sr & !(SR_T1 | SR_T0) | SR_S;
        if self.variant().is_000() {
            self.instr_mode = false;
        }
        sr
    }

    /// Format 0 frame. The 68000 omits the format/vector word.
    pub(crate) fn stack_frame_0000(&mut self, sys: &mut S, pc: u32, sr: u16, vector: u32) {
        if !self.variant().is_000() {
            self.push_16(sys, (vector << 2) as u16 & 0x0FFF);
        }
        self.push_32(sys, pc);
        self.push_16(sys, sr);
    }

    /// Format 1 throwaway frame (68020+ interrupt entry with M set).
    pub(crate) fn stack_frame_0001(&mut self, sys: &mut S, pc: u32, sr: u16, vector: u32) {
        self.push_16(sys, 0x1000 | (vector << 2) as u16 & 0x0FFF);
        self.push_32(sys, pc);
        self.push_16(sys, sr);
    }

    /// Format 2 frame (instruction-address variants on 020+).
    pub(crate) fn stack_frame_0010(&mut self, sys: &mut S, pc: u32, sr: u16, vector: u32) {
        self.push_32(sys, self.regs.ppc);
        self.push_16(sys, 0x2000 | (vector << 2) as u16 & 0x0FFF);
        self.push_32(sys, pc);
        self.push_16(sys, sr);
    }

    fn enter(&mut self, sys: &mut S, vector: u32, frame_pc: u32) {
        let sr = self.init_exception();
        self.stack_frame_0000(sys, frame_pc, sr, vector);
        let new_pc = self.read_32(sys, vector << 2);
        self.jump(new_pc);
        self.current_cycle += self.exception_cost(vector);
    }

    /// Group 2 exceptions (TRAP, TRAPV, CHK, zero divide): the stacked PC
    /// points past the instruction.
    pub(crate) fn exception_trap(&mut self, sys: &mut S, vector: u32) {
        let pc = self.regs.pc;
        self.enter(sys, vector, pc);
    }

    /// Illegal instruction: the stacked PC points at the opcode.
    pub(crate) fn exception_illegal(&mut self, sys: &mut S) {
        let pc = self.regs.ppc;
        self.enter(sys, EX_ILLEGAL, pc);
    }

    pub(crate) fn exception_privilege_violation(&mut self, sys: &mut S) {
        let pc = self.regs.ppc;
        self.enter(sys, EX_PRIVILEGE, pc);
    }

    pub(crate) fn exception_1010(&mut self, sys: &mut S) {
        log::warn!(
            "line-A instruction ${:04x} at ${:06x}",
            self.ir,
            self.regs.ppc
        );
        let pc = self.regs.ppc;
        self.enter(sys, EX_LINE_1010, pc);
    }

    pub(crate) fn exception_1111(&mut self, sys: &mut S) {
        log::warn!(
            "line-F instruction ${:04x} at ${:06x}",
            self.ir,
            self.regs.ppc
        );
        let pc = self.regs.ppc;
        self.enter(sys, EX_LINE_1111, pc);
    }

    pub(crate) fn exception_trace(&mut self, sys: &mut S) {
        if self.variant().is_000() {
            self.instr_mode = false;
        }
        let pc = self.regs.pc;
        self.enter(sys, EX_TRACE, pc);
    }

    pub(crate) fn exception_format_error(&mut self, sys: &mut S) {
        let pc = self.regs.pc;
        self.enter(sys, EX_FORMAT_ERROR, pc);
    }

    /// Double fault: the processor halts until reset. Unreachable until
    /// bus/address errors are delivered.
    #[allow(dead_code)]
    pub(crate) fn double_fault(&mut self) {
        log::warn!("68k halted by double fault at ${:06x}", self.regs.ppc);
        self.stopped |= STOP_LEVEL_HALT;
    }

    /// RTE. The 68000 pops SR and PC; later parts decode the format word,
    /// unwinding throwaway frames and rejecting unknown formats.
    pub(crate) fn rte(&mut self, sys: &mut S) {
        if !self.regs.is_supervisor() {
            return self.exception_privilege_violation(sys);
        }
        self.run_mode = RunMode::Normal;

        if self.variant().is_000() {
            let sr = self.pop_16(sys);
            let pc = self.pop_32(sys);
            self.set_sr(sr);
            self.jump(pc);
            return;
        }

        loop {
            let sr = self.pop_16(sys);
            let pc = self.pop_32(sys);
            let format = self.pop_16(sys);
            match format >> 12 {
                0 => {
                    self.set_sr(sr);
                    self.jump(pc);
                    return;
                }
                1 => {
                    // Throwaway frame: apply SR (stack switch) and keep
                    // unwinding on the new active stack.
                    self.set_sr(sr);
                }
                2 => {
                    // Instruction-address frame carries one extra long.
                    let _ = self.pop_32(sys);
                    self.set_sr(sr);
                    self.jump(pc);
                    return;
                }
                _ => {
                    // Restore and report a format error on the offender.
                    let sp = self.regs.active_sp().wrapping_sub(8);
                    self.regs.set_active_sp(sp);
                    return self.exception_format_error(sys);
                }
            }
        }
    }
}
