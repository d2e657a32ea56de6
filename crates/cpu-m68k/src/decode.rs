//! Top-level dispatch on the instruction word, plus the shared
//! condition-code computation helpers.
//!
//! Dispatch is a match on the high nibble; the group handlers live in
//! `immediates`, `misc`, `arith`, `logic`, `branches` and `shifts`.

use crate::cpu::M68k;
use crate::ea::Size;
use crate::flags::{SR_C, SR_N, SR_V, SR_X, SR_Z};

impl<S> M68k<S> {
    pub(crate) fn execute(&mut self, sys: &mut S, op: u16) {
        match op >> 12 {
            0x0 => self.exec_group0(sys, op),
            0x1 | 0x2 | 0x3 => self.exec_move(sys, op),
            0x4 => self.exec_group4(sys, op),
            0x5 => self.exec_group5(sys, op),
            0x6 => self.exec_branch(sys, op),
            0x7 => self.exec_moveq(sys, op),
            0x8 => self.exec_or_div_sbcd(sys, op),
            0x9 => self.exec_add_sub(sys, op, false),
            0xA => self.exception_1010(sys),
            0xB => self.exec_cmp_eor(sys, op),
            0xC => self.exec_and_mul_abcd(sys, op),
            0xD => self.exec_add_sub(sys, op, true),
            0xE => self.exec_shift_group(sys, op),
            _ => self.exception_1111(sys),
        }
    }

    /// Privilege gate for supervisor-only instructions.
    pub(crate) fn require_supervisor(&mut self, sys: &mut S) -> bool {
        if self.regs.is_supervisor() {
            true
        } else {
            self.exception_privilege_violation(sys);
            false
        }
    }

    // === Condition-code helpers ===

    /// N and Z from a result; V and C cleared (MOVE/logic rule).
    pub(crate) fn flags_logic(&mut self, result: u32, size: Size) {
        let result = result & size.mask();
        let mut sr = self.regs.sr & !(SR_N | SR_Z | SR_V | SR_C);
        if result == 0 {
            sr |= SR_Z;
        }
        if result & size.msb() != 0 {
            sr |= SR_N;
        }
        self.regs.sr = sr;
    }

    /// Full XNZVC for an addition.
    pub(crate) fn flags_add(&mut self, size: Size, src: u32, dst: u32, result: u32) {
        let m = size.mask();
        let (src, dst, result) = (src & m, dst & m, result & m);
        let msb = size.msb();
        let mut sr = self.regs.sr & !(SR_X | SR_N | SR_Z | SR_V | SR_C);
        if result == 0 {
            sr |= SR_Z;
        }
        if result & msb != 0 {
            sr |= SR_N;
        }
        if (src ^ result) & (dst ^ result) & msb != 0 {
            sr |= SR_V;
        }
        if (src & dst | !result & (src | dst)) & msb != 0 {
            sr |= SR_X | SR_C;
        }
        self.regs.sr = sr;
    }

    /// Full XNZVC for a subtraction (`dst - src`).
    pub(crate) fn flags_sub(&mut self, size: Size, src: u32, dst: u32, result: u32) {
        let m = size.mask();
        let (src, dst, result) = (src & m, dst & m, result & m);
        let msb = size.msb();
        let mut sr = self.regs.sr & !(SR_X | SR_N | SR_Z | SR_V | SR_C);
        if result == 0 {
            sr |= SR_Z;
        }
        if result & msb != 0 {
            sr |= SR_N;
        }
        if (src ^ dst) & (result ^ dst) & msb != 0 {
            sr |= SR_V;
        }
        if (src & !dst | result & (src | !dst)) & msb != 0 {
            sr |= SR_X | SR_C;
        }
        self.regs.sr = sr;
    }

    /// NZVC for a compare: as subtraction but X is untouched.
    pub(crate) fn flags_cmp(&mut self, size: Size, src: u32, dst: u32, result: u32) {
        let x = self.regs.sr & SR_X;
        self.flags_sub(size, src, dst, result);
        self.regs.sr = self.regs.sr & !SR_X | x;
    }

    /// Extended add: Z accumulates across the chain (only cleared, never
    /// set).
    pub(crate) fn flags_addx(&mut self, size: Size, src: u32, dst: u32, result: u32) {
        let z = self.regs.sr & SR_Z;
        self.flags_add(size, src, dst, result);
        if result & size.mask() != 0 {
            self.regs.sr &= !SR_Z;
        } else {
            self.regs.sr = self.regs.sr & !SR_Z | z;
        }
    }

    /// Extended subtract: Z accumulates across the chain.
    pub(crate) fn flags_subx(&mut self, size: Size, src: u32, dst: u32, result: u32) {
        let z = self.regs.sr & SR_Z;
        self.flags_sub(size, src, dst, result);
        if result & size.mask() != 0 {
            self.regs.sr &= !SR_Z;
        } else {
            self.regs.sr = self.regs.sr & !SR_Z | z;
        }
    }

    /// Current X flag as 0 or 1.
    pub(crate) fn x_bit(&self) -> u32 {
        u32::from(self.regs.sr & SR_X != 0)
    }
}
