//! Group 0: immediate ALU forms, bit operations, MOVEP, MOVES.
//!
//! Encoding: 0000 sel SZ mode reg. Bit 8 selects the dynamic-bit-number /
//! MOVEP block; otherwise `sel` (bits 11-9) picks ORI/ANDI/SUBI/ADDI,
//! static bit ops, EORI or CMPI. Size field 11 carries the 68020 CAS/CMP2
//! family, which stays undelivered here (illegal-instruction vector).

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::M68k;
use crate::ea::{Operand, Size};
use crate::flags::SR_Z;

impl<S> M68k<S> {
    pub(crate) fn exec_group0(&mut self, sys: &mut S, op: u16) {
        if op & 0x0100 != 0 {
            if op >> 3 & 7 == 1 {
                return self.exec_movep(sys, op);
            }
            let bitnum = self.regs.d[usize::from(op >> 9 & 7)];
            return self.exec_bitop(sys, op, bitnum);
        }
        match op >> 9 & 7 {
            4 => {
                let bitnum = u32::from(self.read_imm_16(sys));
                self.exec_bitop(sys, op, bitnum);
            }
            7 => self.exec_moves(sys, op),
            sel => self.exec_immediate_alu(sys, op, sel as u8),
        }
    }

    fn exec_immediate_alu(&mut self, sys: &mut S, op: u16, sel: u8) {
        let Some(size) = Size::from_bits(op >> 6) else {
            // CAS / CMP2 / CHK2 family: detected, not delivered.
            log::warn!("unimplemented 68020 compare/swap encoding ${op:04x}");
            return self.exception_illegal(sys);
        };
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;

        // ORI/ANDI/EORI to CCR (byte) and to SR (word, privileged)
        if mode == 7 && reg == 4 {
            if !matches!(sel, 0 | 1 | 5) {
                return self.exception_illegal(sys);
            }
            let imm = self.read_imm_16(sys);
            return match size {
                Size::Byte => {
                    let ccr = self.regs.sr & 0x00FF;
                    let new = match sel {
                        0 => ccr | imm,
                        1 => ccr & imm,
                        _ => ccr ^ imm,
                    };
                    self.set_ccr(new);
                }
                Size::Word => {
                    if !self.require_supervisor(sys) {
                        return;
                    }
                    let sr = self.regs.sr;
                    let new = match sel {
                        0 => sr | imm,
                        1 => sr & imm,
                        _ => sr ^ imm,
                    };
                    self.set_sr(new);
                }
                Size::Long => self.exception_illegal(sys),
            };
        }

        let imm = match size {
            Size::Byte => u32::from(self.read_imm_16(sys)) & 0xFF,
            Size::Word => u32::from(self.read_imm_16(sys)),
            Size::Long => self.read_imm_32(sys),
        };
        let Some(dst) = self.resolve(sys, mode, reg, size) else {
            return self.exception_illegal(sys);
        };
        if matches!(dst, Operand::AddrReg(_) | Operand::Imm(_)) {
            return self.exception_illegal(sys);
        }
        let current = self.read_operand(sys, dst, size);
        match sel {
            0 => {
                let result = current | imm;
                self.flags_logic(result, size);
                self.write_operand(sys, dst, size, result);
            }
            1 => {
                let result = current & imm;
                self.flags_logic(result, size);
                self.write_operand(sys, dst, size, result);
            }
            5 => {
                let result = current ^ imm;
                self.flags_logic(result, size);
                self.write_operand(sys, dst, size, result);
            }
            2 => {
                let result = current.wrapping_sub(imm);
                self.flags_sub(size, imm, current, result);
                self.write_operand(sys, dst, size, result);
            }
            3 => {
                let result = current.wrapping_add(imm);
                self.flags_add(size, imm, current, result);
                self.write_operand(sys, dst, size, result);
            }
            _ => {
                let result = current.wrapping_sub(imm);
                self.flags_cmp(size, imm, current, result);
            }
        }
    }

    /// BTST/BCHG/BCLR/BSET with either bit-number source. Data-register
    /// targets test modulo 32; memory targets are byte-wide modulo 8.
    fn exec_bitop(&mut self, sys: &mut S, op: u16, bitnum: u32) {
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let kind = op >> 6 & 3;

        if mode == 0 {
            let bit = 1u32 << (bitnum & 31);
            let r = usize::from(reg);
            let value = self.regs.d[r];
            self.set_z_from(value & bit);
            self.regs.d[r] = match kind {
                0 => value,
                1 => value ^ bit,
                2 => value & !bit,
                _ => value | bit,
            };
            return;
        }

        let Some(dst) = self.resolve(sys, mode, reg, Size::Byte) else {
            return self.exception_illegal(sys);
        };
        if matches!(dst, Operand::AddrReg(_)) || (kind != 0 && matches!(dst, Operand::Imm(_))) {
            return self.exception_illegal(sys);
        }
        let bit = 1u32 << (bitnum & 7);
        let value = self.read_operand(sys, dst, Size::Byte);
        self.set_z_from(value & bit);
        if kind != 0 {
            let result = match kind {
                1 => value ^ bit,
                2 => value & !bit,
                _ => value | bit,
            };
            self.write_operand(sys, dst, Size::Byte, result);
        }
    }

    fn set_z_from(&mut self, tested: u32) {
        if tested == 0 {
            self.regs.sr |= SR_Z;
        } else {
            self.regs.sr &= !SR_Z;
        }
    }

    /// MOVEP: byte lanes on alternating addresses, bridging the 8-bit bus.
    fn exec_movep(&mut self, sys: &mut S, op: u16) {
        let d = usize::from(op >> 9 & 7);
        let a = usize::from(op & 7);
        let disp = self.read_imm_16(sys) as i16 as u32;
        let addr = self.regs.a(a).wrapping_add(disp);
        match op >> 6 & 3 {
            0 => {
                let hi = self.read_8(sys, addr);
                let lo = self.read_8(sys, addr.wrapping_add(2));
                let value = u32::from(hi) << 8 | u32::from(lo);
                self.regs.d[d] = self.regs.d[d] & 0xFFFF_0000 | value;
            }
            1 => {
                let b0 = self.read_8(sys, addr);
                let b1 = self.read_8(sys, addr.wrapping_add(2));
                let b2 = self.read_8(sys, addr.wrapping_add(4));
                let b3 = self.read_8(sys, addr.wrapping_add(6));
                self.regs.d[d] = u32::from(b0) << 24
                    | u32::from(b1) << 16
                    | u32::from(b2) << 8
                    | u32::from(b3);
            }
            2 => {
                let value = self.regs.d[d];
                self.write_8(sys, addr, (value >> 8) as u8);
                self.write_8(sys, addr.wrapping_add(2), value as u8);
            }
            _ => {
                let value = self.regs.d[d];
                self.write_8(sys, addr, (value >> 24) as u8);
                self.write_8(sys, addr.wrapping_add(2), (value >> 16) as u8);
                self.write_8(sys, addr.wrapping_add(4), (value >> 8) as u8);
                self.write_8(sys, addr.wrapping_add(6), value as u8);
            }
        }
    }

    /// MOVES (68010+): privilege-checked and decoded, but the alternate
    /// function-code transfer itself is not wired to the map.
    fn exec_moves(&mut self, sys: &mut S, op: u16) {
        if !self.variant().is_010_or_later() {
            return self.exception_illegal(sys);
        }
        let Some(size) = Size::from_bits(op >> 6) else {
            return self.exception_illegal(sys);
        };
        if !self.require_supervisor(sys) {
            return;
        }
        let ext = self.read_imm_16(sys);
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        // Resolve to keep PC and register side effects consistent.
        if self.resolve(sys, mode, reg, size).is_none() {
            return self.exception_illegal(sys);
        }
        log::warn!(
            "MOVES ${op:04x} ext ${ext:04x} executed as no-op (function-code spaces unmapped)"
        );
    }
}
