//! Arithmetic groups: ADD/SUB/ADDA/SUBA/ADDX/SUBX (0x9/0xD),
//! CMP/CMPA/CMPM/EOR (0xB), and ADDQ/SUBQ/Scc/DBcc/TRAPcc (0x5).

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::M68k;
use crate::ea::{Operand, Size};
use crate::exceptions::EX_TRAPV;
use crate::flags::condition;

impl<S> M68k<S> {
    // === ADD / SUB family ===
    //
    // Encoding: 1x01 RRR OOO MMMRRR. Opmode selects direction and size;
    // opmodes 3 and 7 are the address-register forms, and the register-pair
    // sub-encodings of opmodes 4-6 carry ADDX/SUBX.

    pub(crate) fn exec_add_sub(&mut self, sys: &mut S, op: u16, is_add: bool) {
        let reg = usize::from(op >> 9 & 7);
        let opmode = op >> 6 & 7;
        let mode = (op >> 3 & 7) as u8;
        let ea_reg = (op & 7) as u8;

        match opmode {
            0 | 1 | 2 => {
                let size = Size::from_bits(opmode).expect("sized opmode");
                if size == Size::Byte && mode == 1 {
                    return self.exception_illegal(sys);
                }
                let Some(src) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                let src_val = self.read_operand(sys, src, size);
                let dst_val = self.regs.d[reg] & size.mask();
                let result = if is_add {
                    dst_val.wrapping_add(src_val)
                } else {
                    dst_val.wrapping_sub(src_val)
                };
                if is_add {
                    self.flags_add(size, src_val, dst_val, result);
                } else {
                    self.flags_sub(size, src_val, dst_val, result);
                }
                self.regs.d[reg] = self.regs.d[reg] & !size.mask() | result & size.mask();
            }
            3 | 7 => {
                // ADDA/SUBA: the whole address register, no flags.
                let size = if opmode == 7 { Size::Long } else { Size::Word };
                let Some(src) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                let src_val = size.sign_extend(self.read_operand(sys, src, size));
                let current = self.regs.a(reg);
                let result = if is_add {
                    current.wrapping_add(src_val)
                } else {
                    current.wrapping_sub(src_val)
                };
                self.regs.set_a(reg, result);
            }
            _ => {
                if mode <= 1 {
                    return self.exec_addx_subx(sys, op, is_add);
                }
                let size = Size::from_bits(opmode).expect("sized opmode");
                let Some(dst) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                if matches!(dst, Operand::Imm(_)) {
                    return self.exception_illegal(sys);
                }
                let dst_val = self.read_operand(sys, dst, size);
                let src_val = self.regs.d[reg] & size.mask();
                let result = if is_add {
                    dst_val.wrapping_add(src_val)
                } else {
                    dst_val.wrapping_sub(src_val)
                };
                if is_add {
                    self.flags_add(size, src_val, dst_val, result);
                } else {
                    self.flags_sub(size, src_val, dst_val, result);
                }
                self.write_operand(sys, dst, size, result);
            }
        }
    }

    /// ADDX/SUBX: register pairs or descending memory chains.
    fn exec_addx_subx(&mut self, sys: &mut S, op: u16, is_add: bool) {
        let Some(size) = Size::from_bits(op >> 6) else {
            return self.exception_illegal(sys);
        };
        let rx = usize::from(op >> 9 & 7);
        let ry = usize::from(op & 7);
        let x = self.x_bit();

        if op & 0x0008 == 0 {
            let src = self.regs.d[ry] & size.mask();
            let dst = self.regs.d[rx] & size.mask();
            let result = if is_add {
                dst.wrapping_add(src).wrapping_add(x)
            } else {
                dst.wrapping_sub(src).wrapping_sub(x)
            };
            if is_add {
                self.flags_addx(size, src, dst, result);
            } else {
                self.flags_subx(size, src, dst, result);
            }
            self.regs.d[rx] = self.regs.d[rx] & !size.mask() | result & size.mask();
        } else {
            // -(Ay) source first, then -(Ax) destination.
            let Some(src_op) = self.resolve(sys, 4, ry as u8, size) else {
                return self.exception_illegal(sys);
            };
            let src = self.read_operand(sys, src_op, size);
            let Some(dst_op) = self.resolve(sys, 4, rx as u8, size) else {
                return self.exception_illegal(sys);
            };
            let dst = self.read_operand(sys, dst_op, size);
            let result = if is_add {
                dst.wrapping_add(src).wrapping_add(x)
            } else {
                dst.wrapping_sub(src).wrapping_sub(x)
            };
            if is_add {
                self.flags_addx(size, src, dst, result);
            } else {
                self.flags_subx(size, src, dst, result);
            }
            self.write_operand(sys, dst_op, size, result);
        }
    }

    // === CMP / CMPA / CMPM / EOR ===

    pub(crate) fn exec_cmp_eor(&mut self, sys: &mut S, op: u16) {
        let reg = usize::from(op >> 9 & 7);
        let opmode = op >> 6 & 7;
        let mode = (op >> 3 & 7) as u8;
        let ea_reg = (op & 7) as u8;

        match opmode {
            0 | 1 | 2 => {
                let size = Size::from_bits(opmode).expect("sized opmode");
                if size == Size::Byte && mode == 1 {
                    return self.exception_illegal(sys);
                }
                let Some(src) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                let src_val = self.read_operand(sys, src, size);
                let dst_val = self.regs.d[reg] & size.mask();
                let result = dst_val.wrapping_sub(src_val);
                self.flags_cmp(size, src_val, dst_val, result);
            }
            3 | 7 => {
                let size = if opmode == 7 { Size::Long } else { Size::Word };
                let Some(src) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                let src_val = size.sign_extend(self.read_operand(sys, src, size));
                let dst_val = self.regs.a(reg);
                let result = dst_val.wrapping_sub(src_val);
                self.flags_cmp(Size::Long, src_val, dst_val, result);
            }
            _ => {
                let size = Size::from_bits(opmode).expect("sized opmode");
                if mode == 1 {
                    // CMPM (Ay)+,(Ax)+
                    let Some(src_op) = self.resolve(sys, 3, ea_reg, size) else {
                        return self.exception_illegal(sys);
                    };
                    let src = self.read_operand(sys, src_op, size);
                    let Some(dst_op) = self.resolve(sys, 3, reg as u8, size) else {
                        return self.exception_illegal(sys);
                    };
                    let dst = self.read_operand(sys, dst_op, size);
                    let result = dst.wrapping_sub(src);
                    return self.flags_cmp(size, src, dst, result);
                }
                // EOR Dn,<ea>
                let Some(dst) = self.resolve(sys, mode, ea_reg, size) else {
                    return self.exception_illegal(sys);
                };
                if matches!(dst, Operand::Imm(_)) {
                    return self.exception_illegal(sys);
                }
                let dst_val = self.read_operand(sys, dst, size);
                let result = dst_val ^ self.regs.d[reg] & size.mask();
                self.flags_logic(result, size);
                self.write_operand(sys, dst, size, result);
            }
        }
    }

    // === ADDQ / SUBQ / Scc / DBcc / TRAPcc ===

    pub(crate) fn exec_group5(&mut self, sys: &mut S, op: u16) {
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;

        if op >> 6 & 3 == 3 {
            let cc = (op >> 8 & 0x0F) as u8;
            if mode == 1 {
                return self.exec_dbcc(sys, op, cc);
            }
            if mode == 7 && reg >= 2 {
                // TRAPcc (68020+)
                if !self.variant().is_020_or_later() {
                    return self.exception_illegal(sys);
                }
                match reg {
                    2 => {
                        let _ = self.read_imm_16(sys);
                    }
                    3 => {
                        let _ = self.read_imm_32(sys);
                    }
                    4 => {}
                    _ => return self.exception_illegal(sys),
                }
                if condition(self.regs.sr, cc) {
                    self.exception_trap(sys, EX_TRAPV);
                }
                return;
            }
            // Scc
            let Some(dst) = self.resolve(sys, mode, reg, Size::Byte) else {
                return self.exception_illegal(sys);
            };
            if matches!(dst, Operand::AddrReg(_) | Operand::Imm(_)) {
                return self.exception_illegal(sys);
            }
            let truth = condition(self.regs.sr, cc);
            let value = if truth { 0xFF } else { 0x00 };
            if truth && matches!(dst, Operand::DataReg(_)) {
                let cost = self.cyc_scc_r_true;
                self.current_cycle += cost;
            }
            return self.write_operand(sys, dst, Size::Byte, value);
        }

        // ADDQ/SUBQ: quick data 1-8
        let Some(size) = Size::from_bits(op >> 6) else {
            return self.exception_illegal(sys);
        };
        let quick = match op >> 9 & 7 {
            0 => 8,
            n => u32::from(n),
        };
        let is_add = op & 0x0100 == 0;
        if mode == 1 {
            // Whole address register, no flags, any size but byte.
            if size == Size::Byte {
                return self.exception_illegal(sys);
            }
            let current = self.regs.a(usize::from(reg));
            let result = if is_add {
                current.wrapping_add(quick)
            } else {
                current.wrapping_sub(quick)
            };
            return self.regs.set_a(usize::from(reg), result);
        }
        let Some(dst) = self.resolve(sys, mode, reg, size) else {
            return self.exception_illegal(sys);
        };
        if matches!(dst, Operand::Imm(_)) {
            return self.exception_illegal(sys);
        }
        let current = self.read_operand(sys, dst, size);
        let result = if is_add {
            current.wrapping_add(quick)
        } else {
            current.wrapping_sub(quick)
        };
        if is_add {
            self.flags_add(size, quick, current, result);
        } else {
            self.flags_sub(size, quick, current, result);
        }
        self.write_operand(sys, dst, size, result);
    }

    /// DBcc: decrement-and-branch with the condition as an exit test.
    fn exec_dbcc(&mut self, sys: &mut S, op: u16, cc: u8) {
        let reg = usize::from(op & 7);
        let base = self.regs.pc;
        let disp = self.read_imm_16(sys) as i16 as u32;
        if condition(self.regs.sr, cc) {
            return;
        }
        let count = (self.regs.d[reg] as u16).wrapping_sub(1);
        self.regs.d[reg] = self.regs.d[reg] & 0xFFFF_0000 | u32::from(count);
        if count != 0xFFFF {
            self.jump(base.wrapping_add(disp));
            let adj = self.cyc_dbcc_f_noexp;
            self.charge_scaled(adj);
        } else {
            let adj = self.cyc_dbcc_f_exp;
            self.charge_scaled(adj);
        }
    }
}
