//! MOVE/MOVEA and the group-4 miscellany: single-operand ALU forms, SR/CCR
//! moves, MOVEM, control flow (JMP/JSR/RTS/RTE/RTR/RTD), LINK/UNLK, TRAP,
//! STOP/RESET, CHK, LEA/PEA, TAS, MOVEC and the 68020 long mul/div.

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::{M68k, STOP_LEVEL_STOP};
use crate::ea::{Operand, Size};
use crate::exceptions::{EX_CHK, EX_TRAPV, EX_TRAP_BASE, EX_ZERO_DIVIDE};
use crate::flags::{SR_C, SR_N, SR_V, SR_X, SR_Z};

impl<S> M68k<S> {
    // === MOVE / MOVEA ===

    pub(crate) fn exec_move(&mut self, sys: &mut S, op: u16) {
        let size = match op >> 12 {
            1 => Size::Byte,
            3 => Size::Word,
            _ => Size::Long,
        };
        let src_mode = (op >> 3 & 7) as u8;
        let src_reg = (op & 7) as u8;
        let dst_mode = (op >> 6 & 7) as u8;
        let dst_reg = (op >> 9 & 7) as u8;

        if size == Size::Byte && src_mode == 1 {
            return self.exception_illegal(sys);
        }
        let Some(src) = self.resolve(sys, src_mode, src_reg, size) else {
            return self.exception_illegal(sys);
        };
        let value = self.read_operand(sys, src, size);

        if dst_mode == 1 {
            // MOVEA: sign-extends, no flags.
            if size == Size::Byte {
                return self.exception_illegal(sys);
            }
            self.regs.set_a(usize::from(dst_reg), size.sign_extend(value));
            return;
        }
        if dst_mode == 7 && dst_reg > 1 {
            return self.exception_illegal(sys);
        }
        let Some(dst) = self.resolve(sys, dst_mode, dst_reg, size) else {
            return self.exception_illegal(sys);
        };
        self.flags_logic(value, size);
        self.write_operand(sys, dst, size, value);
    }

    // === Group 4 ===

    #[allow(clippy::too_many_lines)]
    pub(crate) fn exec_group4(&mut self, sys: &mut S, op: u16) {
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;

        match op {
            0x4AFC => return self.exception_illegal(sys),
            0x4E70 => {
                // RESET: pulse the external reset line.
                if !self.require_supervisor(sys) {
                    return;
                }
                self.reset_peripherals(sys);
                let cost = self.cyc_reset;
                self.current_cycle += cost;
                return;
            }
            0x4E71 => return, // NOP
            0x4E72 => {
                // STOP #imm: load SR and wait for an interrupt.
                if !self.require_supervisor(sys) {
                    return;
                }
                let imm = self.read_imm_16(sys);
                self.set_sr(imm);
                self.stopped |= STOP_LEVEL_STOP;
                return;
            }
            0x4E73 => return self.rte(sys),
            0x4E74 => {
                // RTD #disp (68010+)
                if !self.variant().is_010_or_later() {
                    return self.exception_illegal(sys);
                }
                let disp = self.read_imm_16(sys) as i16 as u32;
                let pc = self.pop_32(sys);
                let sp = self.regs.active_sp().wrapping_add(disp);
                self.regs.set_active_sp(sp);
                self.jump(pc);
                return;
            }
            0x4E75 => {
                let pc = self.pop_32(sys);
                self.jump(pc);
                return;
            }
            0x4E76 => {
                if self.regs.sr & SR_V != 0 {
                    self.exception_trap(sys, EX_TRAPV);
                }
                return;
            }
            0x4E77 => {
                // RTR: CCR then PC off the stack.
                let ccr = self.pop_16(sys);
                let pc = self.pop_32(sys);
                self.set_ccr(ccr);
                self.jump(pc);
                return;
            }
            0x4E7A | 0x4E7B => return self.exec_movec(sys, op),
            _ => {}
        }

        if op & 0x0FF0 == 0x0E40 {
            // TRAP #n
            let vector = EX_TRAP_BASE + u32::from(op & 0x0F);
            return self.exception_trap(sys, vector);
        }
        match op & 0x0FF8 {
            0x0E50 => {
                // LINK.W An,#disp
                let disp = self.read_imm_16(sys) as i16 as u32;
                return self.link(sys, reg, disp);
            }
            0x0808 => {
                // LINK.L An,#disp (68020+)
                if !self.variant().is_020_or_later() {
                    return self.exception_illegal(sys);
                }
                let disp = self.read_imm_32(sys);
                return self.link(sys, reg, disp);
            }
            0x0E58 => {
                // UNLK An
                let an = self.regs.a(usize::from(reg));
                self.regs.set_active_sp(an);
                let frame = self.pop_32(sys);
                self.regs.set_a(usize::from(reg), frame);
                return;
            }
            0x0E60 => {
                // MOVE An,USP
                if !self.require_supervisor(sys) {
                    return;
                }
                self.regs.usp = self.regs.a(usize::from(reg));
                return;
            }
            0x0E68 => {
                // MOVE USP,An
                if !self.require_supervisor(sys) {
                    return;
                }
                let usp = self.regs.usp;
                self.regs.set_a(usize::from(reg), usp);
                return;
            }
            0x0840 if mode == 0 => {
                // SWAP Dn
                let r = usize::from(reg);
                let value = self.regs.d[r].rotate_left(16);
                self.regs.d[r] = value;
                return self.flags_logic(value, Size::Long);
            }
            0x0848 if mode == 1 => {
                // BKPT #n (68010+): no debug hardware responds.
                return self.exception_illegal(sys);
            }
            0x0880 if mode == 0 => return self.ext(reg, Size::Byte, Size::Word),
            0x08C0 if mode == 0 => return self.ext(reg, Size::Word, Size::Long),
            0x09C0 if mode == 0 => {
                // EXTB.L (68020+)
                if !self.variant().is_020_or_later() {
                    return self.exception_illegal(sys);
                }
                return self.ext(reg, Size::Byte, Size::Long);
            }
            _ => {}
        }

        match op >> 6 & 0x3F {
            // NEGX
            0x00..=0x02 => self.single_op(sys, op, |cpu, sys2, dst, size, value| {
                let x = cpu.x_bit();
                let result = 0u32.wrapping_sub(value).wrapping_sub(x);
                cpu.flags_subx(size, value, 0, result);
                cpu.write_operand(sys2, dst, size, result);
            }),
            // MOVE from SR (privileged on 68010+)
            0x03 => {
                if self.variant().is_010_or_later() && !self.require_supervisor(sys) {
                    return;
                }
                let sr = self.regs.sr;
                let Some(dst) = self.resolve(sys, mode, reg, Size::Word) else {
                    return self.exception_illegal(sys);
                };
                self.write_operand(sys, dst, Size::Word, u32::from(sr));
            }
            // CLR
            0x08..=0x0A => self.single_op(sys, op, |cpu, sys2, dst, size, _| {
                cpu.flags_logic(0, size);
                cpu.write_operand(sys2, dst, size, 0);
            }),
            // MOVE from CCR (68010+)
            0x0B => {
                if !self.variant().is_010_or_later() {
                    return self.exception_illegal(sys);
                }
                let ccr = self.regs.sr & 0x001F;
                let Some(dst) = self.resolve(sys, mode, reg, Size::Word) else {
                    return self.exception_illegal(sys);
                };
                self.write_operand(sys, dst, Size::Word, u32::from(ccr));
            }
            // NEG
            0x10..=0x12 => self.single_op(sys, op, |cpu, sys2, dst, size, value| {
                let result = 0u32.wrapping_sub(value);
                cpu.flags_sub(size, value, 0, result);
                cpu.write_operand(sys2, dst, size, result);
            }),
            // MOVE to CCR
            0x13 => {
                let Some(src) = self.resolve(sys, mode, reg, Size::Word) else {
                    return self.exception_illegal(sys);
                };
                let value = self.read_operand(sys, src, Size::Word);
                self.set_ccr(value as u16);
            }
            // NOT
            0x18..=0x1A => self.single_op(sys, op, |cpu, sys2, dst, size, value| {
                let result = !value;
                cpu.flags_logic(result, size);
                cpu.write_operand(sys2, dst, size, result);
            }),
            // MOVE to SR (privileged)
            0x1B => {
                if !self.require_supervisor(sys) {
                    return;
                }
                let Some(src) = self.resolve(sys, mode, reg, Size::Word) else {
                    return self.exception_illegal(sys);
                };
                let value = self.read_operand(sys, src, Size::Word);
                self.set_sr(value as u16);
            }
            // NBCD
            0x20 => {
                let Some(dst) = self.resolve(sys, mode, reg, Size::Byte) else {
                    return self.exception_illegal(sys);
                };
                if matches!(dst, Operand::AddrReg(_) | Operand::Imm(_)) {
                    return self.exception_illegal(sys);
                }
                let value = self.read_operand(sys, dst, Size::Byte);
                let x = self.x_bit() as u8;
                let (result, borrow, overflow) = self.bcd_sub(0, value as u8, x);
                self.nbcd_flags(result, borrow, overflow);
                self.write_operand(sys, dst, Size::Byte, u32::from(result));
            }
            // PEA
            0x21 => {
                let Some(Operand::Mem(ea)) = self.resolve_control(sys, mode, reg) else {
                    return self.exception_illegal(sys);
                };
                self.push_32(sys, ea);
            }
            // MOVEM registers-to-memory
            0x22 | 0x23 => self.exec_movem(sys, op, false),
            // TST
            0x28..=0x2A => {
                let size = Size::from_bits(op >> 6).expect("sized TST row");
                if mode == 1 && (size == Size::Byte || !self.variant().is_020_or_later()) {
                    return self.exception_illegal(sys);
                }
                if mode == 7 && reg > 1 && !self.variant().is_020_or_later() {
                    return self.exception_illegal(sys);
                }
                let Some(src) = self.resolve(sys, mode, reg, size) else {
                    return self.exception_illegal(sys);
                };
                let value = self.read_operand(sys, src, size);
                self.flags_logic(value, size);
            }
            // TAS
            0x2B => {
                let Some(dst) = self.resolve(sys, mode, reg, Size::Byte) else {
                    return self.exception_illegal(sys);
                };
                if matches!(dst, Operand::AddrReg(_) | Operand::Imm(_)) {
                    return self.exception_illegal(sys);
                }
                let value = self.read_operand(sys, dst, Size::Byte);
                self.flags_logic(value, Size::Byte);
                self.write_operand(sys, dst, Size::Byte, value | 0x80);
            }
            // MULU.L/MULS.L (68020+)
            0x30 => self.exec_mull(sys, op),
            // DIVU.L/DIVS.L (68020+)
            0x31 => self.exec_divl(sys, op),
            // MOVEM memory-to-registers
            0x32 | 0x33 => self.exec_movem(sys, op, true),
            // JSR
            0x3A => {
                let Some(Operand::Mem(ea)) = self.resolve_control(sys, mode, reg) else {
                    return self.exception_illegal(sys);
                };
                let ret = self.regs.pc;
                self.push_32(sys, ret);
                self.jump(ea);
            }
            // JMP
            0x3B => {
                let Some(Operand::Mem(ea)) = self.resolve_control(sys, mode, reg) else {
                    return self.exception_illegal(sys);
                };
                self.jump(ea);
            }
            _ => match op >> 6 & 7 {
                // LEA
                7 => {
                    let Some(Operand::Mem(ea)) = self.resolve_control(sys, mode, reg) else {
                        return self.exception_illegal(sys);
                    };
                    self.regs.set_a(usize::from(op >> 9 & 7), ea);
                }
                // CHK.W / CHK.L
                6 | 4 => {
                    let size = if op >> 6 & 7 == 6 {
                        Size::Word
                    } else {
                        if !self.variant().is_020_or_later() {
                            return self.exception_illegal(sys);
                        }
                        Size::Long
                    };
                    let Some(src) = self.resolve(sys, mode, reg, size) else {
                        return self.exception_illegal(sys);
                    };
                    let bound = size.sign_extend(self.read_operand(sys, src, size)) as i32;
                    let value =
                        size.sign_extend(self.regs.d[usize::from(op >> 9 & 7)] & size.mask())
                            as i32;
                    if value < 0 {
                        self.regs.sr |= SR_N;
                        self.exception_trap(sys, EX_CHK);
                    } else if value > bound {
                        self.regs.sr &= !SR_N;
                        self.exception_trap(sys, EX_CHK);
                    }
                }
                _ => self.exception_illegal(sys),
            },
        }
    }

    /// Shared body for NEGX/CLR/NEG/NOT.
    fn single_op(
        &mut self,
        sys: &mut S,
        op: u16,
        body: fn(&mut Self, &mut S, Operand, Size, u32),
    ) {
        let size = Size::from_bits(op >> 6).expect("sized single-operand row");
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let Some(dst) = self.resolve(sys, mode, reg, size) else {
            return self.exception_illegal(sys);
        };
        if matches!(dst, Operand::AddrReg(_) | Operand::Imm(_)) {
            return self.exception_illegal(sys);
        }
        let value = self.read_operand(sys, dst, size);
        body(self, sys, dst, size, value);
    }

    /// Control-addressing resolve (no registers, increments or immediates).
    fn resolve_control(&mut self, sys: &mut S, mode: u8, reg: u8) -> Option<Operand> {
        match mode {
            2 | 5 | 6 => self.resolve(sys, mode, reg, Size::Long),
            7 if reg < 4 => self.resolve(sys, mode, reg, Size::Long),
            _ => None,
        }
    }

    fn link(&mut self, sys: &mut S, reg: u8, disp: u32) {
        let an = self.regs.a(usize::from(reg));
        self.push_32(sys, an);
        let sp = self.regs.active_sp();
        self.regs.set_a(usize::from(reg), sp);
        self.regs.set_active_sp(sp.wrapping_add(disp));
    }

    fn ext(&mut self, reg: u8, from: Size, to: Size) {
        let r = usize::from(reg);
        let value = to.sign_extend(from.sign_extend(self.regs.d[r]) & to.mask());
        self.regs.d[r] = self.regs.d[r] & !to.mask() | value & to.mask();
        self.flags_logic(value, to);
    }

    fn nbcd_flags(&mut self, result: u8, borrow: bool, overflow: bool) {
        let mut sr = self.regs.sr & !(SR_X | SR_N | SR_V | SR_C);
        if result & 0x80 != 0 {
            sr |= SR_N;
        }
        if result != 0 {
            sr &= !SR_Z;
        }
        if borrow {
            sr |= SR_X | SR_C;
        }
        if overflow {
            sr |= SR_V;
        }
        self.regs.sr = sr;
    }

    fn exec_movec(&mut self, sys: &mut S, op: u16) {
        if !self.variant().is_010_or_later() {
            return self.exception_illegal(sys);
        }
        if !self.require_supervisor(sys) {
            return;
        }
        let ext = self.read_imm_16(sys);
        let gp = usize::from(ext >> 12 & 7);
        let is_addr = ext & 0x8000 != 0;
        let to_control = op & 1 != 0;
        let code = ext & 0x0FFF;
        let only_020 = matches!(code, 0x002 | 0x802);
        if only_020 && !self.variant().is_020_or_later() {
            return self.exception_illegal(sys);
        }
        if to_control {
            let value = if is_addr {
                self.regs.a(gp)
            } else {
                self.regs.d[gp]
            };
            match code {
                0x000 => self.regs.sfc = value & 7,
                0x001 => self.regs.dfc = value & 7,
                0x002 => self.regs.cacr = value,
                0x800 => self.regs.usp = value,
                0x801 => self.regs.vbr = value,
                0x802 => self.regs.caar = value,
                // Master/interrupt stack pointers share SSP here.
                0x803 | 0x804 if self.variant().is_020_or_later() => self.regs.ssp = value,
                _ => return self.exception_illegal(sys),
            }
        } else {
            let value = match code {
                0x000 => self.regs.sfc,
                0x001 => self.regs.dfc,
                0x002 => self.regs.cacr,
                0x800 => self.regs.usp,
                0x801 => self.regs.vbr,
                0x802 => self.regs.caar,
                0x803 | 0x804 if self.variant().is_020_or_later() => self.regs.ssp,
                _ => return self.exception_illegal(sys),
            };
            if is_addr {
                self.regs.set_a(gp, value);
            } else {
                self.regs.d[gp] = value;
            }
        }
    }

    fn exec_movem(&mut self, sys: &mut S, op: u16, to_regs: bool) {
        let size = if op & 0x0040 != 0 {
            Size::Long
        } else {
            Size::Word
        };
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let mask = self.read_imm_16(sys);
        let mut count = 0u32;

        if !to_regs && mode == 4 {
            // Pre-decrement: mask bit 0 names A7, descending.
            let mut addr = self.regs.a(usize::from(reg));
            for bit in 0..16 {
                if mask & 1 << bit == 0 {
                    continue;
                }
                addr = addr.wrapping_sub(size.bytes());
                let value = self.movem_reg(15 - bit);
                match size {
                    Size::Word => self.write_16(sys, addr, value as u16),
                    _ => self.write_32(sys, addr, value),
                }
                count += 1;
            }
            self.regs.set_a(usize::from(reg), addr);
        } else if to_regs && mode == 3 {
            let mut addr = self.regs.a(usize::from(reg));
            for bit in 0..16 {
                if mask & 1 << bit == 0 {
                    continue;
                }
                let value = match size {
                    Size::Word => u32::from(self.read_16(sys, addr)) as u16 as i16 as u32,
                    _ => self.read_32(sys, addr),
                };
                self.set_movem_reg(bit, value);
                addr = addr.wrapping_add(size.bytes());
                count += 1;
            }
            self.regs.set_a(usize::from(reg), addr);
        } else {
            let resolved = if to_regs && mode == 7 && (reg == 2 || reg == 3) {
                self.resolve(sys, mode, reg, size)
            } else {
                self.resolve_control(sys, mode, reg)
            };
            let Some(Operand::Mem(mut addr)) = resolved else {
                return self.exception_illegal(sys);
            };
            for bit in 0..16 {
                if mask & 1 << bit == 0 {
                    continue;
                }
                if to_regs {
                    let value = match size {
                        Size::Word => u32::from(self.read_16(sys, addr)) as u16 as i16 as u32,
                        _ => self.read_32(sys, addr),
                    };
                    self.set_movem_reg(bit, value);
                } else {
                    let value = self.movem_reg(bit);
                    match size {
                        Size::Word => self.write_16(sys, addr, value as u16),
                        _ => self.write_32(sys, addr, value),
                    }
                }
                addr = addr.wrapping_add(size.bytes());
                count += 1;
            }
        }

        let shift = if size == Size::Long {
            self.cyc_movem_l
        } else {
            self.cyc_movem_w
        };
        self.charge(count << shift);
    }

    fn movem_reg(&self, index: u16) -> u32 {
        let index = usize::from(index);
        if index < 8 {
            self.regs.d[index]
        } else {
            self.regs.a(index - 8)
        }
    }

    fn set_movem_reg(&mut self, index: u16, value: u32) {
        let index = usize::from(index);
        if index < 8 {
            self.regs.d[index] = value;
        } else {
            self.regs.set_a(index - 8, value);
        }
    }

    // === 68020 long multiply/divide ===

    fn exec_mull(&mut self, sys: &mut S, op: u16) {
        if !self.variant().is_020_or_later() {
            return self.exception_illegal(sys);
        }
        let ext = self.read_imm_16(sys);
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let Some(src) = self.resolve(sys, mode, reg, Size::Long) else {
            return self.exception_illegal(sys);
        };
        let factor = self.read_operand(sys, src, Size::Long);
        let dl = usize::from(ext >> 12 & 7);
        let dh = usize::from(ext & 7);
        let signed = ext & 0x0800 != 0;
        let quad = ext & 0x0400 != 0;

        let product: u64 = if signed {
            (i64::from(factor as i32) * i64::from(self.regs.d[dl] as i32)) as u64
        } else {
            u64::from(factor) * u64::from(self.regs.d[dl])
        };
        let mut sr = self.regs.sr & !(SR_N | SR_Z | SR_V | SR_C);
        if quad {
            self.regs.d[dh] = (product >> 32) as u32;
            self.regs.d[dl] = product as u32;
            if product == 0 {
                sr |= SR_Z;
            }
            if product & 0x8000_0000_0000_0000 != 0 {
                sr |= SR_N;
            }
        } else {
            let low = product as u32;
            self.regs.d[dl] = low;
            let fits = if signed {
                product as i64 == i64::from(low as i32)
            } else {
                product >> 32 == 0
            };
            if !fits {
                sr |= SR_V;
            }
            if low == 0 {
                sr |= SR_Z;
            }
            if low & 0x8000_0000 != 0 {
                sr |= SR_N;
            }
        }
        self.regs.sr = sr;
    }

    fn exec_divl(&mut self, sys: &mut S, op: u16) {
        if !self.variant().is_020_or_later() {
            return self.exception_illegal(sys);
        }
        let ext = self.read_imm_16(sys);
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let Some(src) = self.resolve(sys, mode, reg, Size::Long) else {
            return self.exception_illegal(sys);
        };
        let divisor = self.read_operand(sys, src, Size::Long);
        if divisor == 0 {
            return self.exception_trap(sys, EX_ZERO_DIVIDE);
        }
        let dq = usize::from(ext >> 12 & 7);
        let dr = usize::from(ext & 7);
        let signed = ext & 0x0800 != 0;
        let quad = ext & 0x0400 != 0;

        let dividend: u64 = if quad {
            u64::from(self.regs.d[dr]) << 32 | u64::from(self.regs.d[dq])
        } else if signed {
            i64::from(self.regs.d[dq] as i32) as u64
        } else {
            u64::from(self.regs.d[dq])
        };

        let mut sr = self.regs.sr & !(SR_N | SR_Z | SR_V | SR_C);
        if signed {
            let dividend = dividend as i64;
            let divisor = i64::from(divisor as i32);
            let quotient = dividend.wrapping_div(divisor);
            let remainder = dividend.wrapping_rem(divisor);
            if quotient > i64::from(i32::MAX) || quotient < i64::from(i32::MIN) {
                sr |= SR_V;
            } else {
                self.regs.d[dq] = quotient as u32;
                if dr != dq {
                    self.regs.d[dr] = remainder as u32;
                }
                if quotient == 0 {
                    sr |= SR_Z;
                }
                if quotient < 0 {
                    sr |= SR_N;
                }
            }
        } else {
            let divisor = u64::from(divisor);
            let quotient = dividend / divisor;
            let remainder = dividend % divisor;
            if quotient > u64::from(u32::MAX) {
                sr |= SR_V;
            } else {
                self.regs.d[dq] = quotient as u32;
                if dr != dq {
                    self.regs.d[dr] = remainder as u32;
                }
                if quotient == 0 {
                    sr |= SR_Z;
                }
                if quotient & 0x8000_0000 != 0 {
                    sr |= SR_N;
                }
            }
        }
        self.regs.sr = sr;
    }
}
