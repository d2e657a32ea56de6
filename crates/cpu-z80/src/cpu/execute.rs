//! Prefix-aware opcode dispatch.
//!
//! The main page deducts its T-states and executes; prefix bytes (CB, ED,
//! DD, FD, DD CB, FD CB) chain into nested dispatchers, each deducting from
//! its own cycle table. Illegal DD/FD prefixes fall back to the unprefixed
//! opcode after a warning; illegal ED pages are two-byte no-ops.

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::Z80;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

/// Which index register a DD/FD page operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Xy {
    Ix,
    Iy,
}

impl<S> Z80<S> {
    // === Register-field helpers (main page encoding) ===

    fn reg8(&mut self, sys: &mut S, idx: u8) -> u8 {
        match idx {
            0 => self.regs.b(),
            1 => self.regs.c(),
            2 => self.regs.d(),
            3 => self.regs.e(),
            4 => self.regs.h(),
            5 => self.regs.l(),
            6 => {
                let hl = self.regs.hl;
                self.rm(sys, hl)
            }
            _ => self.regs.a(),
        }
    }

    fn set_reg8(&mut self, sys: &mut S, idx: u8, value: u8) {
        match idx {
            0 => self.regs.set_b(value),
            1 => self.regs.set_c(value),
            2 => self.regs.set_d(value),
            3 => self.regs.set_e(value),
            4 => self.regs.set_h(value),
            5 => self.regs.set_l(value),
            6 => {
                let hl = self.regs.hl;
                self.wm(sys, hl, value);
            }
            _ => self.regs.set_a(value),
        }
    }

    /// Register field with H/L never aliased to memory.
    fn plain_reg(&self, idx: u8) -> u8 {
        match idx {
            0 => self.regs.b(),
            1 => self.regs.c(),
            2 => self.regs.d(),
            3 => self.regs.e(),
            4 => self.regs.h(),
            5 => self.regs.l(),
            _ => self.regs.a(),
        }
    }

    /// Register field with H/L never aliased to memory (DD CB writeback).
    fn set_plain_reg(&mut self, idx: u8, value: u8) {
        match idx {
            0 => self.regs.set_b(value),
            1 => self.regs.set_c(value),
            2 => self.regs.set_d(value),
            3 => self.regs.set_e(value),
            4 => self.regs.set_h(value),
            5 => self.regs.set_l(value),
            _ => self.regs.set_a(value),
        }
    }

    fn xy_get(&self, xy: Xy) -> u16 {
        match xy {
            Xy::Ix => self.regs.ix,
            Xy::Iy => self.regs.iy,
        }
    }

    fn xy_set(&mut self, xy: Xy, value: u16) {
        match xy {
            Xy::Ix => self.regs.ix = value,
            Xy::Iy => self.regs.iy = value,
        }
    }

    /// Register field on a DD/FD page: H and L become the index halves.
    fn xy_reg8(&mut self, idx: u8, xy: Xy) -> u8 {
        match idx {
            4 => (self.xy_get(xy) >> 8) as u8,
            5 => self.xy_get(xy) as u8,
            _ => match idx {
                0 => self.regs.b(),
                1 => self.regs.c(),
                2 => self.regs.d(),
                3 => self.regs.e(),
                _ => self.regs.a(),
            },
        }
    }

    fn set_xy_reg8(&mut self, idx: u8, xy: Xy, value: u8) {
        match idx {
            4 => {
                let v = self.xy_get(xy) & 0x00FF | u16::from(value) << 8;
                self.xy_set(xy, v);
            }
            5 => {
                let v = self.xy_get(xy) & 0xFF00 | u16::from(value);
                self.xy_set(xy, v);
            }
            _ => self.set_plain_reg(idx, value),
        }
    }

    /// Compute the (IX/IY + d) effective address; also lands in WZ.
    fn eaxy(&mut self, sys: &mut S, xy: Xy) {
        let disp = self.arg(sys) as i8;
        self.ea = self.xy_get(xy).wrapping_add(disp as u16);
        self.regs.wz = self.ea;
    }

    fn illegal_1(&mut self, sys: &mut S) {
        let pc = self.regs.pc.wrapping_sub(1);
        let prefix = self.rm(sys, pc.wrapping_sub(1));
        let op = self.rm(sys, pc);
        log::warn!("Z80 ill. opcode ${prefix:02x} ${op:02x} (${:04x})", pc.wrapping_sub(1));
    }

    fn illegal_2(&mut self, sys: &mut S) {
        let pc = self.regs.pc.wrapping_sub(1);
        let op = self.rm(sys, pc);
        log::warn!("Z80 ill. opcode $ed ${op:02x}");
    }

    // === Main page ===

    pub(crate) fn exec_op(&mut self, sys: &mut S, op: u8) {
        self.icount -= i32::from(self.cc.op[usize::from(op)]);
        self.op_main(sys, op);
    }

    fn op_main(&mut self, sys: &mut S, op: u8) {
        match op {
            // LD r,r' block (0x76 is HALT)
            0x76 => self.enter_halt(),
            0x40..=0x7F => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                let value = self.reg8(sys, src);
                self.set_reg8(sys, dst, value);
            }
            // ALU A,r block
            0x80..=0xBF => {
                let value = self.reg8(sys, op & 7);
                self.alu_a(op >> 3 & 7, value);
            }

            0x00 => {}
            0x01 => self.regs.bc = self.arg16(sys),
            0x02 => {
                let bc = self.regs.bc;
                let a = self.regs.a();
                self.wm(sys, bc, a);
                self.regs.set_wz_l((bc.wrapping_add(1) & 0xFF) as u8);
                self.regs.set_wz_h(a);
            }
            0x03 => self.regs.bc = self.regs.bc.wrapping_add(1),
            0x04 => {
                let v = self.regs.b();
                let r = self.inc8(v);
                self.regs.set_b(r);
            }
            0x05 => {
                let v = self.regs.b();
                let r = self.dec8(v);
                self.regs.set_b(r);
            }
            0x06 => {
                let n = self.arg(sys);
                self.regs.set_b(n);
            }
            0x07 => self.rlca(),
            0x08 => self.ex_af(),
            0x09 => {
                let r = self.add16(self.regs.hl, self.regs.bc);
                self.regs.hl = r;
            }
            0x0A => {
                let bc = self.regs.bc;
                let v = self.rm(sys, bc);
                self.regs.set_a(v);
                self.regs.wz = bc.wrapping_add(1);
            }
            0x0B => self.regs.bc = self.regs.bc.wrapping_sub(1),
            0x0C => {
                let v = self.regs.c();
                let r = self.inc8(v);
                self.regs.set_c(r);
            }
            0x0D => {
                let v = self.regs.c();
                let r = self.dec8(v);
                self.regs.set_c(r);
            }
            0x0E => {
                let n = self.arg(sys);
                self.regs.set_c(n);
            }
            0x0F => self.rrca(),

            0x10 => {
                let b = self.regs.b().wrapping_sub(1);
                self.regs.set_b(b);
                self.jr_cond(sys, b != 0, 0x10);
            }
            0x11 => self.regs.de = self.arg16(sys),
            0x12 => {
                let de = self.regs.de;
                let a = self.regs.a();
                self.wm(sys, de, a);
                self.regs.set_wz_l((de.wrapping_add(1) & 0xFF) as u8);
                self.regs.set_wz_h(a);
            }
            0x13 => self.regs.de = self.regs.de.wrapping_add(1),
            0x14 => {
                let v = self.regs.d();
                let r = self.inc8(v);
                self.regs.set_d(r);
            }
            0x15 => {
                let v = self.regs.d();
                let r = self.dec8(v);
                self.regs.set_d(r);
            }
            0x16 => {
                let n = self.arg(sys);
                self.regs.set_d(n);
            }
            0x17 => self.rla(),
            0x18 => self.jr(sys),
            0x19 => {
                let r = self.add16(self.regs.hl, self.regs.de);
                self.regs.hl = r;
            }
            0x1A => {
                let de = self.regs.de;
                let v = self.rm(sys, de);
                self.regs.set_a(v);
                self.regs.wz = de.wrapping_add(1);
            }
            0x1B => self.regs.de = self.regs.de.wrapping_sub(1),
            0x1C => {
                let v = self.regs.e();
                let r = self.inc8(v);
                self.regs.set_e(r);
            }
            0x1D => {
                let v = self.regs.e();
                let r = self.dec8(v);
                self.regs.set_e(r);
            }
            0x1E => {
                let n = self.arg(sys);
                self.regs.set_e(n);
            }
            0x1F => self.rra(),

            0x20 => {
                let cond = self.regs.f() & ZF == 0;
                self.jr_cond(sys, cond, 0x20);
            }
            0x21 => self.regs.hl = self.arg16(sys),
            0x22 => {
                let ea = self.arg16(sys);
                let hl = self.regs.hl;
                self.wm16(sys, ea, hl);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x23 => self.regs.hl = self.regs.hl.wrapping_add(1),
            0x24 => {
                let v = self.regs.h();
                let r = self.inc8(v);
                self.regs.set_h(r);
            }
            0x25 => {
                let v = self.regs.h();
                let r = self.dec8(v);
                self.regs.set_h(r);
            }
            0x26 => {
                let n = self.arg(sys);
                self.regs.set_h(n);
            }
            0x27 => self.daa(),
            0x28 => {
                let cond = self.regs.f() & ZF != 0;
                self.jr_cond(sys, cond, 0x28);
            }
            0x29 => {
                let hl = self.regs.hl;
                let r = self.add16(hl, hl);
                self.regs.hl = r;
            }
            0x2A => {
                let ea = self.arg16(sys);
                self.regs.hl = self.rm16(sys, ea);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x2B => self.regs.hl = self.regs.hl.wrapping_sub(1),
            0x2C => {
                let v = self.regs.l();
                let r = self.inc8(v);
                self.regs.set_l(r);
            }
            0x2D => {
                let v = self.regs.l();
                let r = self.dec8(v);
                self.regs.set_l(r);
            }
            0x2E => {
                let n = self.arg(sys);
                self.regs.set_l(n);
            }
            0x2F => {
                let a = self.regs.a() ^ 0xFF;
                self.regs.set_a(a);
                let f = self.regs.f() & (SF | ZF | PF | CF) | HF | NF | a & (YF | XF);
                self.regs.set_f(f);
            }

            0x30 => {
                let cond = self.regs.f() & CF == 0;
                self.jr_cond(sys, cond, 0x30);
            }
            0x31 => self.regs.sp = self.arg16(sys),
            0x32 => {
                let ea = self.arg16(sys);
                let a = self.regs.a();
                self.wm(sys, ea, a);
                self.regs.set_wz_l((ea.wrapping_add(1) & 0xFF) as u8);
                self.regs.set_wz_h(a);
            }
            0x33 => self.regs.sp = self.regs.sp.wrapping_add(1),
            0x34 => {
                let hl = self.regs.hl;
                let v = self.rm(sys, hl);
                let r = self.inc8(v);
                self.wm(sys, hl, r);
            }
            0x35 => {
                let hl = self.regs.hl;
                let v = self.rm(sys, hl);
                let r = self.dec8(v);
                self.wm(sys, hl, r);
            }
            0x36 => {
                let n = self.arg(sys);
                let hl = self.regs.hl;
                self.wm(sys, hl, n);
            }
            0x37 => {
                let f = self.regs.f() & (SF | ZF | YF | XF | PF)
                    | CF
                    | self.regs.a() & (YF | XF);
                self.regs.set_f(f);
            }
            0x38 => {
                let cond = self.regs.f() & CF != 0;
                self.jr_cond(sys, cond, 0x38);
            }
            0x39 => {
                let r = self.add16(self.regs.hl, self.regs.sp);
                self.regs.hl = r;
            }
            0x3A => {
                let ea = self.arg16(sys);
                let v = self.rm(sys, ea);
                self.regs.set_a(v);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x3B => self.regs.sp = self.regs.sp.wrapping_sub(1),
            0x3C => {
                let v = self.regs.a();
                let r = self.inc8(v);
                self.regs.set_a(r);
            }
            0x3D => {
                let v = self.regs.a();
                let r = self.dec8(v);
                self.regs.set_a(r);
            }
            0x3E => {
                let n = self.arg(sys);
                self.regs.set_a(n);
            }
            0x3F => {
                let f = self.regs.f();
                let new = (f & (SF | ZF | YF | XF | PF | CF)
                    | (f & CF) << 4
                    | self.regs.a() & (YF | XF))
                    ^ CF;
                self.regs.set_f(new);
            }

            0xC0 => {
                let cond = self.regs.f() & ZF == 0;
                self.ret_cond(sys, cond, 0xC0);
            }
            0xC1 => self.regs.bc = self.pop16(sys),
            0xC2 => {
                let cond = self.regs.f() & ZF == 0;
                self.jp_cond(sys, cond);
            }
            0xC3 => self.jp(sys),
            0xC4 => {
                let cond = self.regs.f() & ZF == 0;
                self.call_cond(sys, cond, 0xC4);
            }
            0xC5 => {
                let bc = self.regs.bc;
                self.push16(sys, bc);
            }
            0xC6 => {
                let n = self.arg(sys);
                self.add_a(n);
            }
            0xC7 => self.rst(sys, 0x00),
            0xC8 => {
                let cond = self.regs.f() & ZF != 0;
                self.ret_cond(sys, cond, 0xC8);
            }
            0xC9 => {
                self.regs.pc = self.pop16(sys);
                self.regs.wz = self.regs.pc;
            }
            0xCA => {
                let cond = self.regs.f() & ZF != 0;
                self.jp_cond(sys, cond);
            }
            0xCB => {
                self.regs.r = self.regs.r.wrapping_add(1);
                let op2 = self.rop(sys);
                self.exec_cb(sys, op2);
            }
            0xCC => {
                let cond = self.regs.f() & ZF != 0;
                self.call_cond(sys, cond, 0xCC);
            }
            0xCD => self.call(sys),
            0xCE => {
                let n = self.arg(sys);
                self.adc_a(n);
            }
            0xCF => self.rst(sys, 0x08),

            0xD0 => {
                let cond = self.regs.f() & CF == 0;
                self.ret_cond(sys, cond, 0xD0);
            }
            0xD1 => self.regs.de = self.pop16(sys),
            0xD2 => {
                let cond = self.regs.f() & CF == 0;
                self.jp_cond(sys, cond);
            }
            0xD3 => {
                let port = u16::from(self.arg(sys)) | u16::from(self.regs.a()) << 8;
                let a = self.regs.a();
                self.io_out(sys, port, a);
                self.regs.set_wz_l(((port & 0xFF) + 1) as u8);
                self.regs.set_wz_h(a);
            }
            0xD4 => {
                let cond = self.regs.f() & CF == 0;
                self.call_cond(sys, cond, 0xD4);
            }
            0xD5 => {
                let de = self.regs.de;
                self.push16(sys, de);
            }
            0xD6 => {
                let n = self.arg(sys);
                self.sub_a(n);
            }
            0xD7 => self.rst(sys, 0x10),
            0xD8 => {
                let cond = self.regs.f() & CF != 0;
                self.ret_cond(sys, cond, 0xD8);
            }
            0xD9 => self.exx(),
            0xDA => {
                let cond = self.regs.f() & CF != 0;
                self.jp_cond(sys, cond);
            }
            0xDB => {
                let port = u16::from(self.arg(sys)) | u16::from(self.regs.a()) << 8;
                let v = self.io_in(sys, port);
                self.regs.set_a(v);
                self.regs.wz = port.wrapping_add(1);
            }
            0xDC => {
                let cond = self.regs.f() & CF != 0;
                self.call_cond(sys, cond, 0xDC);
            }
            0xDD => {
                self.regs.r = self.regs.r.wrapping_add(1);
                let op2 = self.rop(sys);
                self.exec_xy(sys, op2, Xy::Ix);
            }
            0xDE => {
                let n = self.arg(sys);
                self.sbc_a(n);
            }
            0xDF => self.rst(sys, 0x18),

            0xE0 => {
                let cond = self.regs.f() & PF == 0;
                self.ret_cond(sys, cond, 0xE0);
            }
            0xE1 => self.regs.hl = self.pop16(sys),
            0xE2 => {
                let cond = self.regs.f() & PF == 0;
                self.jp_cond(sys, cond);
            }
            0xE3 => {
                let hl = self.regs.hl;
                let new = self.ex_sp(sys, hl);
                self.regs.hl = new;
            }
            0xE4 => {
                let cond = self.regs.f() & PF == 0;
                self.call_cond(sys, cond, 0xE4);
            }
            0xE5 => {
                let hl = self.regs.hl;
                self.push16(sys, hl);
            }
            0xE6 => {
                let n = self.arg(sys);
                self.and_a(n);
            }
            0xE7 => self.rst(sys, 0x20),
            0xE8 => {
                let cond = self.regs.f() & PF != 0;
                self.ret_cond(sys, cond, 0xE8);
            }
            0xE9 => self.regs.pc = self.regs.hl,
            0xEA => {
                let cond = self.regs.f() & PF != 0;
                self.jp_cond(sys, cond);
            }
            0xEB => self.ex_de_hl(),
            0xEC => {
                let cond = self.regs.f() & PF != 0;
                self.call_cond(sys, cond, 0xEC);
            }
            0xED => {
                self.regs.r = self.regs.r.wrapping_add(1);
                let op2 = self.rop(sys);
                self.exec_ed(sys, op2);
            }
            0xEE => {
                let n = self.arg(sys);
                self.xor_a(n);
            }
            0xEF => self.rst(sys, 0x28),

            0xF0 => {
                let cond = self.regs.f() & SF == 0;
                self.ret_cond(sys, cond, 0xF0);
            }
            0xF1 => self.regs.af = self.pop16(sys),
            0xF2 => {
                let cond = self.regs.f() & SF == 0;
                self.jp_cond(sys, cond);
            }
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }
            0xF4 => {
                let cond = self.regs.f() & SF == 0;
                self.call_cond(sys, cond, 0xF4);
            }
            0xF5 => {
                let af = self.regs.af;
                self.push16(sys, af);
            }
            0xF6 => {
                let n = self.arg(sys);
                self.or_a(n);
            }
            0xF7 => self.rst(sys, 0x30),
            0xF8 => {
                let cond = self.regs.f() & SF != 0;
                self.ret_cond(sys, cond, 0xF8);
            }
            0xF9 => self.regs.sp = self.regs.hl,
            0xFA => {
                let cond = self.regs.f() & SF != 0;
                self.jp_cond(sys, cond);
            }
            0xFB => self.ei(),
            0xFC => {
                let cond = self.regs.f() & SF != 0;
                self.call_cond(sys, cond, 0xFC);
            }
            0xFD => {
                self.regs.r = self.regs.r.wrapping_add(1);
                let op2 = self.rop(sys);
                self.exec_xy(sys, op2, Xy::Iy);
            }
            0xFE => {
                let n = self.arg(sys);
                self.cp_a(n);
            }
            0xFF => self.rst(sys, 0x38),
        }
    }

    fn alu_a(&mut self, kind: u8, value: u8) {
        match kind {
            0 => self.add_a(value),
            1 => self.adc_a(value),
            2 => self.sub_a(value),
            3 => self.sbc_a(value),
            4 => self.and_a(value),
            5 => self.xor_a(value),
            6 => self.or_a(value),
            _ => self.cp_a(value),
        }
    }

    // === CB page: rotate/shift/bit/res/set ===

    fn exec_cb(&mut self, sys: &mut S, op: u8) {
        self.icount -= i32::from(self.cc.cb[usize::from(op)]);
        let target = op & 7;
        let sel = op >> 3 & 7;
        match op >> 6 {
            0 => {
                let value = self.reg8(sys, target);
                let result = self.rotate_shift(sel, value);
                self.set_reg8(sys, target, result);
            }
            1 => {
                let value = self.reg8(sys, target);
                if target == 6 {
                    self.bit_hl(sel, value);
                } else {
                    self.bit(sel, value);
                }
            }
            2 => {
                let value = self.reg8(sys, target) & !(1 << sel);
                self.set_reg8(sys, target, value);
            }
            _ => {
                let value = self.reg8(sys, target) | 1 << sel;
                self.set_reg8(sys, target, value);
            }
        }
    }

    fn rotate_shift(&mut self, sel: u8, value: u8) -> u8 {
        match sel {
            0 => self.rlc(value),
            1 => self.rrc(value),
            2 => self.rl(value),
            3 => self.rr(value),
            4 => self.sla(value),
            5 => self.sra(value),
            6 => self.sll(value),
            _ => self.srl(value),
        }
    }

    // === ED page ===

    fn exec_ed(&mut self, sys: &mut S, op: u8) {
        self.icount -= i32::from(self.cc.ed[usize::from(op)]);
        match op {
            // IN r,(C) / OUT (C),r / 16-bit ADC/SBC / LD (nn),rr
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x78 => {
                let bc = self.regs.bc;
                let v = self.io_in(sys, bc);
                let f = self.regs.f() & CF | self.ft().szp[usize::from(v)];
                self.regs.set_f(f);
                self.set_plain_reg(op >> 3 & 7, v);
                if op == 0x78 {
                    self.regs.wz = bc.wrapping_add(1);
                }
            }
            0x70 => {
                // IN F,(C): flags only, result discarded.
                let bc = self.regs.bc;
                let v = self.io_in(sys, bc);
                let f = self.regs.f() & CF | self.ft().szp[usize::from(v)];
                self.regs.set_f(f);
            }
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x79 => {
                let bc = self.regs.bc;
                let v = self.plain_reg(op >> 3 & 7);
                self.io_out(sys, bc, v);
                if op == 0x79 {
                    self.regs.wz = bc.wrapping_add(1);
                }
            }
            0x71 => {
                // OUT (C),0 on NMOS.
                let bc = self.regs.bc;
                self.io_out(sys, bc, 0);
            }
            0x42 => {
                let v = self.regs.bc;
                self.sbc_hl(v);
            }
            0x52 => {
                let v = self.regs.de;
                self.sbc_hl(v);
            }
            0x62 => {
                let v = self.regs.hl;
                self.sbc_hl(v);
            }
            0x72 => {
                let v = self.regs.sp;
                self.sbc_hl(v);
            }
            0x4A => {
                let v = self.regs.bc;
                self.adc_hl(v);
            }
            0x5A => {
                let v = self.regs.de;
                self.adc_hl(v);
            }
            0x6A => {
                let v = self.regs.hl;
                self.adc_hl(v);
            }
            0x7A => {
                let v = self.regs.sp;
                self.adc_hl(v);
            }
            0x43 | 0x53 | 0x63 | 0x73 => {
                let ea = self.arg16(sys);
                let v = match op >> 4 & 3 {
                    0 => self.regs.bc,
                    1 => self.regs.de,
                    2 => self.regs.hl,
                    _ => self.regs.sp,
                };
                self.wm16(sys, ea, v);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x4B | 0x5B | 0x6B | 0x7B => {
                let ea = self.arg16(sys);
                let v = self.rm16(sys, ea);
                match op >> 4 & 3 {
                    0 => self.regs.bc = v,
                    1 => self.regs.de = v,
                    2 => self.regs.hl = v,
                    _ => self.regs.sp = v,
                }
                self.regs.wz = ea.wrapping_add(1);
            }
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => self.neg(),
            0x4D => self.reti(sys),
            0x45 | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => self.retn(sys),
            0x46 | 0x4E | 0x66 | 0x6E => self.regs.im = 0,
            0x56 | 0x76 => self.regs.im = 1,
            0x5E | 0x7E => self.regs.im = 2,
            0x47 => self.ld_i_a(),
            0x4F => self.ld_r_a(),
            0x57 => self.ld_a_i(),
            0x5F => self.ld_a_r(),
            0x67 => self.rrd(sys),
            0x6F => self.rld(sys),

            0xA0 => self.ldi(sys),
            0xA1 => self.cpi(sys),
            0xA2 => self.ini(sys),
            0xA3 => self.outi(sys),
            0xA8 => self.ldd(sys),
            0xA9 => self.cpd(sys),
            0xAA => self.ind(sys),
            0xAB => self.outd(sys),
            0xB0 => self.ldir(sys),
            0xB1 => self.cpir(sys),
            0xB2 => self.inir(sys),
            0xB3 => self.otir(sys),
            0xB8 => self.lddr(sys),
            0xB9 => self.cpdr(sys),
            0xBA => self.indr(sys),
            0xBB => self.otdr(sys),

            _ => self.illegal_2(sys),
        }
    }

    // === DD/FD pages ===

    fn exec_xy(&mut self, sys: &mut S, op: u8, xy: Xy) {
        self.icount -= i32::from(self.cc.xy[usize::from(op)]);
        match op {
            0x09 => {
                let r = self.add16(self.xy_get(xy), self.regs.bc);
                self.xy_set(xy, r);
            }
            0x19 => {
                let r = self.add16(self.xy_get(xy), self.regs.de);
                self.xy_set(xy, r);
            }
            0x21 => {
                let v = self.arg16(sys);
                self.xy_set(xy, v);
            }
            0x22 => {
                let ea = self.arg16(sys);
                let v = self.xy_get(xy);
                self.wm16(sys, ea, v);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x23 => {
                let v = self.xy_get(xy).wrapping_add(1);
                self.xy_set(xy, v);
            }
            0x24 => {
                let v = (self.xy_get(xy) >> 8) as u8;
                let r = self.inc8(v);
                self.set_xy_reg8(4, xy, r);
            }
            0x25 => {
                let v = (self.xy_get(xy) >> 8) as u8;
                let r = self.dec8(v);
                self.set_xy_reg8(4, xy, r);
            }
            0x26 => {
                let n = self.arg(sys);
                self.set_xy_reg8(4, xy, n);
            }
            0x29 => {
                let v = self.xy_get(xy);
                let r = self.add16(v, v);
                self.xy_set(xy, r);
            }
            0x2A => {
                let ea = self.arg16(sys);
                let v = self.rm16(sys, ea);
                self.xy_set(xy, v);
                self.regs.wz = ea.wrapping_add(1);
            }
            0x2B => {
                let v = self.xy_get(xy).wrapping_sub(1);
                self.xy_set(xy, v);
            }
            0x2C => {
                let v = self.xy_get(xy) as u8;
                let r = self.inc8(v);
                self.set_xy_reg8(5, xy, r);
            }
            0x2D => {
                let v = self.xy_get(xy) as u8;
                let r = self.dec8(v);
                self.set_xy_reg8(5, xy, r);
            }
            0x2E => {
                let n = self.arg(sys);
                self.set_xy_reg8(5, xy, n);
            }
            0x34 => {
                self.eaxy(sys, xy);
                let ea = self.ea;
                let v = self.rm(sys, ea);
                let r = self.inc8(v);
                self.wm(sys, ea, r);
            }
            0x35 => {
                self.eaxy(sys, xy);
                let ea = self.ea;
                let v = self.rm(sys, ea);
                let r = self.dec8(v);
                self.wm(sys, ea, r);
            }
            0x36 => {
                self.eaxy(sys, xy);
                let n = self.arg(sys);
                let ea = self.ea;
                self.wm(sys, ea, n);
            }
            0x39 => {
                let r = self.add16(self.xy_get(xy), self.regs.sp);
                self.xy_set(xy, r);
            }

            0x76 => {
                self.illegal_1(sys);
                self.op_main(sys, op);
            }
            0x40..=0x7F => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if dst == 6 {
                    // LD (IX/IY+d),r — source is the unsubstituted register.
                    self.eaxy(sys, xy);
                    let v = self.plain_reg(src);
                    let ea = self.ea;
                    self.wm(sys, ea, v);
                } else if src == 6 {
                    self.eaxy(sys, xy);
                    let ea = self.ea;
                    let v = self.rm(sys, ea);
                    self.set_plain_reg(dst, v);
                } else {
                    let v = self.xy_reg8(src, xy);
                    self.set_xy_reg8(dst, xy, v);
                }
            }
            0x80..=0xBF => {
                let value = if op & 7 == 6 {
                    self.eaxy(sys, xy);
                    let ea = self.ea;
                    self.rm(sys, ea)
                } else {
                    self.xy_reg8(op & 7, xy)
                };
                self.alu_a(op >> 3 & 7, value);
            }

            0xCB => {
                self.eaxy(sys, xy);
                let op3 = self.arg(sys);
                self.exec_xycb(sys, op3);
            }
            0xE1 => {
                let v = self.pop16(sys);
                self.xy_set(xy, v);
            }
            0xE3 => {
                let v = self.xy_get(xy);
                let new = self.ex_sp(sys, v);
                self.xy_set(xy, new);
            }
            0xE5 => {
                let v = self.xy_get(xy);
                self.push16(sys, v);
            }
            0xE9 => self.regs.pc = self.xy_get(xy),
            0xF9 => self.regs.sp = self.xy_get(xy),

            _ => {
                // Prefix has no effect on this opcode.
                self.illegal_1(sys);
                self.op_main(sys, op);
            }
        }
    }

    // === DD CB / FD CB page ===
    //
    // Effective address and sub-opcode were fetched by the caller; every
    // form operates on memory, and the undocumented register forms also
    // copy the result into the register field.

    fn exec_xycb(&mut self, sys: &mut S, op: u8) {
        self.icount -= i32::from(self.cc.xycb[usize::from(op)]);
        let ea = self.ea;
        let target = op & 7;
        let sel = op >> 3 & 7;
        match op >> 6 {
            0 => {
                let value = self.rm(sys, ea);
                let result = self.rotate_shift(sel, value);
                self.wm(sys, ea, result);
                if target != 6 {
                    self.set_plain_reg(target, result);
                }
            }
            1 => {
                let value = self.rm(sys, ea);
                self.bit_xy(sel, value, ea);
            }
            2 => {
                let result = self.rm(sys, ea) & !(1 << sel);
                self.wm(sys, ea, result);
                if target != 6 {
                    self.set_plain_reg(target, result);
                }
            }
            _ => {
                let result = self.rm(sys, ea) | 1 << sel;
                self.wm(sys, ea, result);
                if target != 6 {
                    self.set_plain_reg(target, result);
                }
            }
        }
    }
}
