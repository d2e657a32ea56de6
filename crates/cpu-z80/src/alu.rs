//! ALU, rotate, block-transfer and control-flow helpers.
//!
//! ADD/ADC/SUB/SBC/CP index the process-global carry tables by
//! `(carry << 16) | (old_a << 8) | result`; everything else derives flags
//! from the SZ/SZP lookups. The undocumented XF/YF bits follow the NMOS part
//! throughout.

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::Z80;
use crate::flags::{CF, HF, NF, PF, SF, VF, XF, YF, ZF};

impl<S> Z80<S> {
    // === 8-bit arithmetic ===

    pub(crate) fn inc8(&mut self, value: u8) -> u8 {
        let res = value.wrapping_add(1);
        let f = self.regs.f() & CF | self.ft().szhv_inc[usize::from(res)];
        self.regs.set_f(f);
        res
    }

    pub(crate) fn dec8(&mut self, value: u8) -> u8 {
        let res = value.wrapping_sub(1);
        let f = self.regs.f() & CF | self.ft().szhv_dec[usize::from(res)];
        self.regs.set_f(f);
        res
    }

    pub(crate) fn add_a(&mut self, value: u8) {
        let ah = usize::from(self.regs.af) & 0xFF00;
        let res = self.regs.a().wrapping_add(value);
        self.regs.set_f(self.ft().szhvc_add[ah | usize::from(res)]);
        self.regs.set_a(res);
    }

    pub(crate) fn adc_a(&mut self, value: u8) {
        let ah = usize::from(self.regs.af) & 0xFF00;
        let c = usize::from(self.regs.af) & 1;
        let res = self.regs.a().wrapping_add(value).wrapping_add(c as u8);
        self.regs.set_f(self.ft().szhvc_add[c << 16 | ah | usize::from(res)]);
        self.regs.set_a(res);
    }

    pub(crate) fn sub_a(&mut self, value: u8) {
        let ah = usize::from(self.regs.af) & 0xFF00;
        let res = self.regs.a().wrapping_sub(value);
        self.regs.set_f(self.ft().szhvc_sub[ah | usize::from(res)]);
        self.regs.set_a(res);
    }

    pub(crate) fn sbc_a(&mut self, value: u8) {
        let ah = usize::from(self.regs.af) & 0xFF00;
        let c = usize::from(self.regs.af) & 1;
        let res = self.regs.a().wrapping_sub(value).wrapping_sub(c as u8);
        self.regs.set_f(self.ft().szhvc_sub[c << 16 | ah | usize::from(res)]);
        self.regs.set_a(res);
    }

    pub(crate) fn neg(&mut self) {
        let value = self.regs.a();
        self.regs.set_a(0);
        self.sub_a(value);
    }

    pub(crate) fn and_a(&mut self, value: u8) {
        let res = self.regs.a() & value;
        self.regs.set_a(res);
        self.regs.set_f(self.ft().szp[usize::from(res)] | HF);
    }

    pub(crate) fn or_a(&mut self, value: u8) {
        let res = self.regs.a() | value;
        self.regs.set_a(res);
        self.regs.set_f(self.ft().szp[usize::from(res)]);
    }

    pub(crate) fn xor_a(&mut self, value: u8) {
        let res = self.regs.a() ^ value;
        self.regs.set_a(res);
        self.regs.set_f(self.ft().szp[usize::from(res)]);
    }

    /// CP: like SUB without the store; XF/YF come from the operand.
    pub(crate) fn cp_a(&mut self, value: u8) {
        let ah = usize::from(self.regs.af) & 0xFF00;
        let res = self.regs.a().wrapping_sub(value);
        let f = self.ft().szhvc_sub[ah | usize::from(res)] & !(YF | XF) | value & (YF | XF);
        self.regs.set_f(f);
    }

    pub(crate) fn daa(&mut self) {
        let a = self.regs.a();
        let f = self.regs.f();
        let mut adjusted = a;
        if f & NF != 0 {
            if f & HF != 0 || a & 0x0F > 9 {
                adjusted = adjusted.wrapping_sub(6);
            }
            if f & CF != 0 || a > 0x99 {
                adjusted = adjusted.wrapping_sub(0x60);
            }
        } else {
            if f & HF != 0 || a & 0x0F > 9 {
                adjusted = adjusted.wrapping_add(6);
            }
            if f & CF != 0 || a > 0x99 {
                adjusted = adjusted.wrapping_add(0x60);
            }
        }
        let new_f = f & (CF | NF)
            | u8::from(a > 0x99)
            | (a ^ adjusted) & HF
            | self.ft().szp[usize::from(adjusted)];
        self.regs.set_f(new_f);
        self.regs.set_a(adjusted);
    }

    // === 16-bit arithmetic ===

    pub(crate) fn add16(&mut self, dst: u16, src: u16) -> u16 {
        let res = u32::from(dst) + u32::from(src);
        self.regs.wz = dst.wrapping_add(1);
        let f = self.regs.f() & (SF | ZF | VF)
            | (((u32::from(dst) ^ res ^ u32::from(src)) >> 8) & u32::from(HF)) as u8
            | ((res >> 16) as u8 & CF)
            | ((res >> 8) as u8 & (YF | XF));
        self.regs.set_f(f);
        res as u16
    }

    pub(crate) fn adc_hl(&mut self, src: u16) {
        let hl = u32::from(self.regs.hl);
        let res = hl + u32::from(src) + u32::from(self.regs.f() & CF);
        self.regs.wz = self.regs.hl.wrapping_add(1);
        let f = (((hl ^ res ^ u32::from(src)) >> 8) & u32::from(HF)) as u8
            | ((res >> 16) as u8 & CF)
            | ((res >> 8) as u8 & (SF | YF | XF))
            | if res & 0xFFFF == 0 { ZF } else { 0 }
            | (((u32::from(src) ^ hl ^ 0x8000) & (u32::from(src) ^ res) & 0x8000) >> 13) as u8;
        self.regs.set_f(f);
        self.regs.hl = res as u16;
    }

    pub(crate) fn sbc_hl(&mut self, src: u16) {
        let hl = u32::from(self.regs.hl);
        let res = hl
            .wrapping_sub(u32::from(src))
            .wrapping_sub(u32::from(self.regs.f() & CF));
        self.regs.wz = self.regs.hl.wrapping_add(1);
        let f = (((hl ^ res ^ u32::from(src)) >> 8) & u32::from(HF)) as u8
            | NF
            | ((res >> 16) as u8 & CF)
            | ((res >> 8) as u8 & (SF | YF | XF))
            | if res & 0xFFFF == 0 { ZF } else { 0 }
            | (((u32::from(src) ^ hl) & (hl ^ res) & 0x8000) >> 13) as u8;
        self.regs.set_f(f);
        self.regs.hl = res as u16;
    }

    // === Accumulator rotates (flags differ from the CB forms) ===

    pub(crate) fn rlca(&mut self) {
        let a = self.regs.a().rotate_left(1);
        self.regs.set_a(a);
        let f = self.regs.f() & (SF | ZF | PF) | a & (YF | XF | CF);
        self.regs.set_f(f);
    }

    pub(crate) fn rrca(&mut self) {
        let a = self.regs.a();
        let mut f = self.regs.f() & (SF | ZF | PF) | a & CF;
        let a = a.rotate_right(1);
        f |= a & (YF | XF);
        self.regs.set_a(a);
        self.regs.set_f(f);
    }

    pub(crate) fn rla(&mut self) {
        let a = self.regs.a();
        let res = a << 1 | self.regs.f() & CF;
        let c = if a & 0x80 != 0 { CF } else { 0 };
        self.regs.set_f(self.regs.f() & (SF | ZF | PF) | c | res & (YF | XF));
        self.regs.set_a(res);
    }

    pub(crate) fn rra(&mut self) {
        let a = self.regs.a();
        let res = a >> 1 | self.regs.f() << 7;
        let c = if a & 0x01 != 0 { CF } else { 0 };
        self.regs.set_f(self.regs.f() & (SF | ZF | PF) | c | res & (YF | XF));
        self.regs.set_a(res);
    }

    // === CB-page rotates and shifts ===

    pub(crate) fn rlc(&mut self, value: u8) -> u8 {
        let c = if value & 0x80 != 0 { CF } else { 0 };
        let res = value.rotate_left(1);
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn rrc(&mut self, value: u8) -> u8 {
        let c = if value & 0x01 != 0 { CF } else { 0 };
        let res = value.rotate_right(1);
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn rl(&mut self, value: u8) -> u8 {
        let c = if value & 0x80 != 0 { CF } else { 0 };
        let res = value << 1 | self.regs.f() & CF;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn rr(&mut self, value: u8) -> u8 {
        let c = if value & 0x01 != 0 { CF } else { 0 };
        let res = value >> 1 | self.regs.f() << 7;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn sla(&mut self, value: u8) -> u8 {
        let c = if value & 0x80 != 0 { CF } else { 0 };
        let res = value << 1;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn sra(&mut self, value: u8) -> u8 {
        let c = if value & 0x01 != 0 { CF } else { 0 };
        let res = value >> 1 | value & 0x80;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    /// Undocumented shift-left-set-one.
    pub(crate) fn sll(&mut self, value: u8) -> u8 {
        let c = if value & 0x80 != 0 { CF } else { 0 };
        let res = value << 1 | 0x01;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    pub(crate) fn srl(&mut self, value: u8) -> u8 {
        let c = if value & 0x01 != 0 { CF } else { 0 };
        let res = value >> 1;
        self.regs.set_f(self.ft().szp[usize::from(res)] | c);
        res
    }

    // === Bit tests ===

    pub(crate) fn bit(&mut self, bit: u8, value: u8) {
        let f = self.regs.f() & CF
            | HF
            | self.ft().sz_bit[usize::from(value & (1 << bit))] & !(YF | XF)
            | value & (YF | XF);
        self.regs.set_f(f);
    }

    /// BIT n,(HL): XF/YF leak from MEMPTR's high byte.
    pub(crate) fn bit_hl(&mut self, bit: u8, value: u8) {
        let f = self.regs.f() & CF
            | HF
            | self.ft().sz_bit[usize::from(value & (1 << bit))] & !(YF | XF)
            | self.regs.wz_h() & (YF | XF);
        self.regs.set_f(f);
    }

    /// BIT n,(IX/IY+d): XF/YF leak from the effective address high byte.
    pub(crate) fn bit_xy(&mut self, bit: u8, value: u8, ea: u16) {
        let f = self.regs.f() & CF
            | HF
            | self.ft().sz_bit[usize::from(value & (1 << bit))] & !(YF | XF)
            | (ea >> 8) as u8 & (YF | XF);
        self.regs.set_f(f);
    }

    // === RRD / RLD ===

    pub(crate) fn rrd(&mut self, sys: &mut S) {
        let hl = self.regs.hl;
        let n = self.rm(sys, hl);
        self.regs.wz = hl.wrapping_add(1);
        let a = self.regs.a();
        self.wm(sys, hl, n >> 4 | a << 4);
        let a = a & 0xF0 | n & 0x0F;
        self.regs.set_a(a);
        let f = self.regs.f() & CF | self.ft().szp[usize::from(a)];
        self.regs.set_f(f);
    }

    pub(crate) fn rld(&mut self, sys: &mut S) {
        let hl = self.regs.hl;
        let n = self.rm(sys, hl);
        self.regs.wz = hl.wrapping_add(1);
        let a = self.regs.a();
        self.wm(sys, hl, n << 4 | a & 0x0F);
        let a = a & 0xF0 | n >> 4;
        self.regs.set_a(a);
        let f = self.regs.f() & CF | self.ft().szp[usize::from(a)];
        self.regs.set_f(f);
    }

    // === Block transfer / search / I-O ===

    pub(crate) fn ldi(&mut self, sys: &mut S) {
        let io = self.rm(sys, self.regs.hl);
        self.wm(sys, self.regs.de, io);
        let mut f = self.regs.f() & (SF | ZF | CF);
        let n = self.regs.a().wrapping_add(io);
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        self.regs.hl = self.regs.hl.wrapping_add(1);
        self.regs.de = self.regs.de.wrapping_add(1);
        self.regs.bc = self.regs.bc.wrapping_sub(1);
        if self.regs.bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    pub(crate) fn ldd(&mut self, sys: &mut S) {
        let io = self.rm(sys, self.regs.hl);
        self.wm(sys, self.regs.de, io);
        let mut f = self.regs.f() & (SF | ZF | CF);
        let n = self.regs.a().wrapping_add(io);
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        self.regs.hl = self.regs.hl.wrapping_sub(1);
        self.regs.de = self.regs.de.wrapping_sub(1);
        self.regs.bc = self.regs.bc.wrapping_sub(1);
        if self.regs.bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    pub(crate) fn cpi(&mut self, sys: &mut S) {
        let val = self.rm(sys, self.regs.hl);
        let mut res = self.regs.a().wrapping_sub(val);
        self.regs.wz = self.regs.wz.wrapping_add(1);
        self.regs.hl = self.regs.hl.wrapping_add(1);
        self.regs.bc = self.regs.bc.wrapping_sub(1);
        let mut f = self.regs.f() & CF
            | self.ft().sz[usize::from(res)] & !(YF | XF)
            | (self.regs.a() ^ val ^ res) & HF
            | NF;
        if f & HF != 0 {
            res = res.wrapping_sub(1);
        }
        if res & 0x02 != 0 {
            f |= YF;
        }
        if res & 0x08 != 0 {
            f |= XF;
        }
        if self.regs.bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    pub(crate) fn cpd(&mut self, sys: &mut S) {
        let val = self.rm(sys, self.regs.hl);
        let mut res = self.regs.a().wrapping_sub(val);
        self.regs.wz = self.regs.wz.wrapping_sub(1);
        self.regs.hl = self.regs.hl.wrapping_sub(1);
        self.regs.bc = self.regs.bc.wrapping_sub(1);
        let mut f = self.regs.f() & CF
            | self.ft().sz[usize::from(res)] & !(YF | XF)
            | (self.regs.a() ^ val ^ res) & HF
            | NF;
        if f & HF != 0 {
            res = res.wrapping_sub(1);
        }
        if res & 0x02 != 0 {
            f |= YF;
        }
        if res & 0x08 != 0 {
            f |= XF;
        }
        if self.regs.bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    pub(crate) fn ini(&mut self, sys: &mut S) {
        let io = self.io_in(sys, self.regs.bc);
        self.regs.wz = self.regs.bc.wrapping_add(1);
        self.regs.set_b(self.regs.b().wrapping_sub(1));
        self.wm(sys, self.regs.hl, io);
        self.regs.hl = self.regs.hl.wrapping_add(1);
        let b = self.regs.b();
        let t = u16::from(self.regs.c().wrapping_add(1)) + u16::from(io);
        let mut f = self.ft().sz[usize::from(b)];
        if io & SF != 0 {
            f |= NF;
        }
        if t & 0x100 != 0 {
            f |= HF | CF;
        }
        f |= self.ft().szp[usize::from((t & 0x07) as u8 ^ b)] & PF;
        self.regs.set_f(f);
    }

    pub(crate) fn ind(&mut self, sys: &mut S) {
        let io = self.io_in(sys, self.regs.bc);
        self.regs.wz = self.regs.bc.wrapping_sub(1);
        self.regs.set_b(self.regs.b().wrapping_sub(1));
        self.wm(sys, self.regs.hl, io);
        self.regs.hl = self.regs.hl.wrapping_sub(1);
        let b = self.regs.b();
        let t = u16::from(self.regs.c().wrapping_sub(1)) + u16::from(io);
        let mut f = self.ft().sz[usize::from(b)];
        if io & SF != 0 {
            f |= NF;
        }
        if t & 0x100 != 0 {
            f |= HF | CF;
        }
        f |= self.ft().szp[usize::from((t & 0x07) as u8 ^ b)] & PF;
        self.regs.set_f(f);
    }

    pub(crate) fn outi(&mut self, sys: &mut S) {
        let io = self.rm(sys, self.regs.hl);
        self.regs.set_b(self.regs.b().wrapping_sub(1));
        self.regs.wz = self.regs.bc.wrapping_add(1);
        self.io_out(sys, self.regs.bc, io);
        self.regs.hl = self.regs.hl.wrapping_add(1);
        let b = self.regs.b();
        let t = u16::from(self.regs.l()) + u16::from(io);
        let mut f = self.ft().sz[usize::from(b)];
        if io & SF != 0 {
            f |= NF;
        }
        if t & 0x100 != 0 {
            f |= HF | CF;
        }
        f |= self.ft().szp[usize::from((t & 0x07) as u8 ^ b)] & PF;
        self.regs.set_f(f);
    }

    pub(crate) fn outd(&mut self, sys: &mut S) {
        let io = self.rm(sys, self.regs.hl);
        self.regs.set_b(self.regs.b().wrapping_sub(1));
        self.regs.wz = self.regs.bc.wrapping_sub(1);
        self.io_out(sys, self.regs.bc, io);
        self.regs.hl = self.regs.hl.wrapping_sub(1);
        let b = self.regs.b();
        let t = u16::from(self.regs.l()) + u16::from(io);
        let mut f = self.ft().sz[usize::from(b)];
        if io & SF != 0 {
            f |= NF;
        }
        if t & 0x100 != 0 {
            f |= HF | CF;
        }
        f |= self.ft().szp[usize::from((t & 0x07) as u8 ^ b)] & PF;
        self.regs.set_f(f);
    }

    // Repeating forms: step once, then back PC up to re-execute while the
    // termination condition holds, charging the repeat penalty.

    pub(crate) fn ldir(&mut self, sys: &mut S) {
        self.ldi(sys);
        if self.regs.bc != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.regs.wz = self.regs.pc.wrapping_add(1);
            self.cc_ex(0xB0);
        }
    }

    pub(crate) fn lddr(&mut self, sys: &mut S) {
        self.ldd(sys);
        if self.regs.bc != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.regs.wz = self.regs.pc.wrapping_add(1);
            self.cc_ex(0xB8);
        }
    }

    pub(crate) fn cpir(&mut self, sys: &mut S) {
        self.cpi(sys);
        if self.regs.bc != 0 && self.regs.f() & ZF == 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.regs.wz = self.regs.pc.wrapping_add(1);
            self.cc_ex(0xB1);
        }
    }

    pub(crate) fn cpdr(&mut self, sys: &mut S) {
        self.cpd(sys);
        if self.regs.bc != 0 && self.regs.f() & ZF == 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.regs.wz = self.regs.pc.wrapping_add(1);
            self.cc_ex(0xB9);
        }
    }

    pub(crate) fn inir(&mut self, sys: &mut S) {
        self.ini(sys);
        if self.regs.b() != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.cc_ex(0xB2);
        }
    }

    pub(crate) fn indr(&mut self, sys: &mut S) {
        self.ind(sys);
        if self.regs.b() != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.cc_ex(0xBA);
        }
    }

    pub(crate) fn otir(&mut self, sys: &mut S) {
        self.outi(sys);
        if self.regs.b() != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.cc_ex(0xB3);
        }
    }

    pub(crate) fn otdr(&mut self, sys: &mut S) {
        self.outd(sys);
        if self.regs.b() != 0 {
            self.regs.pc = self.regs.pc.wrapping_sub(2);
            self.cc_ex(0xBB);
        }
    }

    // === Control flow ===

    pub(crate) fn jp(&mut self, sys: &mut S) {
        self.regs.pc = self.arg16(sys);
        self.regs.wz = self.regs.pc;
    }

    pub(crate) fn jp_cond(&mut self, sys: &mut S, cond: bool) {
        let addr = self.arg16(sys);
        self.regs.wz = addr;
        if cond {
            self.regs.pc = addr;
        }
    }

    pub(crate) fn jr(&mut self, sys: &mut S) {
        let disp = self.arg(sys) as i8;
        self.regs.pc = self.regs.pc.wrapping_add(disp as u16);
        self.regs.wz = self.regs.pc;
    }

    pub(crate) fn jr_cond(&mut self, sys: &mut S, cond: bool, opcode: u8) {
        if cond {
            self.jr(sys);
            self.cc_ex(opcode);
        } else {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    pub(crate) fn call(&mut self, sys: &mut S) {
        let addr = self.arg16(sys);
        self.regs.wz = addr;
        self.push16(sys, self.regs.pc);
        self.regs.pc = addr;
    }

    pub(crate) fn call_cond(&mut self, sys: &mut S, cond: bool, opcode: u8) {
        let addr = self.arg16(sys);
        self.regs.wz = addr;
        if cond {
            self.push16(sys, self.regs.pc);
            self.regs.pc = addr;
            self.cc_ex(opcode);
        }
    }

    pub(crate) fn ret_cond(&mut self, sys: &mut S, cond: bool, opcode: u8) {
        if cond {
            self.regs.pc = self.pop16(sys);
            self.regs.wz = self.regs.pc;
            self.cc_ex(opcode);
        }
    }

    pub(crate) fn retn(&mut self, sys: &mut S) {
        self.regs.pc = self.pop16(sys);
        self.regs.wz = self.regs.pc;
        self.regs.iff1 = self.regs.iff2;
    }

    pub(crate) fn reti(&mut self, sys: &mut S) {
        self.regs.pc = self.pop16(sys);
        self.regs.wz = self.regs.pc;
        self.regs.iff1 = self.regs.iff2;
    }

    pub(crate) fn rst(&mut self, sys: &mut S, addr: u16) {
        self.push16(sys, self.regs.pc);
        self.regs.pc = addr;
        self.regs.wz = self.regs.pc;
    }

    // === Exchanges ===

    pub(crate) fn ex_af(&mut self) {
        core::mem::swap(&mut self.regs.af, &mut self.regs.af2);
    }

    pub(crate) fn ex_de_hl(&mut self) {
        core::mem::swap(&mut self.regs.de, &mut self.regs.hl);
    }

    pub(crate) fn exx(&mut self) {
        core::mem::swap(&mut self.regs.bc, &mut self.regs.bc2);
        core::mem::swap(&mut self.regs.de, &mut self.regs.de2);
        core::mem::swap(&mut self.regs.hl, &mut self.regs.hl2);
    }

    /// EX (SP),rr — returns the new register value.
    pub(crate) fn ex_sp(&mut self, sys: &mut S, value: u16) -> u16 {
        let sp = self.regs.sp;
        let mem = self.rm16(sys, sp);
        self.wm16(sys, sp, value);
        self.regs.wz = mem;
        mem
    }

    // === Interrupt registers ===

    pub(crate) fn ld_a_i(&mut self) {
        let i = self.regs.i;
        self.regs.set_a(i);
        let f = self.regs.f() & CF | self.ft().sz[usize::from(i)] | u8::from(self.regs.iff2) << 2;
        self.regs.set_f(f);
        self.set_after_ldair();
    }

    pub(crate) fn ld_i_a(&mut self) {
        self.regs.i = self.regs.a();
    }

    pub(crate) fn ld_a_r(&mut self) {
        let r = self.regs.refresh();
        self.regs.set_a(r);
        let f = self.regs.f() & CF | self.ft().sz[usize::from(r)] | u8::from(self.regs.iff2) << 2;
        self.regs.set_f(f);
        self.set_after_ldair();
    }

    pub(crate) fn ld_r_a(&mut self) {
        let a = self.regs.a();
        self.regs.r = a;
        self.regs.r2 = a & 0x80;
    }

    pub(crate) fn ei(&mut self) {
        self.regs.iff1 = true;
        self.regs.iff2 = true;
        self.set_after_ei();
    }
}
