//! Shifts and rotates (0xE), including the 68020 bit-field block.
//!
//! Register forms take the count from the opcode (1-8) or a data register
//! (mod 64) and cost two extra cycles per bit; memory forms shift one bit
//! on a word operand.

#![allow(clippy::cast_possible_truncation)]

use crate::cpu::M68k;
use crate::ea::{Operand, Size};
use crate::flags::{SR_C, SR_N, SR_V, SR_X, SR_Z};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Arith,
    Logical,
    RotateX,
    Rotate,
}

impl ShiftKind {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Arith,
            1 => Self::Logical,
            2 => Self::RotateX,
            _ => Self::Rotate,
        }
    }
}

impl<S> M68k<S> {
    pub(crate) fn exec_shift_group(&mut self, sys: &mut S, op: u16) {
        if op & 0x08C0 == 0x08C0 {
            return self.exec_bitfield(sys, op);
        }
        let left = op & 0x0100 != 0;

        if op >> 6 & 3 == 3 {
            // Memory form: one-bit shift of a word.
            let kind = ShiftKind::from_bits(op >> 9);
            let mode = (op >> 3 & 7) as u8;
            let reg = (op & 7) as u8;
            let Some(dst) = self.resolve(sys, mode, reg, Size::Word) else {
                return self.exception_illegal(sys);
            };
            if matches!(dst, Operand::DataReg(_) | Operand::AddrReg(_) | Operand::Imm(_)) {
                return self.exception_illegal(sys);
            }
            let value = self.read_operand(sys, dst, Size::Word);
            let result = self.shift(kind, left, Size::Word, value, 1);
            return self.write_operand(sys, dst, Size::Word, result);
        }

        let Some(size) = Size::from_bits(op >> 6) else {
            return self.exception_illegal(sys);
        };
        let kind = ShiftKind::from_bits(op >> 3);
        let reg = usize::from(op & 7);
        let count = if op & 0x0020 != 0 {
            self.regs.d[usize::from(op >> 9 & 7)] & 63
        } else {
            match op >> 9 & 7 {
                0 => 8,
                n => u32::from(n),
            }
        };
        let value = self.regs.d[reg] & size.mask();
        let result = self.shift(kind, left, size, value, count);
        self.regs.d[reg] = self.regs.d[reg] & !size.mask() | result & size.mask();
        let shift_scale = self.cyc_shift;
        self.charge(count << shift_scale);
    }

    /// Perform the shift and set XNZVC. Returns the masked result.
    fn shift(&mut self, kind: ShiftKind, left: bool, size: Size, value: u32, count: u32) -> u32 {
        let bits = size.bytes() * 8;
        let msb = size.msb();
        let mask = size.mask();
        let mut sr = self.regs.sr & !(SR_N | SR_Z | SR_V | SR_C);

        let result;
        match kind {
            ShiftKind::Arith if left => {
                // V is set when the sign changes at any point.
                result = if count >= bits {
                    0
                } else {
                    value << count & mask
                };
                if count > 0 {
                    let carry = if count <= bits {
                        value >> (bits - count) & 1
                    } else {
                        0
                    };
                    sr = sr & !SR_X | if carry != 0 { SR_X | SR_C } else { 0 };
                    if count >= bits {
                        if value != 0 {
                            sr |= SR_V;
                        }
                    } else {
                        let sign_window = mask << (bits - count - 1) & mask;
                        let window = value & sign_window;
                        if window != 0 && window != sign_window {
                            sr |= SR_V;
                        }
                    }
                }
            }
            ShiftKind::Arith => {
                let signed = size.sign_extend(value) as i32;
                result = if count >= bits {
                    (signed >> 31) as u32 & mask
                } else {
                    (signed >> count) as u32 & mask
                };
                if count > 0 {
                    let carry = if count > bits {
                        (signed >> 31) as u32 & 1
                    } else {
                        (signed >> (count - 1)) as u32 & 1
                    };
                    sr = sr & !SR_X | if carry != 0 { SR_X | SR_C } else { 0 };
                }
            }
            ShiftKind::Logical => {
                if count == 0 {
                    result = value;
                } else if count > bits {
                    result = 0;
                    sr &= !SR_X;
                } else {
                    let (res, carry) = if left {
                        (
                            if count == bits { 0 } else { value << count & mask },
                            value >> (bits - count) & 1,
                        )
                    } else {
                        (
                            if count == bits { 0 } else { value >> count },
                            value >> (count - 1) & 1,
                        )
                    };
                    result = res;
                    sr = sr & !SR_X | if carry != 0 { SR_X | SR_C } else { 0 };
                }
            }
            ShiftKind::Rotate => {
                let count_mod = count % bits;
                result = if count == 0 {
                    value
                } else if left {
                    (value << count_mod | value >> (bits - count_mod) % bits) & mask
                } else {
                    (value >> count_mod | value << (bits - count_mod) % bits) & mask
                };
                if count > 0 {
                    let carry = if left {
                        result & 1 != 0
                    } else {
                        result & msb != 0
                    };
                    if carry {
                        sr |= SR_C;
                    }
                }
            }
            ShiftKind::RotateX => {
                // Rotate through X: an effective width of bits+1.
                let mut acc = value;
                let mut x = self.regs.sr & SR_X != 0;
                let steps = count % (bits + 1);
                for _ in 0..steps {
                    if left {
                        let out = acc & msb != 0;
                        acc = acc << 1 & mask | u32::from(x);
                        x = out;
                    } else {
                        let out = acc & 1 != 0;
                        acc = acc >> 1 | u32::from(x) << (bits - 1);
                        x = out;
                    }
                }
                result = acc & mask;
                sr = sr & !SR_X | if x { SR_X } else { 0 };
                if x {
                    sr |= SR_C;
                }
            }
        }

        if result & msb != 0 {
            sr |= SR_N;
        }
        if result & mask == 0 {
            sr |= SR_Z;
        }
        self.regs.sr = sr;
        result & mask
    }

    // === Bit fields (68020+) ===
    //
    // Fields are up to 32 bits wide at an arbitrary bit offset. Register
    // operands wrap modulo 32; memory operands are byte-addressed with a
    // signed bit offset.

    fn exec_bitfield(&mut self, sys: &mut S, op: u16) {
        if !self.variant().is_020_or_later() {
            return self.exception_illegal(sys);
        }
        let ext = self.read_imm_16(sys);
        let mode = (op >> 3 & 7) as u8;
        let reg = (op & 7) as u8;
        let kind = op >> 9 & 7;

        let offset: i32 = if ext & 0x0800 != 0 {
            self.regs.d[usize::from(ext >> 6 & 7)] as i32
        } else {
            i32::from(ext >> 6 & 31)
        };
        let width = if ext & 0x0020 != 0 {
            self.regs.d[usize::from(ext & 7)] & 31
        } else {
            u32::from(ext & 31)
        };
        let width = if width == 0 { 32 } else { width };
        let data_reg = usize::from(ext >> 12 & 7);

        let (field, writeback) = if mode == 0 {
            let value = self.regs.d[usize::from(reg)];
            let rotated = value.rotate_left(offset.rem_euclid(32) as u32);
            let field = if width == 32 {
                rotated
            } else {
                rotated >> (32 - width)
            };
            (field, None)
        } else {
            let Some(Operand::Mem(base)) = self.resolve(sys, mode, reg, Size::Byte) else {
                return self.exception_illegal(sys);
            };
            let addr = base.wrapping_add((offset >> 3) as u32);
            let bit = (offset & 7) as u32;
            // A 40-bit window covers any 32-bit field at any bit offset.
            let mut window: u64 = 0;
            for i in 0..5 {
                window = window << 8 | u64::from(self.read_8(sys, addr.wrapping_add(i)));
            }
            let field = (window >> (40 - bit - width)) as u32
                & if width == 32 { u32::MAX } else { (1 << width) - 1 };
            (field, Some((addr, bit, window)))
        };

        let msb_set = field >> (width - 1) & 1 != 0;
        let mut sr = self.regs.sr & !(SR_N | SR_Z | SR_V | SR_C);
        if msb_set {
            sr |= SR_N;
        }
        if field == 0 {
            sr |= SR_Z;
        }
        self.regs.sr = sr;

        let field_mask: u32 = if width == 32 { u32::MAX } else { (1 << width) - 1 };
        let new_field = match kind {
            0 | 1 | 5 => None,                       // BFTST/BFEXTU/BFFFO
            2 => Some(!field & field_mask),          // BFCHG
            3 => None,                               // BFEXTS
            4 => Some(0),                            // BFCLR
            6 => Some(field_mask),                   // BFSET
            _ => Some(self.regs.d[data_reg] & field_mask), // BFINS
        };

        match kind {
            1 => self.regs.d[data_reg] = field,
            3 => {
                let extended = if msb_set {
                    field | !field_mask
                } else {
                    field
                };
                self.regs.d[data_reg] = extended;
            }
            5 => {
                // BFFFO: offset of the first set bit within the field.
                let mut scan = offset as u32;
                let mut probe = width;
                let mut f = field;
                while probe > 0 && f & 1 << (probe - 1) == 0 {
                    probe -= 1;
                    scan = scan.wrapping_add(1);
                }
                self.regs.d[data_reg] = scan;
            }
            7 => {
                // BFINS sets flags from the inserted value.
                let inserted = self.regs.d[data_reg] & field_mask;
                let mut sr = self.regs.sr & !(SR_N | SR_Z);
                if inserted >> (width - 1) & 1 != 0 {
                    sr |= SR_N;
                }
                if inserted == 0 {
                    sr |= SR_Z;
                }
                self.regs.sr = sr;
            }
            _ => {}
        }

        if let Some(value) = new_field {
            match writeback {
                None => {
                    let r = usize::from(reg);
                    let rot = offset.rem_euclid(32) as u32;
                    let rotated_mask = if width == 32 {
                        u32::MAX
                    } else {
                        field_mask << (32 - width)
                    };
                    let current = self.regs.d[r].rotate_left(rot);
                    let merged = current & !rotated_mask
                        | (if width == 32 { value } else { value << (32 - width) });
                    self.regs.d[r] = merged.rotate_right(rot);
                }
                Some((addr, bit, window)) => {
                    let shift = 40 - bit - width;
                    let window_mask = u64::from(field_mask) << shift;
                    let merged = window & !window_mask | u64::from(value) << shift;
                    for i in 0..5 {
                        let byte = (merged >> (32 - i * 8)) as u8;
                        self.write_8(sys, addr.wrapping_add(i as u32), byte);
                    }
                }
            }
        }
    }
}
