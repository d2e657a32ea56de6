//! Z80 register set.
//!
//! Pairs are stored as 16-bit words with the documented little-endian byte
//! split: the high half of AF is A, the low half is F, and so on. R keeps
//! its bit 7 in `r2` across refresh increments, as on real silicon.

#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

macro_rules! pair_halves {
    ($pair:ident, $hi:ident, $set_hi:ident, $lo:ident, $set_lo:ident) => {
        #[must_use]
        #[inline]
        pub const fn $hi(&self) -> u8 {
            (self.$pair >> 8) as u8
        }

        #[inline]
        pub fn $set_hi(&mut self, value: u8) {
            self.$pair = self.$pair & 0x00FF | u16::from(value) << 8;
        }

        #[must_use]
        #[inline]
        pub const fn $lo(&self) -> u8 {
            self.$pair as u8
        }

        #[inline]
        pub fn $set_lo(&mut self, value: u8) {
            self.$pair = self.$pair & 0xFF00 | u16::from(value);
        }
    };
}

/// Z80 architectural registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub ix: u16,
    pub iy: u16,
    /// Internal MEMPTR register; observable through BIT n,(HL) flags.
    pub wz: u16,

    // Alternate set
    pub af2: u16,
    pub bc2: u16,
    pub de2: u16,
    pub hl2: u16,

    pub sp: u16,
    pub pc: u16,
    /// PC at the start of the current instruction.
    pub prvpc: u16,

    pub i: u8,
    /// Refresh register, low 7 bits live.
    pub r: u8,
    /// Preserved bit 7 of R (set only by LD R,A).
    pub r2: u8,
    /// Interrupt mode: 0, 1 or 2.
    pub im: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub halt: bool,
}

impl Registers {
    pair_halves!(af, a, set_a, f, set_f);
    pair_halves!(bc, b, set_b, c, set_c);
    pair_halves!(de, d, set_d, e, set_e);
    pair_halves!(hl, h, set_h, l, set_l);
    pair_halves!(ix, ixh, set_ixh, ixl, set_ixl);
    pair_halves!(iy, iyh, set_iyh, iyl, set_iyl);
    pair_halves!(wz, wz_h, set_wz_h, wz_l, set_wz_l);

    /// Value of R as software observes it.
    #[must_use]
    pub const fn refresh(&self) -> u8 {
        self.r & 0x7F | self.r2 & 0x80
    }
}
