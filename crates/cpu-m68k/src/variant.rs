//! CPU variant selection.
//!
//! The variant chooses opcode availability, the legal-SR mask, the address
//! bus width, the stack-frame format and the exception cycle table.

use serde::{Deserialize, Serialize};

/// Which member of the 68000 family an instance emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuVariant {
    M68000,
    M68008,
    M68010,
    M68Ec020,
    M68020,
    M68Ec030,
    M68030,
    M68Ec040,
    M68040,
    Cpu32,
    ColdFire,
}

impl CpuVariant {
    /// 24-bit address space (everything else decodes full 32 bits).
    #[must_use]
    pub const fn address_mask(self) -> u32 {
        match self {
            Self::M68000 | Self::M68008 | Self::M68010 | Self::M68Ec020 => 0x00FF_FFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    /// Legal Status Register bits.
    #[must_use]
    pub const fn sr_mask(self) -> u16 {
        match self {
            // T1 -- S  -- -- I2 I1 I0 -- -- -- X  N  Z  V  C
            Self::M68000 | Self::M68008 | Self::M68010 | Self::Cpu32 | Self::ColdFire => 0xA71F,
            // T1 T0 S  M  -- I2 I1 I0 -- -- -- X  N  Z  V  C
            _ => 0xF71F,
        }
    }

    #[must_use]
    pub const fn is_010_or_later(self) -> bool {
        !matches!(self, Self::M68000 | Self::M68008)
    }

    #[must_use]
    pub const fn is_020_or_later(self) -> bool {
        matches!(
            self,
            Self::M68Ec020
                | Self::M68020
                | Self::M68Ec030
                | Self::M68030
                | Self::M68Ec040
                | Self::M68040
                | Self::Cpu32
        )
    }

    #[must_use]
    pub const fn is_040_or_later(self) -> bool {
        matches!(self, Self::M68Ec040 | Self::M68040)
    }

    /// Plain 68000-class part (3-word exception frames, no format word).
    #[must_use]
    pub const fn is_000(self) -> bool {
        matches!(self, Self::M68000 | Self::M68008)
    }

    /// Row in the exception cycle table.
    #[must_use]
    pub const fn exception_class(self) -> usize {
        match self {
            Self::M68000 | Self::M68008 => 0,
            Self::M68010 => 1,
            Self::M68Ec020 | Self::M68020 => 2,
            Self::M68Ec030 | Self::M68030 => 3,
            Self::M68Ec040 | Self::M68040 => 4,
            Self::Cpu32 => 5,
            Self::ColdFire => 6,
        }
    }
}
