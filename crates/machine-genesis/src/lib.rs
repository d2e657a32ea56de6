//! Mega Drive CPU tier: the 68000 main bus and the Z80 sound bus, joined by
//! the bus-request handshake.
//!
//! The 68k sees cartridge ROM at the bottom of its space, 64 KiB of work
//! RAM mirrored through the top, the Z80's address space at `0xA00000`
//! (valid only while holding the bus), and the arbitration registers at
//! `0xA11100` (busreq) and `0xA11200` (Z80 reset). The Z80 sees its 8 KiB
//! of RAM mirrored below `0x4000`, the bank register at `0x6000`, and a
//! 32 KiB movable window into 68k space at `0x8000`.
//!
//! Video, audio chips and controllers are other tiers; their regions fall
//! through to the map defaults here.

mod bus;

pub use bus::{MainBus, SoundBus};

use cpu_m68k::{CpuVariant, M68k};
use cpu_z80::IntPulse;
use emu_core::CYCLE_NEVER;

/// Master-clock divider feeding the 68000.
pub const M68K_DIVIDER: u32 = 7;
/// Master-clock divider feeding the Z80.
pub const Z80_DIVIDER: u32 = 15;

/// One NTSC frame in master-clock cycles.
pub const MCLKS_PER_FRAME: u32 = 3_420 * 262;

/// The two CPUs and their shared wiring.
pub struct Genesis {
    pub m68k: M68k<MainBus>,
    pub bus: MainBus,
}

impl Genesis {
    /// Build the machine around a cartridge image.
    #[must_use]
    pub fn new(rom: Vec<u8>) -> Self {
        let (m68k_map, bus) = bus::build(rom);
        let m68k = M68k::new(m68k_map, CpuVariant::M68000, M68K_DIVIDER);
        Self { m68k, bus }
    }

    /// Load the reset vectors and bring both CPUs to their power-on state.
    /// The Z80 starts with its reset line held, as on hardware.
    pub fn power_on(&mut self) {
        self.m68k.reset(&mut self.bus);
        self.bus.z80.assert_reset(&mut self.bus.sound, 0);
    }

    /// Advance both CPUs to `cycle` (master-clock units), 68k first.
    pub fn run_to(&mut self, cycle: u32) {
        self.m68k.run(&mut self.bus, cycle);
        self.bus.z80.run(&mut self.bus.sound, cycle);
    }

    /// Deliver a VDP interrupt level to the 68k (4 = horizontal,
    /// 6 = vertical).
    pub fn vdp_interrupt(&mut self, level: u8) {
        self.m68k.interrupt(level);
    }

    /// Rebase every cycle latch after trimming `deduction` master cycles,
    /// keeping the counters clear of 32-bit wraparound.
    pub fn adjust_cycles(&mut self, deduction: u32) {
        self.m68k.adjust_cycles(deduction);
        self.bus.z80.adjust_cycles(deduction);
        let pulse = &mut self.bus.sound.next_vint;
        if *pulse != CYCLE_NEVER {
            *pulse = pulse.saturating_sub(deduction);
        }
    }
}

/// Fixed-period vertical-interrupt pulses for the Z80, standing in for the
/// VDP's timing output.
pub(crate) fn next_vint_pulse(sound: &mut SoundBus) -> IntPulse {
    let start = sound.next_vint;
    sound.next_vint = start.wrapping_add(MCLKS_PER_FRAME);
    IntPulse {
        start,
        end: start.wrapping_add(bus::Z80_INT_PULSE_MCLKS),
    }
}
