//! Bus construction and the cross-CPU register callbacks.

#![allow(clippy::cast_possible_truncation)]

use cpu_z80::Z80;
use emu_core::{BufferId, BusWidth, MapChunk, MemoryMap, MAP_CODE, MAP_READ, MAP_WRITE};

use crate::{next_vint_pulse, Z80_DIVIDER};

/// Width of the Z80 interrupt pulse in master cycles (about one scanline).
pub(crate) const Z80_INT_PULSE_MCLKS: u32 = 3_420;

/// Everything the 68k's map callbacks can reach: the Z80 and its bus.
pub struct MainBus {
    pub z80: Z80<SoundBus>,
    pub sound: SoundBus,
    /// Z80 RAM buffer id inside the Z80's map, for the 0xA00000 window.
    z80_ram: BufferId,
}

/// State on the Z80 side of the fence.
pub struct SoundBus {
    /// 9-bit bank register: which 32 KiB of 68k space the window shows.
    pub bank: u32,
    /// Cartridge image for the banked window.
    rom: Box<[u8]>,
    /// Start of the next vertical interrupt pulse, in master cycles.
    pub next_vint: u32,
}

/// Build both memory maps and the bus structs around a cartridge image.
pub(crate) fn build(rom: Vec<u8>) -> (MemoryMap<MainBus>, MainBus) {
    // --- Z80 side ---
    let mut z80_map: MemoryMap<SoundBus> = MemoryMap::new(BusWidth::Eight, 0xFFFF);
    let z80_ram = z80_map.add_ram(0x2000);
    z80_map.set_chunks(vec![
        MapChunk::buffer(0x0000, 0x3FFF, MAP_READ | MAP_WRITE | MAP_CODE, z80_ram)
            .with_mask(0x1FFF),
        // YM2612: another tier; reads float high.
        MapChunk::funcs(0x4000, 0x5FFF, 0, ym_read16, ym_write16, ym_read8, ym_write8),
        MapChunk::funcs(
            0x6000,
            0x60FF,
            0,
            bank_read16,
            bank_write16,
            bank_read8,
            bank_write8,
        ),
        MapChunk::funcs(
            0x8000,
            0xFFFF,
            0,
            window_read16,
            window_write16,
            window_read8,
            window_write8,
        ),
    ]);
    let sound = SoundBus {
        bank: 0,
        rom: rom.clone().into_boxed_slice(),
        next_vint: 0,
    };
    let mut z80 = Z80::new(z80_map, Z80::<SoundBus>::open_io(), Z80_DIVIDER);
    z80.set_next_int_pulse(next_vint_pulse);

    // --- 68k side ---
    let mut m68k_map: MemoryMap<MainBus> = MemoryMap::new(BusWidth::Sixteen, 0x00FF_FFFF);
    let rom_end = (rom.len() as u32).next_power_of_two().max(0x1_0000) - 1;
    let cart = m68k_map.add_buffer(rom);
    let work_ram = m68k_map.add_ram(0x1_0000);
    m68k_map.set_chunks(vec![
        MapChunk::buffer(0x000000, rom_end.min(0x3F_FFFF), MAP_READ | MAP_CODE, cart),
        MapChunk::funcs(
            0xA00000,
            0xA0FFFF,
            0,
            z80_win_read16,
            z80_win_write16,
            z80_win_read8,
            z80_win_write8,
        ),
        MapChunk::funcs(
            0xA11100,
            0xA111FF,
            0,
            busreq_read16,
            busreq_write16,
            busreq_read8,
            busreq_write8,
        ),
        MapChunk::funcs(
            0xA11200,
            0xA112FF,
            0,
            reset_read16,
            reset_write16,
            reset_read8,
            reset_write8,
        ),
        MapChunk::buffer(0xE00000, 0xFFFFFF, MAP_READ | MAP_WRITE | MAP_CODE, work_ram)
            .with_mask(0xFFFF),
    ]);

    let bus = MainBus {
        z80,
        sound,
        z80_ram,
    };
    (m68k_map, bus)
}

// === Z80-side callbacks ===

fn ym_read8(_sound: &mut SoundBus, _addr: u32, _cycle: u32) -> u8 {
    0xFF
}

fn ym_read16(sound: &mut SoundBus, addr: u32, cycle: u32) -> u16 {
    u16::from(ym_read8(sound, addr, cycle)) * 0x0101
}

fn ym_write8(_sound: &mut SoundBus, _addr: u32, _value: u8, _cycle: u32) {}

fn ym_write16(_sound: &mut SoundBus, _addr: u32, _value: u16, _cycle: u32) {}

fn bank_read8(_sound: &mut SoundBus, _addr: u32, _cycle: u32) -> u8 {
    0xFF
}

fn bank_read16(_sound: &mut SoundBus, _addr: u32, _cycle: u32) -> u16 {
    0xFFFF
}

/// Each write shifts one bit into the 9-bit bank register.
fn bank_write8(sound: &mut SoundBus, _addr: u32, value: u8, _cycle: u32) {
    sound.bank = (sound.bank >> 1 | u32::from(value & 1) << 8) & 0x1FF;
}

fn bank_write16(sound: &mut SoundBus, addr: u32, value: u16, cycle: u32) {
    bank_write8(sound, addr, value as u8, cycle);
}

/// The movable window shows `bank * 32 KiB` of 68k space. Only the
/// cartridge region is reachable from this tier.
fn window_read8(sound: &mut SoundBus, addr: u32, _cycle: u32) -> u8 {
    let main_addr = (sound.bank << 15 | addr & 0x7FFF) as usize;
    sound.rom.get(main_addr).copied().unwrap_or(0xFF)
}

fn window_read16(sound: &mut SoundBus, addr: u32, cycle: u32) -> u16 {
    u16::from(window_read8(sound, addr, cycle)) * 0x0101
}

fn window_write8(_sound: &mut SoundBus, addr: u32, _value: u8, _cycle: u32) {
    log::warn!("Z80 write into the banked window at ${addr:04x} dropped (ROM)");
}

fn window_write16(sound: &mut SoundBus, addr: u32, value: u16, cycle: u32) {
    window_write8(sound, addr, value as u8, cycle);
}

// === 68k-side callbacks ===

/// Z80 address window: valid only while the 68k holds the bus.
fn z80_win_read8(bus: &mut MainBus, addr: u32, cycle: u32) -> u8 {
    if !bus.z80.busack(&mut bus.sound, cycle) {
        return 0xFF;
    }
    let z80_addr = addr & 0x7FFF;
    if z80_addr < 0x4000 {
        bus.z80.map().buffer(bus.z80_ram)[(z80_addr & 0x1FFF) as usize]
    } else {
        0xFF
    }
}

fn z80_win_read16(bus: &mut MainBus, addr: u32, cycle: u32) -> u16 {
    // The Z80 bus is eight bits wide; both lanes carry the same byte.
    u16::from(z80_win_read8(bus, addr, cycle)) * 0x0101
}

fn z80_win_write8(bus: &mut MainBus, addr: u32, value: u8, cycle: u32) {
    if !bus.z80.busack(&mut bus.sound, cycle) {
        return;
    }
    let z80_addr = addr & 0x7FFF;
    if z80_addr < 0x4000 {
        bus.z80.map().buffer_mut(bus.z80_ram)[(z80_addr & 0x1FFF) as usize] = value;
    }
}

fn z80_win_write16(bus: &mut MainBus, addr: u32, value: u16, cycle: u32) {
    // Even addresses drive the high byte onto the 8-bit bus.
    z80_win_write8(bus, addr, (value >> 8) as u8, cycle);
}

fn busreq_read16(bus: &mut MainBus, _addr: u32, cycle: u32) -> u16 {
    let granted = bus.z80.busack(&mut bus.sound, cycle);
    if granted {
        0x0000
    } else {
        0x0100
    }
}

fn busreq_read8(bus: &mut MainBus, addr: u32, cycle: u32) -> u8 {
    let word = busreq_read16(bus, addr & !1, cycle);
    if addr & 1 != 0 {
        word as u8
    } else {
        (word >> 8) as u8
    }
}

fn busreq_write16(bus: &mut MainBus, _addr: u32, value: u16, cycle: u32) {
    if value & 0x0100 != 0 {
        bus.z80.assert_busreq(cycle);
    } else {
        bus.z80.clear_busreq(cycle);
    }
}

fn busreq_write8(bus: &mut MainBus, addr: u32, value: u8, cycle: u32) {
    if addr & 1 == 0 {
        busreq_write16(bus, addr, u16::from(value) << 8, cycle);
    }
}

fn reset_read16(_bus: &mut MainBus, _addr: u32, _cycle: u32) -> u16 {
    0xFFFF
}

fn reset_read8(_bus: &mut MainBus, _addr: u32, _cycle: u32) -> u8 {
    0xFF
}

/// Bit 8 high releases the Z80 reset line; low holds it. The Z80 is caught
/// up to the 68k's cycle before the edge lands.
fn reset_write16(bus: &mut MainBus, _addr: u32, value: u16, cycle: u32) {
    if value & 0x0100 != 0 {
        bus.z80.clear_reset(&mut bus.sound, cycle);
    } else {
        bus.z80.assert_reset(&mut bus.sound, cycle);
    }
}

fn reset_write8(bus: &mut MainBus, addr: u32, value: u8, cycle: u32) {
    if addr & 1 == 0 {
        reset_write16(bus, addr, u16::from(value) << 8, cycle);
    }
}
