//! Cross-CPU tests: bus-request handshake, reset propagation, the Z80 RAM
//! window and the bank register.

use machine_genesis::Genesis;

/// A cartridge whose 68k program only spins.
fn spin_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x10000];
    // Vectors: SSP=0xFF8000 (work RAM), PC=0x000200
    rom[0..4].copy_from_slice(&[0x00, 0xFF, 0x80, 0x00]);
    rom[4..8].copy_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    // 0x200: BRA.S -2 (tight loop)
    rom[0x200] = 0x60;
    rom[0x201] = 0xFE;
    rom
}

fn poke_z80(genesis: &mut Genesis, addr: u16, value: u8) {
    let bus = &mut genesis.bus;
    bus.z80
        .map()
        .write_8(&mut bus.sound, u32::from(addr), value, 0);
}

/// Fill Z80 RAM with a program while the reset line holds, then release.
fn start_z80(genesis: &mut Genesis, program: &[u8]) {
    for (i, &b) in program.iter().enumerate() {
        poke_z80(genesis, i as u16, b);
    }
    let cycle = genesis.m68k.current_cycle;
    let bus = &mut genesis.bus;
    bus.z80.clear_reset(&mut bus.sound, cycle);
}

#[test]
fn busreq_handshake_freezes_the_z80() {
    let mut genesis = Genesis::new(spin_rom());
    genesis.power_on();
    // Z80 program: INC A; JP 0x0001 — writes nothing, runs forever.
    start_z80(&mut genesis, &[0x3C, 0xC3, 0x00, 0x00]);

    genesis.run_to(1000);
    let a_before = genesis.bus.z80.regs.a();

    // 68k asserts busreq at cycle 1000.
    genesis.bus.z80.assert_busreq(1000);
    genesis.bus.z80.run(&mut genesis.bus.sound, 2000);

    assert!(genesis.bus.z80.busack(&mut genesis.bus.sound, 2000));
    assert_eq!(genesis.bus.z80.current_cycle, 2000);
    // At most the instruction in flight completed after the request.
    let a_after = genesis.bus.z80.regs.a();
    assert!(a_after.wrapping_sub(a_before) <= 1);

    // Frozen: more time passes, no more execution.
    genesis.bus.z80.run(&mut genesis.bus.sound, 4000);
    assert_eq!(genesis.bus.z80.regs.a(), a_after);
    assert_eq!(genesis.bus.z80.current_cycle, 4000);

    // Release: execution resumes.
    genesis.bus.z80.clear_busreq(4000);
    genesis.run_to(8000);
    assert!(genesis.bus.z80.regs.a() != a_after);
}

#[test]
fn z80_window_requires_busack() {
    let mut genesis = Genesis::new(spin_rom());
    genesis.power_on();
    start_z80(&mut genesis, &[0xC3, 0x00, 0x00]); // JP 0x0000
    genesis.run_to(500);

    // Without busack the window floats high.
    let cycle = genesis.m68k.current_cycle;
    let floating = genesis
        .m68k
        .map()
        .read_8(&mut genesis.bus, 0xA00000, cycle);
    assert_eq!(floating, 0xFF);

    // With the bus granted, the 68k sees Z80 RAM.
    genesis.bus.z80.assert_busreq(cycle);
    let granted = genesis.bus.z80.busack(&mut genesis.bus.sound, cycle + 200);
    assert!(granted);
    let cycle = cycle + 200;
    genesis
        .m68k
        .map()
        .write_8(&mut genesis.bus, 0xA01FF0, 0x5A, cycle);
    let read_back = genesis
        .m68k
        .map()
        .read_8(&mut genesis.bus, 0xA01FF0, cycle);
    assert_eq!(read_back, 0x5A);
}

#[test]
fn reset_register_propagates_with_cycle() {
    let mut genesis = Genesis::new(spin_rom());
    genesis.power_on();
    start_z80(&mut genesis, &[0x3C, 0xC3, 0x00, 0x00]);
    genesis.run_to(3000);
    assert!(genesis.bus.z80.regs.pc != 0 || genesis.bus.z80.regs.a() != 0);

    // 68k holds the Z80 reset line low through the register.
    let cycle = genesis.m68k.current_cycle;
    genesis
        .m68k
        .map()
        .write_16(&mut genesis.bus, 0xA11200, 0x0000, cycle);
    genesis
        .m68k
        .map()
        .write_16(&mut genesis.bus, 0xA11200, 0x0100, cycle + 100);
    assert_eq!(genesis.bus.z80.regs.pc, 0);
    assert_eq!(genesis.bus.z80.regs.i, 0);
    assert!(!genesis.bus.z80.regs.iff1);
}

#[test]
fn busreq_register_reflects_the_grant() {
    let mut genesis = Genesis::new(spin_rom());
    genesis.power_on();
    start_z80(&mut genesis, &[0xC3, 0x00, 0x00]);
    genesis.run_to(100);

    let cycle = genesis.m68k.current_cycle;
    let busy = genesis
        .m68k
        .map()
        .read_16(&mut genesis.bus, 0xA11100, cycle);
    assert_eq!(busy & 0x0100, 0x0100, "not granted while running");

    genesis
        .m68k
        .map()
        .write_16(&mut genesis.bus, 0xA11100, 0x0100, cycle);
    let granted = genesis
        .m68k
        .map()
        .read_16(&mut genesis.bus, 0xA11100, cycle + 100);
    assert_eq!(granted & 0x0100, 0, "grant reads as zero");
}

#[test]
fn bank_register_selects_the_window() {
    let mut rom = spin_rom();
    rom[0x8000] = 0xAA; // bank 1, window offset 0
    let mut genesis = Genesis::new(rom);
    genesis.power_on();
    // Z80: nine writes shift 0x001 into the bank register (LSB first),
    // then LD A,(0x8000); HALT.
    let mut program = vec![
        0x3E, 0x01, // LD A,1
        0x32, 0x00, 0x60, // LD (0x6000),A
    ];
    for _ in 0..8 {
        program.extend_from_slice(&[0x3E, 0x00, 0x32, 0x00, 0x60]);
    }
    program.extend_from_slice(&[0x3A, 0x00, 0x80, 0x76]); // LD A,(0x8000); HALT
    start_z80(&mut genesis, &program);

    genesis.run_to(20_000);
    assert!(genesis.bus.z80.regs.halt);
    assert_eq!(genesis.bus.sound.bank, 1);
    assert_eq!(genesis.bus.z80.regs.a(), 0xAA);
}

#[test]
fn machine_adjust_cycles_rebases_both_cpus() {
    let mut genesis = Genesis::new(spin_rom());
    genesis.power_on();
    start_z80(&mut genesis, &[0xC3, 0x00, 0x00]);
    genesis.run_to(10_000);
    genesis.adjust_cycles(8_000);
    assert!(genesis.m68k.current_cycle <= 2_100);
    assert!(genesis.bus.z80.current_cycle <= 2_200);
    genesis.run_to(4_000);
    assert!(genesis.m68k.current_cycle >= 4_000);
}
