//! Instruction-level tests against a flat 64 KiB RAM map at the bottom of
//! the address space.

use cpu_m68k::{CpuVariant, M68k};
use emu_core::{BusWidth, MapChunk, MemoryMap, MAP_CODE, MAP_READ, MAP_WRITE};

struct NoSys;

fn make_cpu(variant: CpuVariant) -> M68k<NoSys> {
    let mut map: MemoryMap<NoSys> = MemoryMap::new(BusWidth::Sixteen, 0x00FF_FFFF);
    let ram = map.add_ram(0x1_0000);
    map.set_chunks(vec![MapChunk::buffer(
        0x000000,
        0x00FFFF,
        MAP_READ | MAP_WRITE | MAP_CODE,
        ram,
    )
    .with_mask(0xFFFF)]);
    M68k::new(map, variant, 1)
}

fn load(cpu: &mut M68k<NoSys>, addr: u32, bytes: &[u8]) {
    let mut sys = NoSys;
    for (pair, offset) in bytes.chunks(2).zip((0..).step_by(2)) {
        let word = u16::from(pair[0]) << 8 | u16::from(*pair.get(1).unwrap_or(&0));
        cpu.map().write_16(&mut sys, addr + offset, word, 0);
    }
}

fn peek16(cpu: &mut M68k<NoSys>, addr: u32) -> u16 {
    let mut sys = NoSys;
    cpu.map().read_16(&mut sys, addr, 0)
}

fn peek32(cpu: &mut M68k<NoSys>, addr: u32) -> u32 {
    u32::from(peek16(cpu, addr)) << 16 | u32::from(peek16(cpu, addr + 2))
}

/// Reset into a tiny vector table: SSP=0x1000, PC=0x0400.
fn boot(cpu: &mut M68k<NoSys>) {
    let mut sys = NoSys;
    load(cpu, 0, &[0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x04, 0x00]);
    cpu.reset(&mut sys);
}

fn step(cpu: &mut M68k<NoSys>, cycles: u32) {
    let mut sys = NoSys;
    let target = cpu.current_cycle + cycles;
    cpu.run(&mut sys, target);
}

#[test]
fn reset_loads_vectors() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    assert_eq!(cpu.regs.ssp, 0x1000);
    assert_eq!(cpu.regs.pc, 0x0400);
    assert!(cpu.regs.is_supervisor());
    assert_eq!(cpu.regs.int_mask_level(), 7);
    assert_eq!(cpu.current_cycle, 40, "reset exception cycles charged");
}

#[test]
fn add_w_sets_xcv() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0xD0, 0x40]); // ADD.W D0,D0
    cpu.regs.d[0] = 0x0000_8001;
    let before = cpu.current_cycle;
    step(&mut cpu, 4);

    assert_eq!(cpu.regs.d[0], 0x0000_0002);
    let sr = cpu.regs.sr;
    assert_ne!(sr & 0x0010, 0, "X");
    assert_ne!(sr & 0x0001, 0, "C");
    assert_ne!(sr & 0x0002, 0, "V");
    assert_eq!(sr & 0x0008, 0, "N clear");
    assert_eq!(sr & 0x0004, 0, "Z clear");
    assert_eq!(cpu.current_cycle - before, 4);
}

#[test]
fn trap_1_builds_three_word_frame() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0084, &[0x00, 0x00, 0x05, 0x00]); // vector 33
    load(&mut cpu, 0x0400, &[0x4E, 0x41]); // TRAP #1
    let sr_before = cpu.regs.sr;
    let before = cpu.current_cycle;
    step(&mut cpu, 34);

    assert_eq!(cpu.regs.pc, 0x0500);
    assert!(cpu.regs.is_supervisor());
    assert_eq!(cpu.regs.ssp, 0x1000 - 6, "six-byte frame");
    assert_eq!(peek16(&mut cpu, 0x0FFA), sr_before);
    assert_eq!(peek32(&mut cpu, 0x0FFC), 0x0402, "PC past the TRAP");
    assert_eq!(cpu.current_cycle - before, 34);
}

#[test]
fn trap_frame_carries_format_word_on_010() {
    let mut cpu = make_cpu(CpuVariant::M68010);
    boot(&mut cpu);
    load(&mut cpu, 0x0084, &[0x00, 0x00, 0x05, 0x00]);
    load(&mut cpu, 0x0400, &[0x4E, 0x41]);
    step(&mut cpu, 38);

    assert_eq!(cpu.regs.pc, 0x0500);
    assert_eq!(cpu.regs.ssp, 0x1000 - 8, "format word added");
    assert_eq!(peek16(&mut cpu, 0x0FFE), 33 << 2);
}

#[test]
fn move_sr_privilege_depends_on_variant() {
    // 68000: MOVE SR,Dn is legal in user mode.
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x40, 0xC0]); // MOVE SR,D0
    cpu.regs.sr = 0x0004; // user mode, Z set
    cpu.regs.usp = 0x2000;
    cpu.regs.pc = 0x0400;
    step(&mut cpu, 6);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0x0004);

    // 68010: the same opcode raises a privilege violation (vector 8).
    let mut cpu = make_cpu(CpuVariant::M68010);
    boot(&mut cpu);
    load(&mut cpu, 0x0020, &[0x00, 0x00, 0x06, 0x00]); // vector 8
    load(&mut cpu, 0x0400, &[0x40, 0xC0]);
    cpu.regs.sr = 0x0004;
    cpu.regs.usp = 0x2000;
    cpu.regs.pc = 0x0400;
    // Vector cost (38 on the 010) plus the opcode's base share.
    step(&mut cpu, 38 + 6);
    assert_eq!(cpu.regs.pc, 0x0600);
    assert!(cpu.regs.is_supervisor());
}

#[test]
fn supervisor_switch_swaps_stack_pointers_once() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    cpu.regs.usp = 0x8000;
    // Supervisor now; writing SR with S clear must switch A7 to USP.
    load(&mut cpu, 0x0400, &[0x46, 0xFC, 0x00, 0x00]); // MOVE #0,SR
    step(&mut cpu, 20);
    assert!(!cpu.regs.is_supervisor());
    assert_eq!(cpu.regs.a(7), 0x8000, "A7 is USP after the S edge");
    // Rewriting flags in user mode must not touch A7.
    cpu.regs.sr = 0x001F & cpu.regs.sr | 0x0000;
    assert_eq!(cpu.regs.a(7), 0x8000);
}

#[test]
fn bcc_timing_taken_vs_not() {
    // Taken short branch: 10 cycles.
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x66, 0x10]); // BNE.S +0x10
    cpu.regs.sr &= !0x0004;
    let before = cpu.current_cycle;
    step(&mut cpu, 10);
    assert_eq!(cpu.regs.pc, 0x0412);
    assert_eq!(cpu.current_cycle - before, 10);

    // Not-taken short branch: 8 cycles.
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x66, 0x10]);
    cpu.regs.sr |= 0x0004; // Z set: BNE falls through
    let before = cpu.current_cycle;
    step(&mut cpu, 8);
    assert_eq!(cpu.regs.pc, 0x0402);
    assert_eq!(cpu.current_cycle - before, 8);

    // Not-taken word branch: 12 cycles.
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x66, 0x00, 0x00, 0x20]);
    cpu.regs.sr |= 0x0004;
    let before = cpu.current_cycle;
    step(&mut cpu, 12);
    assert_eq!(cpu.regs.pc, 0x0404);
    assert_eq!(cpu.current_cycle - before, 12);
}

#[test]
fn dbra_loops_and_expires() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    // MOVEQ #2,D0; DBRA D0,-2 (loops onto itself); NOP
    load(&mut cpu, 0x0400, &[0x70, 0x02, 0x51, 0xC8, 0xFF, 0xFE, 0x4E, 0x71]);
    // 4 + 2 taken loops (10 each) + expiry (14)
    step(&mut cpu, 4 + 10 + 10 + 14);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0xFFFF);
    assert_eq!(cpu.regs.pc, 0x0406);
}

#[test]
fn movem_predecrement_and_restore() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    cpu.regs.d[0] = 0x1111_1111;
    cpu.regs.d[1] = 0x2222_2222;
    cpu.regs.set_a(0, 0x0900);
    // MOVEM.L D0-D1,-(A0); CLR.L D0; MOVEM.L (A0)+,D0-D1
    load(
        &mut cpu,
        0x0400,
        &[
            0x48, 0xE0, 0xC0, 0x00, // MOVEM.L D0-D1,-(A0)
            0x42, 0x80, // CLR.L D0
            0x4C, 0x98, 0x00, 0x03, // MOVEM.L (A0)+,D0-D1
        ],
    );
    step(&mut cpu, 200);
    assert_eq!(cpu.regs.d[0], 0x1111_1111);
    assert_eq!(cpu.regs.d[1], 0x2222_2222);
    assert_eq!(cpu.regs.a(0), 0x0900);
    assert_eq!(peek32(&mut cpu, 0x08F8), 0x1111_1111);
}

#[test]
fn divu_by_zero_takes_vector_5() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0014, &[0x00, 0x00, 0x07, 0x00]); // vector 5
    load(&mut cpu, 0x0400, &[0x80, 0xC1]); // DIVU D1,D0
    cpu.regs.d[0] = 100;
    cpu.regs.d[1] = 0;
    step(&mut cpu, 60);
    assert_eq!(cpu.regs.pc & 0xFFFF, 0x0700);
}

#[test]
fn divu_packs_remainder_and_quotient() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x80, 0xC1]);
    cpu.regs.d[0] = 100;
    cpu.regs.d[1] = 7;
    step(&mut cpu, 200);
    assert_eq!(cpu.regs.d[0], 2 << 16 | 14);
}

#[test]
fn autovector_interrupt_entry() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0078, &[0x00, 0x00, 0x06, 0x00]); // autovector level 6
    load(&mut cpu, 0x0400, &[0x4E, 0x71, 0x4E, 0x71]); // NOPs
    load(&mut cpu, 0x0600, &[0x4E, 0x71]);
    cpu.regs.sr = cpu.regs.sr & !0x0700 | 0x0300; // mask level 3
    cpu.interrupt(6);
    step(&mut cpu, 200);
    assert_eq!(cpu.int_ack, 6);
    assert_eq!(cpu.regs.int_mask_level(), 6, "mask raised to the level");
    assert!(cpu.regs.pc >= 0x0600, "handler entered");
}

#[test]
fn masked_interrupt_waits() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x4E, 0x71, 0x4E, 0x71]);
    cpu.interrupt(3); // reset left the mask at 7
    step(&mut cpu, 8);
    assert_eq!(cpu.regs.pc, 0x0404, "straight-line execution");
}

#[test]
fn stop_waits_for_deadline() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    load(&mut cpu, 0x0400, &[0x4E, 0x72, 0x27, 0x00]); // STOP #$2700
    let mut sys = NoSys;
    cpu.run(&mut sys, cpu.current_cycle + 500);
    let at = cpu.current_cycle;
    assert_eq!(at, 540, "budget consumed while stopped");
    cpu.run(&mut sys, at + 100);
    assert_eq!(cpu.current_cycle, at + 100);
}

#[test]
fn addresses_wrap_to_24_bits() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    // MOVEA.L #$FF000500,A0; MOVE.W (A0),D0 — resolves to 0x000500.
    load(
        &mut cpu,
        0x0400,
        &[0x20, 0x7C, 0xFF, 0x00, 0x05, 0x00, 0x30, 0x10],
    );
    load(&mut cpu, 0x0500, &[0x12, 0x34]);
    step(&mut cpu, 20);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0x1234);
}

#[test]
fn serialize_round_trip_resumes_identically() {
    let program = [
        0x70, 0x2A, // MOVEQ #42,D0
        0xD0, 0x40, // ADD.W D0,D0
        0x48, 0x40, // SWAP D0
        0x30, 0x3C, 0x12, 0x34, // MOVE.W #$1234,D0
        0x60, 0xF4, // BRA.S back
    ];
    let mut sys = NoSys;
    let mut a = make_cpu(CpuVariant::M68000);
    boot(&mut a);
    load(&mut a, 0x0400, &program);
    a.run(&mut sys, 60);

    let mut buf = Vec::new();
    a.serialize(&mut buf);

    let mut b = make_cpu(CpuVariant::M68000);
    boot(&mut b);
    load(&mut b, 0x0400, &program);
    b.deserialize(&buf).expect("snapshot applies");

    a.run(&mut sys, 200);
    b.run(&mut sys, 200);
    assert_eq!(a.regs, b.regs);
    assert_eq!(a.current_cycle, b.current_cycle);
}

#[test]
fn run_overshoot_is_bounded() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    // A wall of long divisions (expensive single opcodes).
    load(&mut cpu, 0x0400, &[0x80, 0xC1, 0x80, 0xC1, 0x80, 0xC1]);
    cpu.regs.d[0] = 0xFFFF;
    cpu.regs.d[1] = 3;
    let mut sys = NoSys;
    let target = cpu.current_cycle + 10;
    cpu.run(&mut sys, target);
    assert!(cpu.current_cycle >= target);
    assert!(cpu.current_cycle - target < 200, "overshoot below one opcode");
}

#[test]
fn clr_and_tst_flag_behaviour() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    // CLR.W D0; TST.W D1
    load(&mut cpu, 0x0400, &[0x42, 0x40, 0x4A, 0x41]);
    cpu.regs.d[0] = 0xFFFF_FFFF;
    cpu.regs.d[1] = 0x0000_8000;
    step(&mut cpu, 8);
    assert_eq!(cpu.regs.d[0], 0xFFFF_0000, "upper word preserved");
    assert_ne!(cpu.regs.sr & 0x0008, 0, "TST.W saw the sign bit");
    assert_eq!(cpu.regs.sr & 0x0004, 0);
}

#[test]
fn link_unlk_frame() {
    let mut cpu = make_cpu(CpuVariant::M68000);
    boot(&mut cpu);
    cpu.regs.set_a(6, 0x1234);
    // LINK A6,#-8; UNLK A6
    load(&mut cpu, 0x0400, &[0x4E, 0x56, 0xFF, 0xF8, 0x4E, 0x5E]);
    step(&mut cpu, 16 + 12);
    assert_eq!(cpu.regs.a(6), 0x1234, "frame restored");
    assert_eq!(cpu.regs.a(7), 0x1000, "stack balanced");
}
