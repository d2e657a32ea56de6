//! Zilog Z80 CPU core.
//!
//! Decode-and-execute interpreter driven by an external deadline: the host
//! calls [`Z80::run`] with a target cycle and the core executes whole
//! instructions until its cycle counter meets it. Memory resolves through an
//! [`emu_core::MemoryMap`] with an 8 KiB-bank fast path; I/O has its own map.
//!
//! Timing uses the six NMOS cycle tables (main, CB, ED, DD/FD, DD CB,
//! taken-branch extra), swappable at runtime. ALU flags come from
//! process-global lookup tables built once on first use.

mod alu;
mod cpu;
mod flags;
mod registers;
mod tables;

pub use cpu::{IntPulse, Z80};
pub use registers::Registers;
pub use tables::{CycleTables, DEFAULT_CYCLES};
