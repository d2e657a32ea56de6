//! Motorola 68000-family CPU core.
//!
//! Decode-and-execute interpreter for the 68000/68010/68020-class parts,
//! CPU32 and ColdFire, driven by an external deadline: the host calls
//! [`M68k::run`] with a target cycle and the core executes whole
//! instructions until its cycle counter meets it.
//!
//! Per-opcode cycle counts live in a 65,536-entry table built at init and
//! pre-multiplied by the instance clock divider; exception costs come from a
//! per-variant 256-entry table. Memory resolves through an
//! [`emu_core::MemoryMap`] with a 64 KiB-bank fast path over the low 16 MB.

mod arith;
mod branches;
mod cpu;
mod cycles;
mod decode;
mod ea;
mod exceptions;
mod flags;
mod immediates;
mod logic;
mod misc;
mod registers;
mod shifts;
mod timing;
mod variant;

pub use cpu::{M68k, INT_ACK_AUTOVECTOR, INT_ACK_SPURIOUS};
pub use ea::Size;
pub use registers::Registers;
pub use variant::CpuVariant;
