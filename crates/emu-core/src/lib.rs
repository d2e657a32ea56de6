//! Shared plumbing for the CPU cores.
//!
//! The centrepiece is [`MemoryMap`]: an ordered list of address-range chunks,
//! each backed by a plain buffer or by read/write callbacks. Both CPU cores
//! consult a map on every access and additionally build per-bank fast-path
//! tables over it at init.

mod memmap;

pub use memmap::{
    Bank, BufferId, BusWidth, MapChunk, MemoryMap,
    MAP_CODE, MAP_FUNC_NULL, MAP_ONLY_EVEN, MAP_ONLY_ODD, MAP_PTR_IDX, MAP_READ, MAP_WRITE,
};

/// Sentinel for "this cycle timestamp is not scheduled".
///
/// Pulse windows and latches compare against this; `adjust_cycles` rebases
/// real timestamps and leaves `CYCLE_NEVER` untouched.
pub const CYCLE_NEVER: u32 = 0xFFFF_FFFF;
