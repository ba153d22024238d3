//! Compile-time limits carried over from the original implementation's
//! `defs.h`. These bound the fixed-size tables the original C compiler
//! used for its arrays; here they are enforced as explicit diagnostics
//! rather than silent overflow, but the numbers themselves are kept so
//! that programs accepted or rejected by one implementation behave the
//! same way under the other.

pub const MAX_TOKEN_LEN: usize = 256;
pub const MAX_PARAMS: usize = 8;
pub const MAX_LOCALS: usize = 48;
pub const MAX_FIELDS: usize = 32;
pub const MAX_NESTING: usize = 128;
pub const MAX_CASES: usize = 128;
pub const MAX_STACK_SIZE: i32 = 2047;

/// Usable general-purpose registers available to the linear-scan
/// allocator (spec §4.F: "targets ≥ 7 usable registers"), after the
/// backends' own reserved registers (frame pointer, global-data
/// pointer, link/return register, stack pointer) are set aside.
pub const NUM_REGISTERS: usize = 7;
