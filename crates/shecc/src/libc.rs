//! The bundled libc implementation (spec §4.H), inlined into every
//! compilation ahead of the user's own translation unit, the same way
//! the original build's `tools/inliner.c` embedded `lib/c.c` as a
//! string constant — here it's `include_str!` plus the normalization
//! `tools/norm-lf.c` used to perform at build time.

/// File name attached to the bundled source's tokens, so diagnostics
/// pointing into it read `lib/c.c:NN:NN` rather than the user's file.
pub const FILE_NAME: &str = "lib/c.c";

pub fn source() -> String {
    include_str!("../lib/c.c").replace("\r\n", "\n")
}
