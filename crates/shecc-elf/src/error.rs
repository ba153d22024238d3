//! The one error this crate can produce: writing the finished image out.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ElfError {
    #[error("I/O error writing ELF output: {0}")]
    Io(#[from] std::io::Error),
}
