//! Shared data model for the shecc pipeline.
//!
//! Every other crate in the workspace builds on the types here: interned
//! strings, source locations, the token stream, the C-subset type system,
//! phase-1 and phase-2 IR, and the basic-block/function graph. Nothing in
//! this crate performs compilation; it only defines the currency that the
//! phases pass between each other.

mod arena;
mod context;
mod error;
mod interner;
mod limits;
mod macros;
mod phase1;
mod phase2;
mod source;
mod token;
mod types;
mod var;

pub use arena::{BlockArena, BlockId, FuncArena, FuncId};
pub use context::{CompileOptions, Context, Target};
pub use error::CompileError;
pub use interner::{Interner, Symbol};
pub use limits::*;
pub use macros::{BuiltinMacro, MacroDef};
pub use phase1::{BasicBlock, EdgeKind, Function, Opcode, Phase1Instr};
pub use phase2::{Phase2Instr, Phase2Op, RegOrSlot};
pub use source::SourceLoc;
pub use token::{Directive, Keyword, Punct, Token, TokenKind};
pub use types::{align4, BaseKind, Field, Type, TypeId, TypeTable};
pub use var::{Variable, VarId};

pub type Result<T> = std::result::Result<T, CompileError>;
