//! The compiler's single error currency. Every phase returns
//! `Result<T, CompileError>`; the CLI driver is the only place that
//! turns a `CompileError` into process exit behavior (§7: all kinds are
//! fatal, no recovery, no multi-error reporting).

use thiserror::Error;

use crate::source::SourceLoc;

#[derive(Error, Debug)]
pub enum CompileError {
    // ---- lex errors ----
    #[error("unrecognized character {ch:?} at {loc:?}")]
    UnrecognizedChar { ch: char, loc: SourceLoc },
    #[error("unterminated comment at {loc:?}")]
    UnterminatedComment { loc: SourceLoc },
    #[error("unterminated string or char literal at {loc:?}")]
    UnterminatedLiteral { loc: SourceLoc },
    #[error("token exceeds maximum length at {loc:?}")]
    TokenTooLong { loc: SourceLoc },
    #[error("invalid digit in numeric literal at {loc:?}")]
    InvalidNumericDigit { loc: SourceLoc },

    // ---- preprocess errors ----
    #[error("stray #{directive} at {loc:?}")]
    StrayDirective { directive: &'static str, loc: SourceLoc },
    #[error("unterminated #if at {loc:?}")]
    UnterminatedIf { loc: SourceLoc },
    #[error("malformed constant expression at {loc:?}: {reason}")]
    MalformedConstExpr { reason: String, loc: SourceLoc },
    #[error("{message}")]
    ErrorDirective { message: String, loc: SourceLoc },
    #[error("macro {name!r} invoked with too few arguments at {loc:?}")]
    TooFewMacroArgs { name: String, loc: SourceLoc },
    #[error("macro {name!r} invoked with too many arguments at {loc:?}")]
    TooManyMacroArgs { name: String, loc: SourceLoc },
    #[error("cannot open included file {path:?} at {loc:?}")]
    IncludeNotFound { path: String, loc: SourceLoc },

    // ---- parse errors ----
    #[error("unexpected token {found:?} at {loc:?}")]
    UnexpectedToken { found: String, loc: SourceLoc },
    #[error("unknown type {name:?} at {loc:?}")]
    UnknownType { name: String, loc: SourceLoc },
    #[error("redeclaration of {name:?} at {loc:?}")]
    Redeclaration { name: String, loc: SourceLoc },
    #[error("unsupported construct {what:?} at {loc:?}")]
    UnsupportedConstruct { what: &'static str, loc: SourceLoc },

    // ---- semantic errors ----
    #[error("subscripting non-pointer/non-array {name:?} at {loc:?}")]
    NotSubscriptable { name: String, loc: SourceLoc },
    #[error("reference to unknown identifier {name:?} at {loc:?}")]
    UnknownIdentifier { name: String, loc: SourceLoc },
    #[error("too many locals in function at {loc:?}")]
    TooManyLocals { loc: SourceLoc },
    #[error("too many parameters in function at {loc:?}")]
    TooManyParams { loc: SourceLoc },
    #[error("call passes more arguments than there are argument registers at {loc:?}")]
    TooManyArguments { loc: SourceLoc },
    #[error("too many nested blocks at {loc:?}")]
    TooManyBlocks { loc: SourceLoc },
    #[error("function local storage exceeds {MAX_STACK_SIZE} bytes at {loc:?}")]
    StackOverflow { loc: SourceLoc },

    // ---- backend errors ----
    #[error("invalid instruction form: {reason}")]
    InvalidInstructionForm { reason: String },
    #[error("branch offset overflow: target {target:#x} from {from:#x}")]
    BranchOffsetOverflow { from: u32, target: u32 },
    #[error("unsupported opcode {op:?} for this target")]
    UnsupportedOpcode { op: String },

    // ---- ELF / IO ----
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// The source location this error is anchored to, if it carries
    /// one. Backend/IO errors have no textual position to report (spec
    /// §7's `<file>:<line>:<column>` format only applies to front-end
    /// diagnostics); callers fall back to a location-less message.
    pub fn loc(&self) -> Option<SourceLoc> {
        use CompileError::*;
        match self {
            UnrecognizedChar { loc, .. }
            | UnterminatedComment { loc, .. }
            | UnterminatedLiteral { loc, .. }
            | TokenTooLong { loc, .. }
            | InvalidNumericDigit { loc, .. }
            | StrayDirective { loc, .. }
            | UnterminatedIf { loc, .. }
            | MalformedConstExpr { loc, .. }
            | ErrorDirective { loc, .. }
            | TooFewMacroArgs { loc, .. }
            | TooManyMacroArgs { loc, .. }
            | IncludeNotFound { loc, .. }
            | UnexpectedToken { loc, .. }
            | UnknownType { loc, .. }
            | Redeclaration { loc, .. }
            | UnsupportedConstruct { loc, .. }
            | NotSubscriptable { loc, .. }
            | UnknownIdentifier { loc, .. }
            | TooManyLocals { loc, .. }
            | TooManyParams { loc, .. }
            | TooManyArguments { loc, .. }
            | TooManyBlocks { loc, .. }
            | StackOverflow { loc, .. } => Some(*loc),
            InvalidInstructionForm { .. } | BranchOffsetOverflow { .. } | UnsupportedOpcode { .. } | Io(_) => None,
        }
    }
}

use crate::limits::MAX_STACK_SIZE;
