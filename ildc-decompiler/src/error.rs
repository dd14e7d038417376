use std::fmt;

use ildc_ir::instruction::SourceLocation;
use ildc_isa::Opcode;
use thiserror::Error;

/// Anomalies found while decompiling one method body.
///
/// None of these abort decompilation: the affected construct is skipped and
/// the walk continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecompileError {
    #[error("`{opcode}` at IL_{offset:04x} needs more operands than the stack holds")]
    StackUnderflow { offset: u32, opcode: Opcode },

    #[error("branch at IL_{offset:04x} has no target operand")]
    MissingBranchTarget { offset: u32 },

    #[error("branch at IL_{offset:04x} targets IL_{target:04x}, which is not an instruction boundary")]
    UnresolvedBranchTarget { offset: u32, target: u32 },

    #[error("handler at IL_{offset:04x} has no enclosing try region")]
    UnmatchedHandler { offset: u32 },

    #[error("try region at IL_{offset:04x} has no handler")]
    UnclosedTryRegion { offset: u32 },

    #[error("{depth} operand(s) left on the stack entering the region at IL_{offset:04x}")]
    NonEmptyStackAtRegionEntry { offset: u32, depth: usize },

    #[error("`{opcode}` at IL_{offset:04x} is not a handler start")]
    UnrecognizedHandler { offset: u32, opcode: Opcode },
}

/// A [`DecompileError`] reported at the location it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub error: DecompileError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Collects diagnostics for one method and mirrors them to the log.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn from_vec(items: Vec<Diagnostic>) -> Self {
        Diagnostics { items }
    }

    pub(crate) fn report(&mut self, location: SourceLocation, error: DecompileError) {
        log::warn!("{location}: {error}");
        self.items.push(Diagnostic { location, error });
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
