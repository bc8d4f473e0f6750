//! Desugaring
//!
//! Surface constructs are rewritten into the primitive core before any
//! semantic analysis runs: `for` loops become `while` loops, compound
//! assignment and `++`/`--` become explicit assignments, and `if`/`else`
//! is split into two guarded `if`s. Each pass walks the tree bottom-up
//! and rebuilds it, passing unaffected nodes through; all of them are
//! idempotent and keep the spans of the nodes they replace.
//!
//! The bool→int lowering in [booleans] is also a desugaring but runs
//! after type checking so that diagnostics still see `true`/`false`.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Program;
use crate::Span;

pub mod booleans;
pub mod compound_assign;
pub mod for_loops;
pub mod if_else;
pub mod inc_dec;

#[derive(Debug, Error, Diagnostic)]
pub enum DesugarError {
    #[error("Left side of `+=` must be a variable or index")]
    CompoundTarget {
        #[label("cannot assign to this")]
        span: Span,
    },

    #[error("`++`/`--` requires a variable")]
    IncDecTarget {
        #[label("not a variable")]
        span: Span,
    },
}

impl DesugarError {
    pub fn span(&self) -> Span {
        match self {
            DesugarError::CompoundTarget { span } | DesugarError::IncDecTarget { span } => *span,
        }
    }
}

/// Run the pre-resolution desugaring passes in pipeline order
pub fn desugar(program: Program) -> Result<Program, DesugarError> {
    let program = for_loops::transform(program);
    let program = compound_assign::transform(program)?;
    let program = inc_dec::transform(program)?;
    Ok(if_else::transform(program))
}
