//! Error aggregation
//!
//! Every pass defines its own diagnostic enum; [`CompileError`] wraps
//! them so the pipeline surfaces a single error. The policy is
//! fail-fast: the first error aborts the pipeline and no later pass
//! runs.

use miette::Diagnostic;
use thiserror::Error;

use crate::desugar::DesugarError;
use crate::lowering::LoweringError;
use crate::parsing::ParsingError;
use crate::resolve::ResolveError;
use crate::type_checking::TypeCheckError;
use crate::Span;

#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parsing(#[from] ParsingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Desugar(#[from] DesugarError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TypeCheck(#[from] TypeCheckError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lowering(#[from] LoweringError),

    #[error("{message}")]
    Internal { message: String },
}

impl CompileError {
    /// First diagnostic wins; a parse that fails without reporting
    /// anything is itself a defect worth surfacing
    pub fn from_parse_errors(errors: Vec<ParsingError>) -> Self {
        match errors.into_iter().next() {
            Some(first) => CompileError::Parsing(first),
            None => CompileError::Internal {
                message: String::from("parser failed without diagnostics"),
            },
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parsing(e) => Some(e.span()),
            CompileError::Desugar(e) => Some(e.span()),
            CompileError::Resolve(e) => Some(e.span()),
            CompileError::TypeCheck(e) => e.span(),
            CompileError::Lowering(e) => Some(e.span()),
            CompileError::Internal { .. } => None,
        }
    }

    /// The driver's diagnostic line; errors with no position report
    /// line 0, column 0
    pub fn render(&self, source: &str) -> String {
        let (line, col) = self
            .span()
            .map_or((0, 0), |span| span.line_col(source));
        format!("Error at line {line}, column {col}: {self}")
    }
}
