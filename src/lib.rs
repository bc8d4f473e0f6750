//! An ahead-of-time compiler for the Nano language: source text to a
//! typed, scope-resolved, normalized AST, and from there to a small CPS
//! IR for a backend code generator. Every pass fails fast on its first
//! error.

pub mod anf;
pub mod ast;
mod common;
pub mod desugar;
mod error;
pub mod ir;
pub mod lowering;
pub mod parsing;
pub mod resolve;
pub mod type_checking;

pub use common::{Span, Symbol, SymbolId, SymbolKind, SymbolTable, Type};
pub use error::CompileError;
pub use parsing::parse;

/// Run the front half of the pipeline: parse, desugar, normalize,
/// resolve, and type check. On success the returned tree is fully typed
/// and every name carries its symbol.
pub fn analyze(source: &str) -> Result<(ast::Program, SymbolTable), CompileError> {
    let program = parse(source).map_err(CompileError::from_parse_errors)?;
    let program = desugar::desugar(program)?;
    let mut program = anf::normalize(program);
    let mut symbols = resolve::resolve(&mut program)?;
    type_checking::check(&mut program, &mut symbols)?;
    Ok((program, symbols))
}

/// Run the whole pipeline and produce the CPS IR.
pub fn compile(source: &str) -> Result<ir::Program, CompileError> {
    let (program, _symbols) = analyze(source)?;
    let program = desugar::booleans::transform(program);
    Ok(lowering::lower(&program)?)
}
