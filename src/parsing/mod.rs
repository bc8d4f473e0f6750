//! Parsing
//!
//! This module is responsible for turning the source code from its string
//! form into an AST. The main interface is [parse] which takes a string
//! and generates an [ast::Program].
//!
//! Internally, parsing works in two phases:
//! - the [lexer] scans the source text and turns it into a stream of tokens
//! - the [parser] generates the AST from these tokens
//!
//! The module relies heavily on the [chumsky] crate for lexing and parsing.

use miette::Diagnostic;
use thiserror::Error;

use chumsky::error::SimpleReason;
use chumsky::{prelude::*, Stream};

use crate::{ast, Span};

pub mod lexer;
mod parser;

type ParseErr<T> = Simple<T, Span>;

#[derive(Debug, Error, Diagnostic)]
pub enum ParsingError {
    #[error("Found an unclosed delimiter: {delimiter}")]
    #[diagnostic(help("Must be closed before: {must_close_before}"))]
    UnclosedDelimiter {
        delimiter: String,
        must_close_before: String,

        #[label("unclosed delimiter")]
        span: Span,
    },

    #[error("Encountered unexpected input: {token}")]
    UnexpectedInput {
        token: String,

        #[help]
        expected: Option<String>,

        #[label("here")]
        span: Span,
    },

    #[error("{msg}")]
    Custom {
        msg: String,

        #[label("here")]
        span: Span,
    },
}

impl ParsingError {
    pub fn span(&self) -> Span {
        match self {
            ParsingError::UnclosedDelimiter { span, .. }
            | ParsingError::UnexpectedInput { span, .. }
            | ParsingError::Custom { span, .. } => *span,
        }
    }
}

/// Parse Nano source code into an AST
pub fn parse(source: &str) -> Result<ast::Program, Vec<ParsingError>> {
    let end_of_input = Span::marker(source.chars().count());

    let char_iter = source
        .chars()
        .enumerate()
        .map(|(i, c)| (c, Span::single(i)));

    let (tokens, lex_errs) =
        lexer::lex().parse_recovery(Stream::from_iter(end_of_input, char_iter));

    let parse_errs = if let Some(tokens) = tokens {
        let (program, parse_errs) =
            parser::parser().parse_recovery(Stream::from_iter(end_of_input, tokens.into_iter()));

        if let Some(program) = program.filter(|_| lex_errs.len() + parse_errs.len() == 0) {
            return Ok(program);
        }

        parse_errs
    } else {
        Vec::new()
    };

    let errors = lex_errs
        .into_iter()
        .map(|e| e.map(|c| c.to_string()))
        .chain(parse_errs.into_iter().map(|e| e.map(|tok| tok.to_string())))
        .map(build_error)
        .collect();

    Err(errors)
}

/// Turn a chumsky error into our error type
fn build_error(err: ParseErr<String>) -> ParsingError {
    let eof = String::from("end of file");
    match err.reason() {
        SimpleReason::Unexpected => {
            let token = err.found().unwrap_or(&eof);
            let expected = if err.expected().len() == 0 {
                None
            } else {
                let toks: Vec<_> = err
                    .expected()
                    .map(|tok| match tok {
                        Some(tok) => tok.to_string(),
                        None => eof.clone(),
                    })
                    .collect();

                let mut help_string = toks.join(", ");
                help_string.insert_str(0, "Expected one of: ");

                Some(help_string)
            };

            ParsingError::UnexpectedInput {
                token: token.clone(),
                expected,
                span: err.span(),
            }
        }
        SimpleReason::Unclosed { span, delimiter } => {
            let must_close_before = err.found().unwrap_or(&eof);
            ParsingError::UnclosedDelimiter {
                delimiter: delimiter.clone(),
                must_close_before: must_close_before.clone(),
                span: *span,
            }
        }
        SimpleReason::Custom(msg) => ParsingError::Custom {
            msg: msg.clone(),
            span: err.span(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, ExprKind, StmtKind};

    fn parse_single_function(src: &str) -> Vec<crate::ast::Stmt> {
        let program = parse(src).unwrap();
        assert_eq!(program.stmts.len(), 1);
        match program.stmts.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Function { body, .. }) => match body.kind {
                StmtKind::Block(stmts) => stmts,
                other => panic!("function body should be a block, got {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn precedence() {
        let stmts = parse_single_function("int main() { int x = 2 + 3 * 4; }");

        let StmtKind::VarDecl { init: Some(init), .. } = &stmts[0].kind else {
            panic!("expected a variable declaration");
        };

        // (2 + (3 * 4))
        let ExprKind::Binary { op: BinaryOp::Add, lhs, rhs } = &init.kind else {
            panic!("expected an addition at the top, got {:?}", init.kind);
        };
        assert_eq!(lhs.kind, ExprKind::Int(2));
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary { op: BinaryOp::Mul, .. }
        ));
    }

    #[test]
    fn spans_point_into_the_source() {
        let src = "int main() { return 0; }";
        let program = parse(src).unwrap();
        let func = &program.stmts[0];
        assert_eq!(func.span.start, 0);
        assert_eq!(func.span.end, src.len());
    }

    #[test]
    fn assignment_is_right_associative() {
        let stmts = parse_single_function("int main() { x = y = 2; }");

        let StmtKind::Expr(e) = &stmts[0].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, rhs, .. } = &e.kind else {
            panic!("expected an assignment");
        };
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary { op: BinaryOp::Assign, .. }
        ));
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        let stmts =
            parse_single_function("int main() { if (a) if (b) print 1; else print 2; }");

        let StmtKind::If { then_branch, else_branch, .. } = &stmts[0].kind else {
            panic!("expected an if");
        };
        assert!(else_branch.is_none());
        assert!(matches!(
            then_branch.kind,
            StmtKind::If { else_branch: Some(_), .. }
        ));
    }

    #[test]
    fn for_loop_with_declaration_init() {
        let stmts = parse_single_function("int main() { for (int i = 0; i < 3; i = i + 1) print i; }");

        let StmtKind::For { init, condition, increment, .. } = &stmts[0].kind else {
            panic!("expected a for loop");
        };
        assert!(matches!(
            init.as_deref().map(|s| &s.kind),
            Some(StmtKind::VarDecl { .. })
        ));
        assert!(condition.is_some());
        assert!(increment.is_some());
    }

    #[test]
    fn for_loop_headless() {
        let stmts = parse_single_function("int main() { for (;;) break; }");

        let StmtKind::For { init, condition, increment, .. } = &stmts[0].kind else {
            panic!("expected a for loop");
        };
        assert!(init.is_none());
        assert!(condition.is_none());
        assert!(increment.is_none());
    }

    #[test]
    fn array_declaration_and_indexing() {
        let stmts = parse_single_function("int main() { int[3] xs; xs[0] = 1; print xs[0]; }");

        assert!(matches!(
            &stmts[0].kind,
            StmtKind::VarDecl { declared: crate::Type::Array { .. }, .. }
        ));
        let StmtKind::Expr(e) = &stmts[1].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, lhs, .. } = &e.kind else {
            panic!("expected an assignment");
        };
        assert!(matches!(lhs.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn statement_level_increment() {
        let stmts = parse_single_function("int main() { i++; ++i; i--; }");
        for stmt in &stmts {
            let StmtKind::Expr(e) = &stmt.kind else {
                panic!("expected an expression statement");
            };
            assert!(matches!(e.kind, ExprKind::Unary { .. }));
        }
    }

    #[test]
    #[should_panic]
    fn increment_inside_expression() {
        parse("int main() { int x = i++ + 2; }").unwrap();
    }

    #[test]
    #[should_panic]
    fn invalid_assignment_target() {
        parse("int main() { 1 = 2; }").unwrap();
    }

    #[test]
    #[should_panic]
    fn duplicate_parameter_names() {
        parse("int f(int a, int a) { return 0; }").unwrap();
    }

    #[test]
    #[should_panic]
    fn unclosed_brace() {
        parse("int main() { return 0;").unwrap();
    }
}
