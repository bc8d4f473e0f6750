//! `for` → `while`
//!
//! `for (init; cond; inc) body` becomes
//! `{ init; while (cond) { body; inc; } }`. The wrapping block is what
//! gives `init`'s declarations their scope; a missing condition becomes
//! the integer literal `1`.

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};
use crate::Span;

pub fn transform(program: Program) -> Program {
    Program {
        stmts: program.stmts.into_iter().map(transform_stmt).collect(),
    }
}

pub fn transform_stmt(stmt: Stmt) -> Stmt {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => return desugar_for(init, condition, increment, *body, span),

        StmtKind::Block(stmts) => {
            StmtKind::Block(stmts.into_iter().map(transform_stmt).collect())
        }

        StmtKind::While { condition, body } => StmtKind::While {
            condition,
            body: Box::new(transform_stmt(*body)),
        },

        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition,
            then_branch: Box::new(transform_stmt(*then_branch)),
            else_branch: else_branch.map(|e| Box::new(transform_stmt(*e))),
        },

        StmtKind::Function {
            name,
            return_type,
            params,
            body,
        } => StmtKind::Function {
            name,
            return_type,
            params,
            body: Box::new(transform_stmt(*body)),
        },

        other => other,
    };
    Stmt::new(kind, span)
}

fn desugar_for(
    init: Option<Box<Stmt>>,
    condition: Option<Expr>,
    increment: Option<Expr>,
    body: Stmt,
    span: Span,
) -> Stmt {
    let mut block = Vec::new();

    if let Some(init) = init {
        block.push(transform_stmt(*init));
    }

    let body = transform_stmt(body);
    let body = match increment {
        Some(increment) => {
            let inc_span = increment.span;
            Stmt::new(
                StmtKind::Block(vec![body, Stmt::new(StmtKind::Expr(increment), inc_span)]),
                span,
            )
        }
        None => body,
    };

    let condition = condition.unwrap_or_else(|| Expr::new(ExprKind::Int(1), span));

    block.push(Stmt::new(
        StmtKind::While {
            condition,
            body: Box::new(body),
        },
        span,
    ));

    Stmt::new(StmtKind::Block(block), span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use crate::parsing::parse;

    fn first_body_stmt(src: &str) -> Stmt {
        let program = transform(parse(src).unwrap());
        match program.stmts.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Function { body, .. }) => match body.kind {
                StmtKind::Block(stmts) => stmts.into_iter().next().unwrap(),
                other => panic!("expected a block, got {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn loop_becomes_block_with_while() {
        let stmt = first_body_stmt("int main() { for (i = 0; i < 3; i = i + 1) print i; }");

        let StmtKind::Block(stmts) = stmt.kind else {
            panic!("expected a wrapping block");
        };
        assert_eq!(stmts.len(), 2);

        // i = 0;
        let StmtKind::Expr(init) = &stmts[0].kind else {
            panic!("expected the init statement first");
        };
        assert!(matches!(
            init.kind,
            ExprKind::Binary { op: BinaryOp::Assign, .. }
        ));

        // while (i < 3) { print i; i = i + 1; }
        let StmtKind::While { condition, body } = &stmts[1].kind else {
            panic!("expected a while loop");
        };
        assert!(matches!(
            condition.kind,
            ExprKind::Binary { op: BinaryOp::Less, .. }
        ));
        let StmtKind::Block(body) = &body.kind else {
            panic!("expected the loop body to be a block");
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].kind, StmtKind::Print(_)));
        assert!(matches!(body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn missing_condition_becomes_one() {
        let stmt = first_body_stmt("int main() { for (;;) break; }");

        let StmtKind::Block(stmts) = stmt.kind else {
            panic!("expected a wrapping block");
        };
        let StmtKind::While { condition, .. } = &stmts[0].kind else {
            panic!("expected a while loop");
        };
        assert_eq!(condition.kind, ExprKind::Int(1));
    }

    #[test]
    fn nested_loops_are_rewritten() {
        let stmt = first_body_stmt("int main() { for (;;) for (;;) break; }");

        let StmtKind::Block(stmts) = stmt.kind else {
            panic!("expected a wrapping block");
        };
        let StmtKind::While { body, .. } = &stmts[0].kind else {
            panic!("expected a while loop");
        };
        assert!(matches!(body.kind, StmtKind::Block(_)));
    }

    #[test]
    fn idempotent() {
        let once = transform(parse("int main() { for (int i = 0; i < 3; i = i + 1) { print i; } }").unwrap());
        let twice = transform(once.clone());
        assert_eq!(once, twice);
    }
}
