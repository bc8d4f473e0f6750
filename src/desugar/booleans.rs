//! bool → int
//!
//! Replaces the literals `true`/`false` with the integer literals `1`/`0`
//! and touches nothing else. Runs after type checking so diagnostics see
//! the original literals; boolean-valued operators keep producing 1/0
//! integers downstream.

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};
use crate::Type;

pub fn transform(program: Program) -> Program {
    Program {
        stmts: program.stmts.into_iter().map(transform_stmt).collect(),
    }
}

pub fn transform_stmt(stmt: Stmt) -> Stmt {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::Expr(e) => StmtKind::Expr(transform_expr(e)),

        StmtKind::Print(e) => StmtKind::Print(transform_expr(e)),

        StmtKind::VarDecl { name, declared, init } => StmtKind::VarDecl {
            name,
            declared,
            init: init.map(transform_expr),
        },

        StmtKind::Block(stmts) => {
            StmtKind::Block(stmts.into_iter().map(transform_stmt).collect())
        }

        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition: transform_expr(condition),
            then_branch: Box::new(transform_stmt(*then_branch)),
            else_branch: else_branch.map(|e| Box::new(transform_stmt(*e))),
        },

        StmtKind::While { condition, body } => StmtKind::While {
            condition: transform_expr(condition),
            body: Box::new(transform_stmt(*body)),
        },

        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => StmtKind::For {
            init: init.map(|i| Box::new(transform_stmt(*i))),
            condition: condition.map(transform_expr),
            increment: increment.map(transform_expr),
            body: Box::new(transform_stmt(*body)),
        },

        StmtKind::Return(value) => StmtKind::Return(value.map(transform_expr)),

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

fn transform_expr(expr: Expr) -> Expr {
    let span = expr.span;
    match expr.kind {
        ExprKind::Bool(b) => Expr {
            kind: ExprKind::Int(if b { 1 } else { 0 }),
            span,
            ty: Type::int(),
        },

        ExprKind::Unary { op, operand } => Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(transform_expr(*operand)),
            },
            span,
            ty: expr.ty,
        },

        ExprKind::Binary { op, lhs, rhs } => Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(transform_expr(*lhs)),
                rhs: Box::new(transform_expr(*rhs)),
            },
            span,
            ty: expr.ty,
        },

        ExprKind::Index { array, index } => Expr {
            kind: ExprKind::Index {
                array: Box::new(transform_expr(*array)),
                index: Box::new(transform_expr(*index)),
            },
            span,
            ty: expr.ty,
        },

        ExprKind::Call { callee, args, symbol } => Expr {
            kind: ExprKind::Call {
                callee,
                args: args.into_iter().map(transform_expr).collect(),
                symbol,
            },
            span,
            ty: expr.ty,
        },

        other => Expr {
            kind: other,
            span,
            ty: expr.ty,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;

    fn body_stmts(src: &str) -> Vec<Stmt> {
        let program = transform(parse(src).unwrap());
        match program.stmts.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Function { body, .. }) => match body.kind {
                StmtKind::Block(stmts) => stmts,
                other => panic!("expected a block, got {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn literals_become_integers() {
        let stmts = body_stmts("int main() { bool a = true; bool b = false; }");

        let StmtKind::VarDecl { init: Some(a), .. } = &stmts[0].kind else {
            panic!("expected a declaration");
        };
        let StmtKind::VarDecl { init: Some(b), .. } = &stmts[1].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(a.kind, ExprKind::Int(1));
        assert_eq!(b.kind, ExprKind::Int(0));
    }

    #[test]
    fn nested_literals_are_rewritten() {
        let stmts = body_stmts("int main() { if (x == true) print false; }");

        let StmtKind::If { condition, then_branch, .. } = &stmts[0].kind else {
            panic!("expected an if");
        };
        let ExprKind::Binary { rhs, .. } = &condition.kind else {
            panic!("expected a comparison");
        };
        assert_eq!(rhs.kind, ExprKind::Int(1));
        let StmtKind::Print(value) = &then_branch.kind else {
            panic!("expected a print");
        };
        assert_eq!(value.kind, ExprKind::Int(0));
    }

    #[test]
    fn idempotent() {
        let once = transform(parse("int main() { bool a = true; print a && false; }").unwrap());
        let twice = transform(once.clone());
        assert_eq!(once, twice);
    }
}
