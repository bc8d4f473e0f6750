//! `+=` → explicit assignment
//!
//! `x += e` becomes `x = x + e`. The target is read twice afterwards, so
//! it is deep-cloned; anything other than a variable or index target is
//! an error.

use super::DesugarError;
use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind};

pub fn transform(program: Program) -> Result<Program, DesugarError> {
    let stmts = program
        .stmts
        .into_iter()
        .map(transform_stmt)
        .collect::<Result<_, _>>()?;
    Ok(Program { stmts })
}

pub fn transform_stmt(stmt: Stmt) -> Result<Stmt, DesugarError> {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::Block(stmts) => StmtKind::Block(
            stmts
                .into_iter()
                .map(transform_stmt)
                .collect::<Result<_, _>>()?,
        ),

        StmtKind::Expr(e) => StmtKind::Expr(transform_expr(e)?),

        StmtKind::Print(e) => StmtKind::Print(transform_expr(e)?),

        StmtKind::VarDecl { name, declared, init } => StmtKind::VarDecl {
            name,
            declared,
            init: init.map(transform_expr).transpose()?,
        },

        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition: transform_expr(condition)?,
            then_branch: Box::new(transform_stmt(*then_branch)?),
            else_branch: else_branch
                .map(|e| transform_stmt(*e).map(Box::new))
                .transpose()?,
        },

        StmtKind::While { condition, body } => StmtKind::While {
            condition: transform_expr(condition)?,
            body: Box::new(transform_stmt(*body)?),
        },

        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => StmtKind::For {
            init: init.map(|i| transform_stmt(*i).map(Box::new)).transpose()?,
            condition: condition.map(transform_expr).transpose()?,
            increment: increment.map(transform_expr).transpose()?,
            body: Box::new(transform_stmt(*body)?),
        },

        StmtKind::Return(value) => StmtKind::Return(value.map(transform_expr).transpose()?),

        StmtKind::Function {
            name,
            return_type,
            params,
            body,
        } => StmtKind::Function {
            name,
            return_type,
            params,
            body: Box::new(transform_stmt(*body)?),
        },

        other @ (StmtKind::Break | StmtKind::Continue) => other,
    };
    Ok(Stmt::new(kind, span))
}

fn transform_expr(expr: Expr) -> Result<Expr, DesugarError> {
    let span = expr.span;
    let ty = expr.ty;
    let kind = match expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = transform_expr(*lhs)?;
            let rhs = transform_expr(*rhs)?;

            if op == BinaryOp::AddAssign {
                if !matches!(lhs.kind, ExprKind::Var { .. } | ExprKind::Index { .. }) {
                    return Err(DesugarError::CompoundTarget { span: lhs.span });
                }

                let read = lhs.clone();
                let sum = Expr::new(
                    ExprKind::Binary {
                        op: BinaryOp::Add,
                        lhs: Box::new(read),
                        rhs: Box::new(rhs),
                    },
                    span,
                );
                ExprKind::Binary {
                    op: BinaryOp::Assign,
                    lhs: Box::new(lhs),
                    rhs: Box::new(sum),
                }
            } else {
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
        }

        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: Box::new(transform_expr(*operand)?),
        },

        ExprKind::Index { array, index } => ExprKind::Index {
            array: Box::new(transform_expr(*array)?),
            index: Box::new(transform_expr(*index)?),
        },

        ExprKind::Call { callee, args, symbol } => ExprKind::Call {
            callee,
            args: args
                .into_iter()
                .map(transform_expr)
                .collect::<Result<_, _>>()?,
            symbol,
        },

        other => other,
    };
    Ok(Expr { kind, span, ty })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;

    fn body_stmts(src: &str) -> Vec<Stmt> {
        let program = transform(parse(src).unwrap()).unwrap();
        match program.stmts.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Function { body, .. }) => match body.kind {
                StmtKind::Block(stmts) => stmts,
                other => panic!("expected a block, got {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn plus_assign_expands() {
        let stmts = body_stmts("int main() { x += 2; }");

        let StmtKind::Expr(e) = &stmts[0].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, lhs, rhs } = &e.kind else {
            panic!("expected an assignment, got {:?}", e.kind);
        };
        assert!(matches!(lhs.kind, ExprKind::Var { .. }));
        let ExprKind::Binary { op: BinaryOp::Add, lhs: read, .. } = &rhs.kind else {
            panic!("expected an addition on the right");
        };
        assert_eq!(read.kind, lhs.kind);
    }

    #[test]
    fn index_target_expands() {
        let stmts = body_stmts("int main() { xs[0] += 1; }");

        let StmtKind::Expr(e) = &stmts[0].kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, lhs, .. } = &e.kind else {
            panic!("expected an assignment");
        };
        assert!(matches!(lhs.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn idempotent() {
        let once = transform(parse("int main() { x += 2; xs[1] += x; }").unwrap()).unwrap();
        let twice = transform(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
