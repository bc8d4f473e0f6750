//! `++`/`--` → explicit assignment
//!
//! Only statement-position increments exist by the time this pass runs;
//! the parser rejects `++`/`--` inside larger expressions. `x++` becomes
//! `x = x + 1`, `x--` becomes `x = x - 1`.

use super::DesugarError;
use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};

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
        StmtKind::Expr(e) => {
            let expr_span = e.span;
            match e.kind {
                ExprKind::Unary {
                    op: op @ (UnaryOp::Inc | UnaryOp::Dec),
                    operand,
                } => {
                    let operand_span = operand.span;
                    let ExprKind::Var { name, .. } = operand.kind else {
                        return Err(DesugarError::IncDecTarget { span: operand_span });
                    };

                    let delta = match op {
                        UnaryOp::Inc => BinaryOp::Add,
                        _ => BinaryOp::Sub,
                    };
                    let change = Expr::new(
                        ExprKind::Binary {
                            op: delta,
                            lhs: Box::new(Expr::new(
                                ExprKind::var(name.clone()),
                                operand_span,
                            )),
                            rhs: Box::new(Expr::new(ExprKind::Int(1), expr_span)),
                        },
                        expr_span,
                    );
                    StmtKind::Expr(Expr::new(
                        ExprKind::Binary {
                            op: BinaryOp::Assign,
                            lhs: Box::new(Expr::new(ExprKind::var(name), operand_span)),
                            rhs: Box::new(change),
                        },
                        expr_span,
                    ))
                }
                kind => StmtKind::Expr(Expr::new(kind, expr_span)),
            }
        }

        StmtKind::Block(stmts) => StmtKind::Block(
            stmts
                .into_iter()
                .map(transform_stmt)
                .collect::<Result<_, _>>()?,
        ),

        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition,
            then_branch: Box::new(transform_stmt(*then_branch)?),
            else_branch: else_branch
                .map(|e| transform_stmt(*e).map(Box::new))
                .transpose()?,
        },

        StmtKind::While { condition, body } => StmtKind::While {
            condition,
            body: Box::new(transform_stmt(*body)?),
        },

        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => StmtKind::For {
            init: init.map(|i| transform_stmt(*i).map(Box::new)).transpose()?,
            condition,
            increment,
            body: Box::new(transform_stmt(*body)?),
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
            body: Box::new(transform_stmt(*body)?),
        },

        other => other,
    };
    Ok(Stmt::new(kind, span))
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

    fn assert_becomes_assignment(stmt: &Stmt, op: BinaryOp) {
        let StmtKind::Expr(e) = &stmt.kind else {
            panic!("expected an expression statement");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, rhs, .. } = &e.kind else {
            panic!("expected an assignment, got {:?}", e.kind);
        };
        let ExprKind::Binary { op: found, rhs: one, .. } = &rhs.kind else {
            panic!("expected arithmetic on the right");
        };
        assert_eq!(*found, op);
        assert_eq!(one.kind, ExprKind::Int(1));
    }

    #[test]
    fn increment_becomes_plus_one() {
        let stmts = body_stmts("int main() { x++; ++y; }");
        assert_becomes_assignment(&stmts[0], BinaryOp::Add);
        assert_becomes_assignment(&stmts[1], BinaryOp::Add);
    }

    #[test]
    fn decrement_becomes_minus_one() {
        let stmts = body_stmts("int main() { x--; }");
        assert_becomes_assignment(&stmts[0], BinaryOp::Sub);
    }

    #[test]
    fn idempotent() {
        let once = transform(parse("int main() { x++; while (x < 3) x--; }").unwrap()).unwrap();
        let twice = transform(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
