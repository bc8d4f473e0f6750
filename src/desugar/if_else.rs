//! if/else split
//!
//! `if (c) T else E` is normalized to `{ if (c) T; if (!c) E; }`. The
//! condition is referenced twice afterwards, so the second occurrence is
//! a deep copy. Nested ifs are handled bottom-up so the split applies at
//! every level; after the pass no statement has an else branch.

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};

pub fn transform(program: Program) -> Program {
    Program {
        stmts: program.stmts.into_iter().map(transform_stmt).collect(),
    }
}

pub fn transform_stmt(stmt: Stmt) -> Stmt {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::Block(stmts) => {
            StmtKind::Block(stmts.into_iter().map(transform_stmt).collect())
        }

        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let then_branch = Box::new(transform_stmt(*then_branch));

            match else_branch {
                None => StmtKind::If {
                    condition,
                    then_branch,
                    else_branch: None,
                },
                Some(else_branch) => {
                    let else_branch = Box::new(transform_stmt(*else_branch));
                    let negated = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::Not,
                            operand: Box::new(condition.clone()),
                        },
                        condition.span,
                    );

                    StmtKind::Block(vec![
                        Stmt::new(
                            StmtKind::If {
                                condition,
                                then_branch,
                                else_branch: None,
                            },
                            span,
                        ),
                        Stmt::new(
                            StmtKind::If {
                                condition: negated,
                                then_branch: else_branch,
                                else_branch: None,
                            },
                            span,
                        ),
                    ])
                }
            }
        }

        StmtKind::While { condition, body } => StmtKind::While {
            condition,
            body: Box::new(transform_stmt(*body)),
        },

        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => StmtKind::For {
            init: init.map(|i| Box::new(transform_stmt(*i))),
            condition,
            increment,
            body: Box::new(transform_stmt(*body)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
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
    fn else_branch_splits_into_two_ifs() {
        let stmts = body_stmts("int main() { if (x < 5) { print x; } else { print 0; } }");

        let StmtKind::Block(split) = &stmts[0].kind else {
            panic!("expected the split block, got {:?}", stmts[0].kind);
        };
        assert_eq!(split.len(), 2);

        let StmtKind::If { condition: first, else_branch: none1, .. } = &split[0].kind else {
            panic!("expected an if");
        };
        let StmtKind::If { condition: second, else_branch: none2, .. } = &split[1].kind else {
            panic!("expected an if");
        };
        assert!(none1.is_none() && none2.is_none());

        assert!(matches!(
            first.kind,
            ExprKind::Binary { op: BinaryOp::Less, .. }
        ));

        // the second condition is !(x < 5), built from a deep copy
        let ExprKind::Unary { op: UnaryOp::Not, operand } = &second.kind else {
            panic!("expected a negation, got {:?}", second.kind);
        };
        assert_eq!(**operand, *first);
    }

    #[test]
    fn condition_copies_are_independent() {
        let stmts = body_stmts("int main() { if (x < 5) print x; else print 0; }");

        let StmtKind::Block(split) = &stmts[0].kind else {
            panic!("expected the split block");
        };

        let StmtKind::If { condition: first, .. } = &split[0].kind else {
            panic!("expected an if");
        };
        let StmtKind::If { condition: second, .. } = &split[1].kind else {
            panic!("expected an if");
        };

        // mutate a clone of the first condition; the second must not change
        let mut mutated = first.clone();
        mutated.kind = ExprKind::Int(0);
        let ExprKind::Unary { operand, .. } = &second.kind else {
            panic!("expected a negation");
        };
        assert_ne!(**operand, mutated);
        assert_eq!(**operand, *first);
    }

    #[test]
    fn nested_ifs_split_bottom_up() {
        let stmts = body_stmts(
            "int main() { if (a) { if (b) print 1; else print 2; } else print 3; }",
        );

        let StmtKind::Block(outer) = &stmts[0].kind else {
            panic!("expected the outer split block");
        };
        let StmtKind::If { then_branch, .. } = &outer[0].kind else {
            panic!("expected an if");
        };
        let StmtKind::Block(inner_body) = &then_branch.kind else {
            panic!("expected the then block");
        };
        // the inner if/else was split too
        assert!(matches!(inner_body[0].kind, StmtKind::Block(_)));
    }

    #[test]
    fn plain_if_passes_through() {
        let stmts = body_stmts("int main() { if (x) print x; }");
        assert!(matches!(stmts[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn idempotent() {
        let once = transform(parse("int main() { if (a) print 1; else print 2; }").unwrap());
        let twice = transform(once.clone());
        assert_eq!(once, twice);
    }
}
