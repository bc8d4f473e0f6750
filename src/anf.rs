//! A-normal-form conversion
//!
//! After this pass every operand of a binary, unary, call, or index
//! expression and every control-flow condition is an atom: a literal or
//! a variable. Compound subexpressions are lifted into assignments to
//! fresh `_t<n>` temporaries, spliced immediately before the enclosing
//! statement. The lexer rejects user identifiers of that shape, so the
//! temporaries are fresh by construction.
//!
//! `&&` and `||` are lowered here into `if` statements so the right
//! operand is only evaluated when it has to be; the result lands in a
//! boolean temporary normalized with two negations.
//!
//! The temp counter lives on the pass instance and is monotonic for one
//! compilation; a fresh instance starts at `_t0` again.

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::Span;

/// Normalize a whole program with a fresh temp counter
pub fn normalize(program: Program) -> Program {
    Normalizer::default().run(program)
}

#[derive(Debug, Default)]
pub struct Normalizer {
    temp_counter: usize,
}

impl Normalizer {
    pub fn run(&mut self, program: Program) -> Program {
        Program {
            stmts: program
                .stmts
                .into_iter()
                .flat_map(|s| self.transform_stmt(s))
                .collect(),
        }
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("_t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub fn transform_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let span = stmt.span;
        let mut out = Vec::new();

        match stmt.kind {
            StmtKind::Block(stmts) => {
                let mut inner = Vec::new();
                for s in stmts {
                    inner.extend(self.transform_stmt(s));
                }
                out.push(Stmt::new(StmtKind::Block(inner), span));
            }

            StmtKind::Expr(e) => {
                let expr_span = e.span;
                match e.kind {
                    // `x = e` stays a single statement with an atomic right side
                    ExprKind::Binary {
                        op: BinaryOp::Assign,
                        lhs,
                        rhs,
                    } => {
                        let rhs = self.transform_expr(*rhs, &mut out);
                        let lhs = self.transform_store_target(*lhs, &mut out);
                        out.push(assign_to(lhs, rhs, expr_span));
                    }
                    kind => {
                        let atom =
                            self.transform_expr(Expr::new(kind, expr_span), &mut out);
                        out.push(Stmt::new(StmtKind::Expr(atom), expr_span));
                    }
                }
            }

            StmtKind::Print(e) => {
                let atom = self.transform_expr(e, &mut out);
                out.push(Stmt::new(StmtKind::Print(atom), span));
            }

            StmtKind::VarDecl { name, declared, init } => {
                let init = init.map(|e| self.transform_expr(e, &mut out));
                out.push(Stmt::new(StmtKind::VarDecl { name, declared, init }, span));
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.transform_expr(condition, &mut out);
                let then_branch = self.transform_branch(*then_branch);
                let else_branch = else_branch.map(|e| Box::new(self.transform_branch(*e)));
                out.push(Stmt::new(
                    StmtKind::If {
                        condition,
                        then_branch: Box::new(then_branch),
                        else_branch,
                    },
                    span,
                ));
            }

            StmtKind::While { condition, body } => {
                // the lifted condition statements sit in front of the loop
                let condition = self.transform_expr(condition, &mut out);
                let body = self.transform_branch(*body);
                out.push(Stmt::new(
                    StmtKind::While {
                        condition,
                        body: Box::new(body),
                    },
                    span,
                ));
            }

            StmtKind::Return(value) => {
                let value = value.map(|e| self.transform_expr(e, &mut out));
                out.push(Stmt::new(StmtKind::Return(value), span));
            }

            StmtKind::Function {
                name,
                return_type,
                params,
                body,
            } => {
                let body = self.transform_branch(*body);
                out.push(Stmt::new(
                    StmtKind::Function {
                        name,
                        return_type,
                        params,
                        body: Box::new(body),
                    },
                    span,
                ));
            }

            other => out.push(Stmt::new(other, span)),
        }

        out
    }

    /// Transform a branch or loop body, wrapping multiple results
    fn transform_branch(&mut self, stmt: Stmt) -> Stmt {
        let span = stmt.span;
        let mut stmts = self.transform_stmt(stmt);
        if stmts.len() == 1 {
            stmts.remove(0)
        } else {
            Stmt::new(StmtKind::Block(stmts), span)
        }
    }

    /// Lower an expression to an atom, pushing lifted assignments to `out`
    pub fn transform_expr(&mut self, expr: Expr, out: &mut Vec<Stmt>) -> Expr {
        let span = expr.span;

        if expr.is_atom() {
            return expr;
        }

        match expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs,
                rhs,
            } => {
                // the value of an assignment is its right side
                let rhs = self.transform_expr(*rhs, out);
                let lhs = self.transform_store_target(*lhs, out);
                out.push(assign_to(lhs, rhs.clone(), span));
                rhs
            }

            ExprKind::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                lhs,
                rhs,
            } => self.lower_short_circuit(op, *lhs, *rhs, span, out),

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.transform_expr(*lhs, out);
                let rhs = self.transform_expr(*rhs, out);
                let tmp = self.fresh_temp();
                out.push(assign(
                    &tmp,
                    Expr::new(
                        ExprKind::Binary {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        span,
                    ),
                    span,
                ));
                var(&tmp, span)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.transform_expr(*operand, out);
                let tmp = self.fresh_temp();
                out.push(assign(
                    &tmp,
                    Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(operand),
                        },
                        span,
                    ),
                    span,
                ));
                var(&tmp, span)
            }

            ExprKind::Call { callee, args, symbol } => {
                let args = args
                    .into_iter()
                    .map(|a| self.transform_expr(a, out))
                    .collect();
                let tmp = self.fresh_temp();
                out.push(assign(
                    &tmp,
                    Expr::new(ExprKind::Call { callee, args, symbol }, span),
                    span,
                ));
                var(&tmp, span)
            }

            ExprKind::Index { array, index } => {
                let array = self.transform_expr(*array, out);
                let index = self.transform_expr(*index, out);
                let tmp = self.fresh_temp();
                out.push(assign(
                    &tmp,
                    Expr::new(
                        ExprKind::Index {
                            array: Box::new(array),
                            index: Box::new(index),
                        },
                        span,
                    ),
                    span,
                ));
                var(&tmp, span)
            }

            // atoms were returned above
            kind => Expr::new(kind, span),
        }
    }

    /// Lower the target of a store: indices become atoms, the variable or
    /// index path itself stays in place
    fn transform_store_target(&mut self, expr: Expr, out: &mut Vec<Stmt>) -> Expr {
        let span = expr.span;
        match expr.kind {
            ExprKind::Index { array, index } => {
                let array = self.transform_store_target(*array, out);
                let index = self.transform_expr(*index, out);
                Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    span,
                )
            }
            kind => Expr::new(kind, span),
        }
    }

    /// `l && r` / `l || r` with the right side evaluated only when needed
    fn lower_short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> Expr {
        let lhs = self.transform_expr(lhs, out);

        let result = self.fresh_temp();
        let default = matches!(op, BinaryOp::Or);
        out.push(assign(
            &result,
            Expr::new(ExprKind::Bool(default), span),
            span,
        ));

        // for `||` the guarded branch runs when the left side is false
        let condition = match op {
            BinaryOp::And => lhs,
            _ => {
                let negated = self.fresh_temp();
                out.push(assign(
                    &negated,
                    Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::Not,
                            operand: Box::new(lhs),
                        },
                        span,
                    ),
                    span,
                ));
                var(&negated, span)
            }
        };

        let mut guarded = Vec::new();
        let rhs = self.transform_expr(rhs, &mut guarded);

        // normalize the right side to 0/1 with a double negation
        let once = self.fresh_temp();
        guarded.push(assign(
            &once,
            Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(rhs),
                },
                span,
            ),
            span,
        ));
        guarded.push(assign(
            &result,
            Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(var(&once, span)),
                },
                span,
            ),
            span,
        ));

        out.push(Stmt::new(
            StmtKind::If {
                condition,
                then_branch: Box::new(Stmt::new(StmtKind::Block(guarded), span)),
                else_branch: None,
            },
            span,
        ));

        var(&result, span)
    }
}

fn var(name: &str, span: Span) -> Expr {
    Expr::new(ExprKind::var(name), span)
}

fn assign(name: &str, rhs: Expr, span: Span) -> Stmt {
    assign_to(var(name, span), rhs, span)
}

fn assign_to(lhs: Expr, rhs: Expr, span: Span) -> Stmt {
    Stmt::new(
        StmtKind::Expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desugar;
    use crate::parsing::parse;

    fn normalized_body(src: &str) -> Vec<Stmt> {
        let program = desugar::desugar(parse(src).unwrap()).unwrap();
        let program = normalize(program);
        match program.stmts.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Function { body, .. }) => match body.kind {
                StmtKind::Block(stmts) => stmts,
                other => panic!("expected a block, got {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    /// Every operand and condition must be an atom after the pass
    fn assert_normalized(stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => stmts.iter().for_each(assert_normalized),
            StmtKind::Expr(e) | StmtKind::Print(e) => assert_operands_atomic(e),
            StmtKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    assert!(init.is_atom(), "initializer must be an atom: {init:?}");
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                assert!(condition.is_atom(), "condition must be an atom");
                assert_normalized(then_branch);
                if let Some(else_branch) = else_branch {
                    assert_normalized(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                assert!(condition.is_atom(), "condition must be an atom");
                assert_normalized(body);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    assert!(value.is_atom(), "return value must be an atom");
                }
            }
            StmtKind::Function { body, .. } => assert_normalized(body),
            StmtKind::For { .. } => panic!("for loops must be desugared before ANF"),
            StmtKind::Break | StmtKind::Continue => {}
        }
    }

    fn assert_operands_atomic(e: &Expr) {
        match &e.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                // the right side of an assignment may be one operation deep
                assert!(lhs.is_atom() || matches!(lhs.kind, ExprKind::Index { .. }));
                match &rhs.kind {
                    ExprKind::Binary { lhs, rhs, .. } => {
                        assert!(lhs.is_atom() && rhs.is_atom());
                    }
                    ExprKind::Unary { operand, .. } => assert!(operand.is_atom()),
                    ExprKind::Call { args, .. } => args.iter().for_each(|a| {
                        assert!(a.is_atom());
                    }),
                    ExprKind::Index { array, index } => {
                        assert!(array.is_atom() && index.is_atom());
                    }
                    _ => assert!(rhs.is_atom()),
                }
            }
            ExprKind::Unary { operand, .. } => assert!(operand.is_atom()),
            ExprKind::Call { args, .. } => args.iter().for_each(|a| {
                assert!(a.is_atom());
            }),
            _ => {}
        }
    }

    #[test]
    fn nested_arithmetic_is_lifted() {
        let stmts = normalized_body("int main() { int x = 2 + 3 * 4; return 0; }");

        // _t0 = 3 * 4; _t1 = 2 + _t0; int x = _t1;
        let StmtKind::Expr(first) = &stmts[0].kind else {
            panic!("expected the first lifted assignment");
        };
        let ExprKind::Binary { lhs, .. } = &first.kind else {
            panic!("expected an assignment");
        };
        assert_eq!(lhs.kind, ExprKind::var("_t0"));

        let StmtKind::Expr(second) = &stmts[1].kind else {
            panic!("expected the second lifted assignment");
        };
        let ExprKind::Binary { lhs, .. } = &second.kind else {
            panic!("expected an assignment");
        };
        assert_eq!(lhs.kind, ExprKind::var("_t1"));

        let StmtKind::VarDecl { init: Some(init), .. } = &stmts[2].kind else {
            panic!("expected the declaration");
        };
        assert_eq!(init.kind, ExprKind::var("_t1"));

        stmts.iter().for_each(assert_normalized);
    }

    #[test]
    fn call_arguments_become_atoms() {
        let program = normalize(
            desugar::desugar(
                parse("int f(int a, int b) { return a; } int main() { int y = f(1 + 2, f(3, 4)); return y; }")
                    .unwrap(),
            )
            .unwrap(),
        );
        program.stmts.iter().for_each(assert_normalized);
    }

    #[test]
    fn conditions_become_atoms() {
        let stmts = normalized_body(
            "int main() { int x = 1; if (x * 2 < 10) print x; while (x < 5) x = x + 1; return 0; }",
        );
        stmts.iter().for_each(assert_normalized);
    }

    #[test]
    fn assignment_keeps_single_statement_shape() {
        let stmts = normalized_body("int main() { int x = 0; x = x + 1; return 0; }");

        // x = _t0 where _t0 = x + 1 was lifted
        let StmtKind::Expr(e) = &stmts[2].kind else {
            panic!("expected the assignment");
        };
        let ExprKind::Binary { op: BinaryOp::Assign, lhs, rhs } = &e.kind else {
            panic!("expected an assignment");
        };
        assert_eq!(lhs.kind, ExprKind::var("x"));
        assert!(rhs.is_atom());
    }

    #[test]
    fn short_circuit_becomes_control_flow() {
        let stmts =
            normalized_body("int main() { bool a = true; bool b = a && false; return 0; }");

        // somewhere in the lowering there must be an if guarding the rhs
        assert!(
            stmts.iter().any(|s| matches!(s.kind, StmtKind::If { .. })),
            "expected an if statement from the && lowering"
        );
        stmts.iter().for_each(assert_normalized);
    }

    #[test]
    fn temp_counter_resets_per_instance() {
        let src = "int main() { int x = 1 + 2 * 3; return x; }";
        let once = normalize(desugar::desugar(parse(src).unwrap()).unwrap());
        let again = normalize(desugar::desugar(parse(src).unwrap()).unwrap());
        assert_eq!(once, again);
    }
}
