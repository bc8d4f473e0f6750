//! CPS lowering
//!
//! Converts the normalized, typed, bool-lowered AST into the four-node
//! CPS IR. A continuation threads through the conversion: either the
//! name of a continuation (ultimately the distinguished `_halt`) or the
//! already-lowered rest of a statement sequence. Blocks fold
//! right-to-left so each statement's result becomes the continuation of
//! the one before it.
//!
//! Assignments whose right side is a real operation become `Let`
//! bindings named after their target. Pure copies contribute no IR node
//! at all; materializing the stores is the business of a later pass
//! outside this crate. Loops and array indexing have no encoding in
//! this IR and are reported as unsupported; the machine-code backend
//! consumes the typed AST instead.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::ir::{self, CpsExpr};
use crate::Span;

/// The distinguished top-level continuation
pub const HALT: &str = "_halt";

/// The print builtin the backend routes by operand type
pub const PRINT: &str = "_print";

#[derive(Debug, Error, Diagnostic)]
pub enum LoweringError {
    #[error("Cannot lower {what} to continuation-passing style")]
    Unsupported {
        what: &'static str,

        #[label("here")]
        span: Span,
    },

    #[error("Expected an atomic operand; the tree is not in A-normal form")]
    NotAtomic {
        #[label("this operand")]
        span: Span,
    },
}

impl LoweringError {
    pub fn span(&self) -> Span {
        match self {
            LoweringError::Unsupported { span, .. } | LoweringError::NotAtomic { span } => *span,
        }
    }
}

type Result<T> = std::result::Result<T, LoweringError>;

/// Lower a whole program with a fresh temp counter
pub fn lower(program: &Program) -> Result<ir::Program> {
    Lowerer::default().lower_program(program)
}

#[derive(Debug, Default)]
pub struct Lowerer {
    temp_counter: usize,
}

/// What happens with the value produced at the current point
#[derive(Clone)]
enum Cont {
    /// Call a named continuation with the value
    Name(String),
    /// Run already-lowered code; the value is discarded
    Code(Box<CpsExpr>),
}

impl Cont {
    fn apply(self, value: String) -> CpsExpr {
        match self {
            Cont::Name(k) => CpsExpr::call(k, vec![value]),
            Cont::Code(code) => *code,
        }
    }
}

impl Lowerer {
    fn fresh_temp(&mut self) -> String {
        let name = format!("_k{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub fn lower_program(&mut self, program: &Program) -> Result<ir::Program> {
        let mut functions = Vec::new();
        for stmt in &program.stmts {
            if let StmtKind::Function {
                name, params, body, ..
            } = &stmt.kind
            {
                let body = self.lower_stmt(body, Cont::Name(HALT.into()))?;
                functions.push(ir::Function {
                    name: name.clone(),
                    params: params.iter().map(|(name, _)| name.clone()).collect(),
                    body,
                });
            }
        }
        Ok(ir::Program { functions })
    }

    fn lower_stmt(&mut self, stmt: &Stmt, cont: Cont) -> Result<CpsExpr> {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.lower_stmts(stmts, cont),

            StmtKind::Expr(e) => self.lower_expr(e, cont),

            StmtKind::Print(e) => {
                let arg = name_of(e)?;
                let result = self.fresh_temp();
                Ok(CpsExpr::Let {
                    var: result.clone(),
                    rhs: Box::new(CpsExpr::call(PRINT, vec![arg])),
                    body: Box::new(cont.apply(result)),
                })
            }

            StmtKind::VarDecl { name, init, .. } => match init {
                Some(init) if !init.is_atom() => self.lower_binding(name, init, cont),
                Some(init) => Ok(cont.apply(name_of(init)?)),
                None => Ok(cont.apply(String::from("0"))),
            },

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = name_of(condition)?;
                let then_branch = self.lower_stmt(then_branch, cont.clone())?;
                let else_branch = match else_branch {
                    Some(else_branch) => self.lower_stmt(else_branch, cont)?,
                    None => cont.apply(String::from("0")),
                };
                Ok(CpsExpr::If {
                    cond,
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                })
            }

            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => name_of(value)?,
                    None => String::from("0"),
                };
                Ok(CpsExpr::Return { value })
            }

            StmtKind::While { .. } => Err(LoweringError::Unsupported {
                what: "a while loop",
                span: stmt.span,
            }),
            StmtKind::For { .. } => Err(LoweringError::Unsupported {
                what: "a for loop",
                span: stmt.span,
            }),
            StmtKind::Break => Err(LoweringError::Unsupported {
                what: "break",
                span: stmt.span,
            }),
            StmtKind::Continue => Err(LoweringError::Unsupported {
                what: "continue",
                span: stmt.span,
            }),
            StmtKind::Function { .. } => Err(LoweringError::Unsupported {
                what: "a nested function",
                span: stmt.span,
            }),
        }
    }

    /// Fold a statement sequence right-to-left: the lowered rest of the
    /// sequence is the continuation of its first statement
    fn lower_stmts(&mut self, stmts: &[Stmt], cont: Cont) -> Result<CpsExpr> {
        match stmts.split_first() {
            None => Ok(cont.apply(String::from("0"))),
            Some((first, [])) => self.lower_stmt(first, cont),
            Some((first, rest)) => {
                let rest = self.lower_stmts(rest, cont)?;
                self.lower_stmt(first, Cont::Code(Box::new(rest)))
            }
        }
    }

    fn lower_expr(&mut self, expr: &Expr, cont: Cont) -> Result<CpsExpr> {
        if expr.is_atom() {
            return Ok(cont.apply(name_of(expr)?));
        }

        match &expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs,
                rhs,
            } => match &lhs.kind {
                ExprKind::Var { name, .. } if !rhs.is_atom() => {
                    self.lower_binding(name, rhs, cont)
                }
                // pure copies and index stores pass through to their
                // value; the left side belongs to the store pass
                _ if rhs.is_atom() => Ok(cont.apply(name_of(rhs)?)),
                _ => self.lower_expr(rhs, cont),
            },

            ExprKind::Binary { op, lhs, rhs } => {
                let result = self.fresh_temp();
                let operation =
                    CpsExpr::call(op.to_string(), vec![name_of(lhs)?, name_of(rhs)?]);
                Ok(CpsExpr::Let {
                    var: result.clone(),
                    rhs: Box::new(operation),
                    body: Box::new(cont.apply(result)),
                })
            }

            ExprKind::Unary { op, operand } => {
                let result = self.fresh_temp();
                let operation = CpsExpr::call(unary_name(*op), vec![name_of(operand)?]);
                Ok(CpsExpr::Let {
                    var: result.clone(),
                    rhs: Box::new(operation),
                    body: Box::new(cont.apply(result)),
                })
            }

            ExprKind::Call { callee, args, .. } => {
                let result = self.fresh_temp();
                let args = args.iter().map(name_of).collect::<Result<Vec<_>>>()?;
                Ok(CpsExpr::Let {
                    var: result.clone(),
                    rhs: Box::new(CpsExpr::call(callee.clone(), args)),
                    body: Box::new(cont.apply(result)),
                })
            }

            ExprKind::Index { .. } => Err(LoweringError::Unsupported {
                what: "array indexing",
                span: expr.span,
            }),

            // atoms were handled above
            _ => Err(LoweringError::NotAtomic { span: expr.span }),
        }
    }

    /// `v = <operation>` becomes a `Let` binding named after the target
    fn lower_binding(&mut self, var: &str, rhs: &Expr, cont: Cont) -> Result<CpsExpr> {
        let operation = match &rhs.kind {
            ExprKind::Binary { op, lhs, rhs } => {
                CpsExpr::call(op.to_string(), vec![name_of(lhs)?, name_of(rhs)?])
            }
            ExprKind::Unary { op, operand } => {
                CpsExpr::call(unary_name(*op), vec![name_of(operand)?])
            }
            ExprKind::Call { callee, args, .. } => {
                let args = args.iter().map(name_of).collect::<Result<Vec<_>>>()?;
                CpsExpr::call(callee.clone(), args)
            }
            ExprKind::Index { .. } => {
                return Err(LoweringError::Unsupported {
                    what: "array indexing",
                    span: rhs.span,
                })
            }
            _ => return Err(LoweringError::NotAtomic { span: rhs.span }),
        };

        Ok(CpsExpr::Let {
            var: var.to_owned(),
            rhs: Box::new(operation),
            body: Box::new(cont.apply(var.to_owned())),
        })
    }
}

fn unary_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "neg",
        UnaryOp::Not => "not",
        UnaryOp::Inc => "inc",
        UnaryOp::Dec => "dec",
    }
}

/// The textual name of an atom; literals render as their text
fn name_of(expr: &Expr) -> Result<String> {
    match &expr.kind {
        ExprKind::Var { name, .. } => Ok(name.clone()),
        ExprKind::Int(x) => Ok(x.to_string()),
        ExprKind::Float(x) => Ok(x.to_string()),
        // bool literals were lowered to integers before this pass
        ExprKind::Bool(b) => Ok(String::from(if *b { "1" } else { "0" })),
        ExprKind::Str(s) => Ok(format!("{s:?}")),
        _ => Err(LoweringError::NotAtomic { span: expr.span }),
    }
}
