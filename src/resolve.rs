//! Scope resolution
//!
//! A single top-down traversal that binds every name use to its
//! declaration. Top-level functions are hoisted into the global scope by
//! a pre-pass so mutual recursion resolves; variables only become
//! visible at their declaration. The returned [`SymbolTable`] owns the
//! symbols and outlives the remaining passes.
//!
//! Assignment never declares. The single exception is the reserved
//! `_t<digits>` temporaries introduced by A-normal-form conversion
//! through plain assignments; their first assignment declares them. The
//! lexer rejects the prefix in user code, so no user name can collide.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::parsing::lexer::is_reserved_temp;
use crate::{Span, SymbolId, SymbolKind, SymbolTable};

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("Redeclaration of {kind} '{name}'")]
    Redeclaration {
        kind: SymbolKind,
        name: String,

        #[label("declared again here")]
        span: Span,
    },

    #[error("Use of undeclared variable '{name}'")]
    UndeclaredName {
        name: String,

        #[label("unknown name")]
        span: Span,
    },

    #[error("Assignment to undeclared variable '{name}'")]
    AssignmentToUndeclared {
        name: String,

        #[label("unknown name")]
        span: Span,
    },

    #[error("Call to undeclared function '{name}'")]
    UndeclaredFunction {
        name: String,

        #[label("unknown function")]
        span: Span,
    },

    #[error("Attempt to call non-function '{name}'")]
    NotCallable {
        name: String,

        #[label("not a function")]
        span: Span,
    },

    #[error("Invalid assignment target")]
    InvalidAssignTarget {
        #[label("cannot assign to this")]
        span: Span,
    },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::Redeclaration { span, .. }
            | ResolveError::UndeclaredName { span, .. }
            | ResolveError::AssignmentToUndeclared { span, .. }
            | ResolveError::UndeclaredFunction { span, .. }
            | ResolveError::NotCallable { span, .. }
            | ResolveError::InvalidAssignTarget { span } => *span,
        }
    }
}

/// Bind every name in the program, returning the filled symbol table
pub fn resolve(program: &mut Program) -> Result<SymbolTable, ResolveError> {
    let mut resolver = Resolver {
        table: SymbolTable::new(),
    };

    resolver.hoist_functions(program)?;
    for stmt in &mut program.stmts {
        resolver.resolve_stmt(stmt)?;
    }

    Ok(resolver.table)
}

struct Resolver {
    table: SymbolTable,
}

impl Resolver {
    /// Declare all top-level functions before resolving any body
    fn hoist_functions(&mut self, program: &Program) -> Result<(), ResolveError> {
        for stmt in &program.stmts {
            if let StmtKind::Function {
                name,
                return_type,
                params,
                ..
            } = &stmt.kind
            {
                let id = self.declare(name, SymbolKind::Function, stmt.span)?;
                let symbol = self.table.get_mut(id);
                symbol.ty = return_type.clone();
                symbol.param_types = params.iter().map(|(_, ty)| ty.clone()).collect();
            }
        }
        Ok(())
    }

    fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> Result<SymbolId, ResolveError> {
        self.table
            .declare(name, kind)
            .ok_or_else(|| ResolveError::Redeclaration {
                kind,
                name: name.to_owned(),
                span,
            })
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt) -> Result<(), ResolveError> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Block(stmts) => {
                self.table.enter_scope();
                for s in stmts {
                    self.resolve_stmt(s)?;
                }
                self.table.exit_scope();
            }

            StmtKind::VarDecl { name, declared, init } => {
                let id = self.declare(name, SymbolKind::Variable, span)?;
                self.table.get_mut(id).ty = declared.clone();

                if let Some(init) = init {
                    self.resolve_expr(init)?;
                }
            }

            StmtKind::Function { params, body, .. } => {
                // the function symbol itself was declared by the pre-pass
                self.table.enter_scope();
                for (name, ty) in params.iter() {
                    let id = self.declare(name, SymbolKind::Variable, span)?;
                    self.table.get_mut(id).ty = ty.clone();
                }
                self.resolve_stmt(body)?;
                self.table.exit_scope();
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }

            StmtKind::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            // the for head and body share one scope so init-declared
            // names are visible in the condition and increment
            StmtKind::For {
                init,
                condition,
                increment,
                body,
            } => {
                self.table.enter_scope();
                if let Some(init) = init {
                    self.resolve_stmt(init)?;
                }
                if let Some(condition) = condition {
                    self.resolve_expr(condition)?;
                }
                if let Some(increment) = increment {
                    self.resolve_expr(increment)?;
                }
                self.resolve_stmt(body)?;
                self.table.exit_scope();
            }

            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value)?;
                }
            }

            StmtKind::Expr(e) | StmtKind::Print(e) => self.resolve_expr(e)?,

            StmtKind::Break | StmtKind::Continue => {}
        }
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &mut Expr) -> Result<(), ResolveError> {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Var { name, symbol } => {
                let Some(id) = self.table.lookup(name) else {
                    return Err(ResolveError::UndeclaredName {
                        name: name.clone(),
                        span,
                    });
                };
                *symbol = Some(id);
            }

            ExprKind::Index { array, index } => {
                self.resolve_expr(array)?;
                self.resolve_expr(index)?;
            }

            ExprKind::Binary {
                op: BinaryOp::Assign,
                lhs,
                rhs,
            } => {
                self.resolve_assign_target(lhs)?;
                self.resolve_expr(rhs)?;
            }

            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)?;
            }

            ExprKind::Unary { operand, .. } => self.resolve_expr(operand)?,

            ExprKind::Call { callee, args, symbol } => {
                let Some(id) = self.table.lookup(callee) else {
                    return Err(ResolveError::UndeclaredFunction {
                        name: callee.clone(),
                        span,
                    });
                };
                if self.table.get(id).kind != SymbolKind::Function {
                    return Err(ResolveError::NotCallable {
                        name: callee.clone(),
                        span,
                    });
                }
                *symbol = Some(id);

                for arg in args {
                    self.resolve_expr(arg)?;
                }
            }

            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Bool(_) | ExprKind::Str(_) => {}
        }
        Ok(())
    }

    fn resolve_assign_target(&mut self, target: &mut Expr) -> Result<(), ResolveError> {
        let span = target.span;
        match &mut target.kind {
            ExprKind::Var { name, symbol } => match self.table.lookup(name) {
                Some(id) => *symbol = Some(id),
                None if is_reserved_temp(name) => {
                    let id = self.declare(&name.clone(), SymbolKind::Variable, span)?;
                    *symbol = Some(id);
                }
                None => {
                    return Err(ResolveError::AssignmentToUndeclared {
                        name: name.clone(),
                        span,
                    });
                }
            },

            ExprKind::Index { array, index } => {
                self.resolve_expr(array)?;
                self.resolve_expr(index)?;
            }

            _ => return Err(ResolveError::InvalidAssignTarget { span }),
        }
        Ok(())
    }
}
