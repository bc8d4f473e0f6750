//! Type checking
//!
//! A post-order traversal that fills the `ty` slot of every expression
//! and verifies the typing rules: operator operand kinds, assignment and
//! call compatibility, return types, and the `main` program rule. After
//! a successful run no expression is left with an unknown type.
//!
//! Conditions and logical operators accept either `bool` or an integer
//! treated as zero/nonzero; comparisons require numeric operands; the
//! only implicit conversion anywhere is integer-to-float widening.
//!
//! The first assignment to a symbol whose type is still unknown adopts
//! the type of the assigned value. Only the `_t` temporaries introduced
//! by A-normal-form conversion are in that state, which is how they get
//! their types without declarations.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::{Span, SymbolTable, Type};

#[derive(Debug, Error, Diagnostic)]
pub enum TypeCheckError {
    #[error("Type mismatch in variable declaration")]
    DeclMismatch {
        declared: Type,
        found: Type,

        #[label("expected '{declared}', found '{found}'")]
        span: Span,
    },

    #[error("Assignment type mismatch")]
    AssignMismatch {
        target: Type,
        value: Type,

        #[label("cannot assign '{value}' to '{target}'")]
        span: Span,
    },

    #[error("Cannot declare variable '{name}' of type void")]
    VoidVariable {
        name: String,

        #[label("declared here")]
        span: Span,
    },

    #[error("Arithmetic requires numeric operands")]
    NonNumericOperand {
        #[label("here")]
        span: Span,
    },

    #[error("'%' requires integer operands")]
    RemainderOperands {
        #[label("here")]
        span: Span,
    },

    #[error("Comparison requires numeric operands")]
    NonNumericComparison {
        #[label("here")]
        span: Span,
    },

    #[error("Equality requires operands of the same type")]
    EqualityMismatch {
        lhs: Type,
        rhs: Type,

        #[label("'{lhs}' against '{rhs}'")]
        span: Span,
    },

    #[error("Logical operator expects bool or int operands")]
    NonBoolean {
        #[label("here")]
        span: Span,
    },

    #[error("Unary '-' expects a numeric operand")]
    NonNumericNegation {
        #[label("here")]
        span: Span,
    },

    #[error("{what} condition must be bool or int")]
    ConditionNotBoolean {
        what: &'static str,

        #[label("this condition")]
        span: Span,
    },

    #[error("Subscripted value is not an array")]
    IndexNotArray {
        #[label("here")]
        span: Span,
    },

    #[error("Array index must be integer")]
    IndexNotInteger {
        #[label("here")]
        span: Span,
    },

    #[error("Cannot print a value of type '{ty}'")]
    UnprintableValue {
        ty: Type,

        #[label("here")]
        span: Span,
    },

    #[error("Incorrect number of arguments: expected {expected}, got {actual}")]
    BadArgumentCount {
        expected: usize,
        actual: usize,

        #[label("this call")]
        span: Span,
    },

    #[error("Argument type mismatch")]
    ArgumentMismatch {
        expected: Type,
        found: Type,

        #[label("expected '{expected}', found '{found}'")]
        span: Span,
    },

    #[error("Return value required")]
    ReturnValueRequired {
        #[label("here")]
        span: Span,
    },

    #[error("Return type mismatch")]
    ReturnTypeMismatch {
        expected: Type,
        found: Type,

        #[label("expected '{expected}', found '{found}'")]
        span: Span,
    },

    #[error("Non-void function must return a value")]
    MissingReturn {
        name: String,

        #[label("function '{name}' has no return")]
        span: Span,
    },

    #[error("Program must define main function")]
    NoMain,

    #[error("main must return int")]
    MainReturnType {
        #[label("here")]
        span: Span,
    },

    #[error("main takes no parameters")]
    MainParameters {
        #[label("here")]
        span: Span,
    },

    #[error("Use of undeclared variable '{name}'")]
    Unresolved {
        name: String,

        #[label("here")]
        span: Span,
    },
}

impl TypeCheckError {
    pub fn span(&self) -> Option<Span> {
        match self {
            TypeCheckError::DeclMismatch { span, .. }
            | TypeCheckError::AssignMismatch { span, .. }
            | TypeCheckError::VoidVariable { span, .. }
            | TypeCheckError::NonNumericOperand { span }
            | TypeCheckError::RemainderOperands { span }
            | TypeCheckError::NonNumericComparison { span }
            | TypeCheckError::EqualityMismatch { span, .. }
            | TypeCheckError::NonBoolean { span }
            | TypeCheckError::NonNumericNegation { span }
            | TypeCheckError::ConditionNotBoolean { span, .. }
            | TypeCheckError::IndexNotArray { span }
            | TypeCheckError::IndexNotInteger { span }
            | TypeCheckError::UnprintableValue { span, .. }
            | TypeCheckError::BadArgumentCount { span, .. }
            | TypeCheckError::ArgumentMismatch { span, .. }
            | TypeCheckError::ReturnValueRequired { span }
            | TypeCheckError::ReturnTypeMismatch { span, .. }
            | TypeCheckError::MissingReturn { span, .. }
            | TypeCheckError::MainReturnType { span }
            | TypeCheckError::MainParameters { span }
            | TypeCheckError::Unresolved { span, .. } => Some(*span),
            TypeCheckError::NoMain => None,
        }
    }
}

type Result<T> = std::result::Result<T, TypeCheckError>;

/// Check the whole program and fill every expression's type
pub fn check(program: &mut Program, symbols: &mut SymbolTable) -> Result<()> {
    let mut checker = TypeChecker {
        symbols,
        current_return: Type::Void,
        has_return: false,
    };

    for stmt in &mut program.stmts {
        checker.check_stmt(stmt)?;
    }

    check_main_rule(program)
}

/// Exactly one `main` returning `int` with no parameters must exist
fn check_main_rule(program: &Program) -> Result<()> {
    for stmt in &program.stmts {
        if let StmtKind::Function {
            name,
            return_type,
            params,
            ..
        } = &stmt.kind
        {
            if name != "main" {
                continue;
            }
            if *return_type != Type::int() {
                return Err(TypeCheckError::MainReturnType { span: stmt.span });
            }
            if !params.is_empty() {
                return Err(TypeCheckError::MainParameters { span: stmt.span });
            }
            return Ok(());
        }
    }
    Err(TypeCheckError::NoMain)
}

struct TypeChecker<'a> {
    symbols: &'a mut SymbolTable,
    current_return: Type,
    has_return: bool,
}

impl TypeChecker<'_> {
    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Expr(e) => {
                self.check_expr(e)?;
            }

            StmtKind::Print(e) => {
                let ty = self.check_expr(e)?;
                if !ty.is_printable() {
                    return Err(TypeCheckError::UnprintableValue { ty, span: e.span });
                }
            }

            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.check_stmt(s)?;
                }
            }

            StmtKind::VarDecl { name, declared, init } => {
                if *declared == Type::Void {
                    return Err(TypeCheckError::VoidVariable {
                        name: name.clone(),
                        span,
                    });
                }

                if let Some(init) = init {
                    let init_ty = self.check_expr(init)?;
                    if !Type::is_assignable(declared, &init_ty) {
                        return Err(TypeCheckError::DeclMismatch {
                            declared: declared.clone(),
                            found: init_ty,
                            span,
                        });
                    }
                }
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition, "If")?;
                self.check_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch)?;
                }
            }

            StmtKind::While { condition, body } => {
                self.check_condition(condition, "While")?;
                self.check_stmt(body)?;
            }

            StmtKind::For {
                init,
                condition,
                increment,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                if let Some(condition) = condition {
                    self.check_condition(condition, "For")?;
                }
                if let Some(increment) = increment {
                    self.check_expr(increment)?;
                }
                self.check_stmt(body)?;
            }

            StmtKind::Return(value) => {
                self.has_return = true;

                match value {
                    None => {
                        if self.current_return != Type::Void {
                            return Err(TypeCheckError::ReturnValueRequired { span });
                        }
                    }
                    Some(value) => {
                        let found = self.check_expr(value)?;
                        if !Type::is_assignable(&self.current_return, &found) {
                            return Err(TypeCheckError::ReturnTypeMismatch {
                                expected: self.current_return.clone(),
                                found,
                                span,
                            });
                        }
                    }
                }
            }

            StmtKind::Function {
                name,
                return_type,
                body,
                ..
            } => {
                self.current_return = return_type.clone();
                self.has_return = false;
                let name = name.clone();
                let non_void = *return_type != Type::Void;

                self.check_stmt(body)?;

                if non_void && !self.has_return {
                    return Err(TypeCheckError::MissingReturn { name, span });
                }
            }

            StmtKind::Break | StmtKind::Continue => {}
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut Expr, what: &'static str) -> Result<()> {
        let ty = self.check_expr(condition)?;
        if ty != Type::Bool && !ty.is_integer() {
            return Err(TypeCheckError::ConditionNotBoolean {
                what,
                span: condition.span,
            });
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Result<Type> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Type::int(),
            ExprKind::Float(_) => Type::double(),
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Str(_) => Type::String,

            ExprKind::Var { name, symbol } => match symbol {
                Some(id) => self.symbols.get(*id).ty.clone(),
                None => {
                    return Err(TypeCheckError::Unresolved {
                        name: name.clone(),
                        span,
                    })
                }
            },

            ExprKind::Index { array, index } => {
                let array_ty = self.check_expr(array)?;
                let index_ty = self.check_expr(index)?;

                let Type::Array { elem, .. } = array_ty else {
                    return Err(TypeCheckError::IndexNotArray { span });
                };
                if !index_ty.is_integer() {
                    return Err(TypeCheckError::IndexNotInteger { span });
                }
                *elem
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operand_ty = self.check_expr(operand)?;
                match op {
                    UnaryOp::Not => {
                        if operand_ty != Type::Bool && !operand_ty.is_integer() {
                            return Err(TypeCheckError::NonBoolean { span });
                        }
                        Type::Bool
                    }
                    UnaryOp::Neg | UnaryOp::Inc | UnaryOp::Dec => {
                        if !operand_ty.is_numeric() {
                            return Err(TypeCheckError::NonNumericNegation { span });
                        }
                        operand_ty
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                match op {
                    BinaryOp::Assign => self.check_assignment(lhs, rhs, span)?,

                    BinaryOp::AddAssign => {
                        let target = self.check_expr(lhs)?;
                        let value = self.check_expr(rhs)?;
                        if !target.is_numeric() || !value.is_numeric() {
                            return Err(TypeCheckError::NonNumericOperand { span });
                        }
                        if !Type::is_assignable(&target, &value) {
                            return Err(TypeCheckError::AssignMismatch { target, value, span });
                        }
                        target
                    }

                    op if op.is_arithmetic() => {
                        let lhs_ty = self.check_expr(lhs)?;
                        let rhs_ty = self.check_expr(rhs)?;
                        if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                            return Err(TypeCheckError::NonNumericOperand { span });
                        }
                        if op == BinaryOp::Rem
                            && !(lhs_ty.is_integer() && rhs_ty.is_integer())
                        {
                            return Err(TypeCheckError::RemainderOperands { span });
                        }
                        join_numeric(&lhs_ty, &rhs_ty)
                    }

                    op if op.is_comparison() => {
                        let lhs_ty = self.check_expr(lhs)?;
                        let rhs_ty = self.check_expr(rhs)?;
                        if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                            return Err(TypeCheckError::NonNumericComparison { span });
                        }
                        Type::Bool
                    }

                    op if op.is_equality() => {
                        let lhs_ty = self.check_expr(lhs)?;
                        let rhs_ty = self.check_expr(rhs)?;
                        let widened = lhs_ty.is_numeric() && rhs_ty.is_numeric();
                        if lhs_ty != rhs_ty && !widened {
                            return Err(TypeCheckError::EqualityMismatch {
                                lhs: lhs_ty,
                                rhs: rhs_ty,
                                span,
                            });
                        }
                        Type::Bool
                    }

                    // logical operators; && and || were usually lowered
                    // into control flow before this pass runs
                    _ => {
                        let lhs_ty = self.check_expr(lhs)?;
                        let rhs_ty = self.check_expr(rhs)?;
                        let lhs_ok = lhs_ty == Type::Bool || lhs_ty.is_integer();
                        let rhs_ok = rhs_ty == Type::Bool || rhs_ty.is_integer();
                        if !lhs_ok || !rhs_ok {
                            return Err(TypeCheckError::NonBoolean { span });
                        }
                        Type::Bool
                    }
                }
            }

            ExprKind::Call { callee, args, symbol } => {
                let Some(id) = symbol else {
                    return Err(TypeCheckError::Unresolved {
                        name: callee.clone(),
                        span,
                    });
                };
                let (param_types, return_type) = {
                    let symbol = self.symbols.get(*id);
                    (symbol.param_types.clone(), symbol.ty.clone())
                };

                if args.len() != param_types.len() {
                    return Err(TypeCheckError::BadArgumentCount {
                        expected: param_types.len(),
                        actual: args.len(),
                        span,
                    });
                }

                for (arg, param) in args.iter_mut().zip(&param_types) {
                    let found = self.check_expr(arg)?;
                    if !Type::is_assignable(param, &found) {
                        return Err(TypeCheckError::ArgumentMismatch {
                            expected: param.clone(),
                            found,
                            span: arg.span,
                        });
                    }
                }

                return_type
            }
        };

        expr.ty = ty.clone();
        Ok(ty)
    }

    fn check_assignment(&mut self, lhs: &mut Expr, rhs: &mut Expr, span: Span) -> Result<Type> {
        // an unknown-typed target is an ANF temporary: its first
        // assignment decides its type
        let adopting = match &lhs.kind {
            ExprKind::Var {
                symbol: Some(id), ..
            } if self.symbols.get(*id).ty == Type::Unknown => Some(*id),
            _ => None,
        };

        if let Some(id) = adopting {
            let value = self.check_expr(rhs)?;
            self.symbols.get_mut(id).ty = value.clone();
            lhs.ty = value.clone();
            return Ok(value);
        }

        let target = self.check_expr(lhs)?;
        let value = self.check_expr(rhs)?;
        if !Type::is_assignable(&target, &value) {
            return Err(TypeCheckError::AssignMismatch { target, value, span });
        }
        Ok(target)
    }
}

/// Join the operand types of an arithmetic operator: floating wins,
/// widths widen, unsignedness is contagious
fn join_numeric(lhs: &Type, rhs: &Type) -> Type {
    let bits = lhs.bit_width().max(rhs.bit_width());
    if lhs.is_float() || rhs.is_float() {
        Type::Float { bits }
    } else {
        let unsigned = matches!(lhs, Type::Int { unsigned: true, .. })
            || matches!(rhs, Type::Int { unsigned: true, .. });
        Type::Int { bits, unsigned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;
    use crate::{anf, desugar, resolve};

    fn analyze(src: &str) -> Result<(Program, SymbolTable)> {
        let program = parse(src).unwrap();
        let program = desugar::desugar(program).unwrap();
        let mut program = anf::normalize(program);
        let mut symbols = resolve::resolve(&mut program).unwrap();
        check(&mut program, &mut symbols)?;
        Ok((program, symbols))
    }

    /// After checking, no expression may be left with an unknown type
    fn assert_typed(stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => stmts.iter().for_each(assert_typed),
            StmtKind::Expr(e) | StmtKind::Print(e) => assert_expr_typed(e),
            StmtKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    assert_expr_typed(init);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                assert_expr_typed(condition);
                assert_typed(then_branch);
                if let Some(else_branch) = else_branch {
                    assert_typed(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                assert_expr_typed(condition);
                assert_typed(body);
            }
            StmtKind::Return(Some(value)) => assert_expr_typed(value),
            StmtKind::Function { body, .. } => assert_typed(body),
            _ => {}
        }
    }

    fn assert_expr_typed(expr: &Expr) {
        assert_ne!(expr.ty, Type::Unknown, "untyped expression: {expr:?}");
        match &expr.kind {
            ExprKind::Unary { operand, .. } => assert_expr_typed(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                assert_expr_typed(lhs);
                assert_expr_typed(rhs);
            }
            ExprKind::Index { array, index } => {
                assert_expr_typed(array);
                assert_expr_typed(index);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(assert_expr_typed),
            _ => {}
        }
    }

    #[test]
    fn every_expression_gets_a_type() {
        let (program, _) = analyze(
            "double scale(double x) { return x * 2.0; } \
             int main() { int a = 2 + 3 * 4; double b = scale(a * 1.0); \
                          if (a < 10) print b; return a; }",
        )
        .unwrap();
        program.stmts.iter().for_each(assert_typed);
    }

    #[test]
    fn assignment_mismatch() {
        let err = analyze("int main() { int x; x = true; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::AssignMismatch { .. }));
    }

    #[test]
    fn declaration_mismatch() {
        let err = analyze("int main() { int x = true; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::DeclMismatch { .. }));
    }

    #[test]
    fn widening_into_float_is_allowed() {
        analyze("int main() { double d = 1; d = 2; return 0; }").unwrap();
    }

    #[test]
    fn narrowing_is_rejected() {
        let err = analyze("int main() { int x = 1.5; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::DeclMismatch { .. }));
    }

    #[test]
    fn arithmetic_requires_numbers() {
        let err = analyze("int main() { int x = true + 1; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::NonNumericOperand { .. }));
    }

    #[test]
    fn remainder_requires_integers() {
        let err = analyze("int main() { double x = 1.5 % 2.0; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::RemainderOperands { .. }));
    }

    #[test]
    fn comparison_requires_numbers() {
        let err = analyze("int main() { bool b = true < false; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::NonNumericComparison { .. }));
    }

    #[test]
    fn equality_requires_same_types() {
        let err = analyze("int main() { bool b = 1 == true; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::EqualityMismatch { .. }));
    }

    #[test]
    fn equality_widens_numerics() {
        analyze("int main() { bool b = 1 == 1.0; print b; return 0; }").unwrap();
    }

    #[test]
    fn condition_must_be_bool_or_int() {
        let err = analyze("int main() { if (1.5) print 1; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::ConditionNotBoolean { .. }));
    }

    #[test]
    fn integer_condition_is_accepted() {
        analyze("int main() { if (1) print 1; while (0) print 0; return 0; }").unwrap();
    }

    #[test]
    fn bad_argument_count() {
        let err = analyze(
            "int f(int a, int b) { return a + b; } int main() { return f(1); }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::BadArgumentCount { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn argument_mismatch() {
        let err =
            analyze("int f(int a) { return a; } int main() { return f(true); }").unwrap_err();
        assert!(matches!(err, TypeCheckError::ArgumentMismatch { .. }));
    }

    #[test]
    fn argument_widening_is_allowed() {
        analyze("double f(double x) { return x; } int main() { double d = f(1); return 0; }")
            .unwrap();
    }

    #[test]
    fn return_type_mismatch() {
        let err = analyze("int main() { return true; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::ReturnTypeMismatch { .. }));
    }

    #[test]
    fn return_value_required() {
        let err = analyze("int f() { return; } int main() { return f(); }").unwrap_err();
        assert!(matches!(err, TypeCheckError::ReturnValueRequired { .. }));
    }

    #[test]
    fn missing_return() {
        let err = analyze("int f() { print 1; } int main() { return f(); }").unwrap_err();
        assert!(matches!(err, TypeCheckError::MissingReturn { .. }));
    }

    #[test]
    fn void_function_needs_no_return() {
        analyze("void log() { print 1; } int main() { log(); return 0; }").unwrap();
    }

    #[test]
    fn no_main() {
        let err = analyze("int f() { return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::NoMain));
    }

    #[test]
    fn main_must_return_int() {
        let err = analyze("void main() { print 1; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::MainReturnType { .. }));
    }

    #[test]
    fn main_takes_no_parameters() {
        let err = analyze("int main(int argc) { return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::MainParameters { .. }));
    }

    #[test]
    fn indexing_rules() {
        analyze("int main() { int[3] xs; xs[0] = 1; print xs[0]; return 0; }").unwrap();

        let err = analyze("int main() { int x = 1; return x[0]; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::IndexNotArray { .. }));

        let err = analyze("int main() { int[3] xs; return xs[1.5]; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::IndexNotInteger { .. }));
    }

    #[test]
    fn arrays_are_not_printable() {
        let err = analyze("int main() { int[2] xs; print xs; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::UnprintableValue { .. }));
    }

    #[test]
    fn void_variables_are_rejected() {
        let err = analyze("int main() { void x; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::VoidVariable { .. }));
    }

    #[test]
    fn string_only_prints() {
        analyze("int main() { print \"hello\"; return 0; }").unwrap();

        let err = analyze("int main() { int x = \"hello\" + 1; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::NonNumericOperand { .. }));
    }

    #[test]
    fn temporaries_adopt_types() {
        // `2 + 3 * 4` lifts `_t` temporaries with no declared type;
        // their first assignment must type them
        let (program, _) = analyze("int main() { int x = 2 + 3 * 4; return x; }").unwrap();
        program.stmts.iter().for_each(assert_typed);
    }

    #[test]
    fn integer_literals_do_not_widen_into_long() {
        let err = analyze("int main() { long a = 1; return 0; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::DeclMismatch { .. }));
    }

    #[test]
    fn short_circuit_lowering_type_checks() {
        analyze(
            "int main() { bool a = true; bool b = false; bool c = a && b; bool d = a || b; \
             if (c) print 1; if (d) print 2; return 0; }",
        )
        .unwrap();
    }
}
