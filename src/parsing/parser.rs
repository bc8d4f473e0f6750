use std::collections::HashSet;

use chumsky::prelude::*;

use super::lexer::Token;
use super::ParseErr;

use crate::ast::{self, BinaryOp, ExprKind, StmtKind, UnaryOp};
use crate::{Span, Type};

pub fn parser() -> impl Parser<Token, ast::Program, Error = ParseErr<Token>> {
    let ident = select! { Token::Ident(ident) => ident }.labelled("identifier");

    let typ = {
        let unsigned = just(Token::KwUnsigned)
            .ignore_then(
                choice((
                    just(Token::KwInt).to(32u8),
                    just(Token::KwShort).to(16u8),
                    just(Token::KwLong).to(64u8),
                    just(Token::KwChar).to(8u8),
                ))
                .or_not(),
            )
            .map(|bits| Type::Int {
                bits: bits.unwrap_or(32),
                unsigned: true,
            });

        choice((
            just(Token::KwInt).to(Type::int()),
            just(Token::KwShort).to(Type::Int {
                bits: 16,
                unsigned: false,
            }),
            just(Token::KwLong).to(Type::Int {
                bits: 64,
                unsigned: false,
            }),
            unsigned,
            just(Token::KwFloat).to(Type::Float { bits: 32 }),
            just(Token::KwDouble).to(Type::double()),
            just(Token::KwBool).to(Type::Bool),
            just(Token::KwChar).to(Type::Char),
            just(Token::KwVoid).to(Type::Void),
        ))
        .labelled("type")
    };

    let expr = recursive(|expr| {
        let int_lit = select! { Token::Int(x) => x }.try_map(|x: String, span: Span| {
            x.parse::<i64>()
                .map(ExprKind::Int)
                .map_err(|_| Simple::custom(span, "Integer literal is too large"))
        });

        let float_lit = select! { Token::Float(x) => x }.try_map(|x: String, span: Span| {
            x.parse::<f64>()
                .map(ExprKind::Float)
                .map_err(|_| Simple::custom(span, "Invalid number literal"))
        });

        let val = select! {
            Token::Bool(x) => ExprKind::Bool(x),
            Token::Str(x) => ExprKind::Str(x),
        }
        .labelled("value");

        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing();

        let call = ident
            .then(items.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)))
            .map(|(callee, args)| ExprKind::Call {
                callee,
                args,
                symbol: None,
            });

        let var = ident.map(ExprKind::var);

        let atom = choice((int_lit, float_lit, val, call, var))
            .map_with_span(ast::Expr::new)
            .or(expr
                .clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)));

        let postfix = atom
            .then(
                expr.clone()
                    .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                    .map_with_span(|index, span: Span| (index, span))
                    .repeated(),
            )
            .foldl(|array, (index, span)| {
                let span = Span::new(array.span.start, span.end);
                ast::Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    span,
                )
            });

        let unary = just(Token::Bang)
            .to(UnaryOp::Not)
            .or(just(Token::Minus).to(UnaryOp::Neg))
            .map_with_span(|op, span: Span| (op, span))
            .repeated()
            .then(postfix)
            .foldr(|(op, op_span), operand| {
                let span = Span::new(op_span.start, operand.span.end);
                ast::Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                )
            });

        let product = unary
            .clone()
            .then(
                choice((
                    just(Token::Star).to(BinaryOp::Mul),
                    just(Token::Slash).to(BinaryOp::Div),
                    just(Token::Percent).to(BinaryOp::Rem),
                ))
                .then(unary)
                .repeated(),
            )
            .foldl(binary);

        let sum = product
            .clone()
            .then(
                just(Token::Plus)
                    .to(BinaryOp::Add)
                    .or(just(Token::Minus).to(BinaryOp::Sub))
                    .then(product)
                    .repeated(),
            )
            .foldl(binary);

        let comparison = sum
            .clone()
            .then(
                choice((
                    just(Token::LessEq).to(BinaryOp::LessEq),
                    just(Token::Less).to(BinaryOp::Less),
                    just(Token::GreaterEq).to(BinaryOp::GreaterEq),
                    just(Token::Greater).to(BinaryOp::Greater),
                ))
                .then(sum)
                .repeated(),
            )
            .foldl(binary);

        let equality = comparison
            .clone()
            .then(
                just(Token::Equals)
                    .to(BinaryOp::Equals)
                    .or(just(Token::NotEquals).to(BinaryOp::NotEquals))
                    .then(comparison)
                    .repeated(),
            )
            .foldl(binary);

        let logic_and = equality
            .clone()
            .then(just(Token::AndAnd).to(BinaryOp::And).then(equality).repeated())
            .foldl(binary);

        let logic_or = logic_and
            .clone()
            .then(just(Token::OrOr).to(BinaryOp::Or).then(logic_and).repeated())
            .foldl(binary);

        // assignment is right-associative and its target must be a
        // variable or an index expression
        logic_or
            .then(
                just(Token::Assign)
                    .to(BinaryOp::Assign)
                    .or(just(Token::PlusAssign).to(BinaryOp::AddAssign))
                    .then(expr.clone())
                    .or_not(),
            )
            .try_map(|(target, assign), span: Span| match assign {
                None => Ok(target),
                Some((op, value)) => {
                    if matches!(target.kind, ExprKind::Var { .. } | ExprKind::Index { .. }) {
                        let span = Span::new(target.span.start, value.span.end);
                        Ok(ast::Expr::new(
                            ExprKind::Binary {
                                op,
                                lhs: Box::new(target),
                                rhs: Box::new(value),
                            },
                            span,
                        ))
                    } else {
                        Err(Simple::custom(span, "Invalid assignment target"))
                    }
                }
            })
    });

    let array_size = select! { Token::Int(x) => x }
        .try_map(|x: String, span: Span| {
            x.parse::<usize>()
                .map_err(|_| Simple::custom(span, "Invalid array size"))
        })
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

    let var_decl = typ
        .clone()
        .then(array_size.or_not())
        .then(ident)
        .then(just(Token::Assign).ignore_then(expr.clone()).or_not())
        .then_ignore(just(Token::Semicolon))
        .map_with_span(|(((base, size), name), init), span: Span| {
            let declared = match size {
                Some(size) => Type::array(base, size),
                None => base,
            };
            ast::Stmt::new(StmtKind::VarDecl { name, declared, init }, span)
        });

    let stmt = recursive(|stmt| {
        let block = stmt
            .clone()
            .repeated()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map_with_span(|stmts, span: Span| ast::Stmt::new(StmtKind::Block(stmts), span));

        let if_stmt = just(Token::KwIf)
            .map_with_span(|_, span: Span| span.start)
            .then(
                expr.clone()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .then(stmt.clone())
            .then(just(Token::KwElse).ignore_then(stmt.clone()).or_not())
            .map(|(((start, condition), then_branch), else_branch)| {
                let end = else_branch
                    .as_ref()
                    .map_or(then_branch.span.end, |e| e.span.end);
                ast::Stmt::new(
                    StmtKind::If {
                        condition,
                        then_branch: Box::new(then_branch),
                        else_branch: else_branch.map(Box::new),
                    },
                    Span::new(start, end),
                )
            });

        let while_stmt = just(Token::KwWhile)
            .map_with_span(|_, span: Span| span.start)
            .then(
                expr.clone()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .then(stmt.clone())
            .map(|((start, condition), body)| {
                let span = Span::new(start, body.span.end);
                ast::Stmt::new(
                    StmtKind::While {
                        condition,
                        body: Box::new(body),
                    },
                    span,
                )
            });

        let expr_stmt = expr.clone().then_ignore(just(Token::Semicolon)).map(|e| {
            let span = e.span;
            ast::Stmt::new(StmtKind::Expr(e), span)
        });

        // ++/-- are only legal as a whole statement or a for increment
        let inc_dec_op = just(Token::PlusPlus)
            .to(UnaryOp::Inc)
            .or(just(Token::MinusMinus).to(UnaryOp::Dec));

        let var_operand = ident.map_with_span(|name, span: Span| {
            ast::Expr::new(ExprKind::var(name), span)
        });

        let inc_dec_expr = inc_dec_op
            .clone()
            .then(var_operand.clone())
            .or(var_operand.then(inc_dec_op).map(|(operand, op)| (op, operand)))
            .map_with_span(|(op, operand), span: Span| {
                ast::Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                )
            });

        let for_init = choice((
            var_decl.clone().map(Some),
            expr_stmt.clone().map(Some),
            just(Token::Semicolon).map(|_| None),
        ));

        let for_stmt = just(Token::KwFor)
            .map_with_span(|_, span: Span| span.start)
            .then_ignore(just(Token::ParenOpen))
            .then(for_init)
            .then(expr.clone().or_not())
            .then_ignore(just(Token::Semicolon))
            .then(inc_dec_expr.clone().or(expr.clone()).or_not())
            .then_ignore(just(Token::ParenClose))
            .then(stmt.clone())
            .map(|((((start, init), condition), increment), body)| {
                let span = Span::new(start, body.span.end);
                ast::Stmt::new(
                    StmtKind::For {
                        init: init.map(Box::new),
                        condition,
                        increment,
                        body: Box::new(body),
                    },
                    span,
                )
            });

        let print_stmt = just(Token::KwPrint)
            .map_with_span(|_, span: Span| span.start)
            .then(expr.clone())
            .then_ignore(just(Token::Semicolon))
            .map(|(start, value)| {
                let span = Span::new(start, value.span.end);
                ast::Stmt::new(StmtKind::Print(value), span)
            });

        let return_stmt = just(Token::KwReturn)
            .map_with_span(|_, span: Span| span)
            .then(expr.clone().or_not())
            .then_ignore(just(Token::Semicolon))
            .map(|(kw_span, value)| {
                let span = value
                    .as_ref()
                    .map_or(kw_span, |v| Span::new(kw_span.start, v.span.end));
                ast::Stmt::new(StmtKind::Return(value), span)
            });

        let break_stmt = just(Token::KwBreak)
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|_, span: Span| ast::Stmt::new(StmtKind::Break, span));

        let continue_stmt = just(Token::KwContinue)
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|_, span: Span| ast::Stmt::new(StmtKind::Continue, span));

        let inc_dec_stmt = inc_dec_expr
            .then_ignore(just(Token::Semicolon))
            .map(|e| {
                let span = e.span;
                ast::Stmt::new(StmtKind::Expr(e), span)
            });

        choice((
            var_decl.clone(),
            if_stmt,
            while_stmt,
            for_stmt,
            print_stmt,
            return_stmt,
            break_stmt,
            continue_stmt,
            block,
            inc_dec_stmt,
            expr_stmt,
        ))
        .labelled("statement")
    });

    let block = stmt
        .clone()
        .repeated()
        .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
        .map_with_span(|stmts, span: Span| ast::Stmt::new(StmtKind::Block(stmts), span));

    let param = typ.clone().then(ident).map(|(ty, name)| (name, ty));

    let function = typ
        .map_with_span(|ty, span: Span| (ty, span.start))
        .then(ident)
        .then(
            param
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .then(block)
        .try_map(|((((return_type, start), name), params), body), span: Span| {
            let mut seen = HashSet::new();
            for (param, _) in &params {
                if !seen.insert(param.clone()) {
                    return Err(Simple::custom(
                        span,
                        format!("Duplicate parameter name `{param}`"),
                    ));
                }
            }

            let span = Span::new(start, body.span.end);
            Ok(ast::Stmt::new(
                StmtKind::Function {
                    name,
                    return_type,
                    params,
                    body: Box::new(body),
                },
                span,
            ))
        });

    function
        .repeated()
        .map(|stmts| ast::Program { stmts })
        .then_ignore(end())
}

fn binary(lhs: ast::Expr, (op, rhs): (BinaryOp, ast::Expr)) -> ast::Expr {
    let span = Span::new(lhs.span.start, rhs.span.end);
    ast::Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
