//! Lexer
//!
//! This submodule prepares source code for parsing by splitting the text
//! into easy-to-work-with tokens. The [lex] parser is its main interface.
//!
//! Identifiers of the form `_t<digits>` are rejected here; that prefix is
//! reserved for the temporaries minted by A-normal-form conversion, which
//! is what guarantees their freshness without an alpha-renaming pass.

use std::fmt;

use chumsky::prelude::*;

use crate::Span;

use super::ParseErr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Int(String),
    Float(String),
    Str(String),
    Bool(bool),

    Ident(String),

    KwLet,
    KwFunction,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwPrint,
    KwReturn,
    KwBreak,
    KwContinue,

    KwInt,
    KwFloat,
    KwDouble,
    KwShort,
    KwLong,
    KwUnsigned,
    KwChar,
    KwBool,
    KwVoid,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Equals,
    Bang,
    NotEquals,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    PlusAssign,
    PlusPlus,
    MinusMinus,

    Colon,
    Semicolon,
    Comma,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(x) => write!(f, "{}", x),
            Token::Float(x) => write!(f, "{}", x),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Ident(id) => write!(f, "{}", id),
            Token::KwLet => write!(f, "let"),
            Token::KwFunction => write!(f, "function"),
            Token::KwIf => write!(f, "if"),
            Token::KwElse => write!(f, "else"),
            Token::KwWhile => write!(f, "while"),
            Token::KwFor => write!(f, "for"),
            Token::KwPrint => write!(f, "print"),
            Token::KwReturn => write!(f, "return"),
            Token::KwBreak => write!(f, "break"),
            Token::KwContinue => write!(f, "continue"),
            Token::KwInt => write!(f, "int"),
            Token::KwFloat => write!(f, "float"),
            Token::KwDouble => write!(f, "double"),
            Token::KwShort => write!(f, "short"),
            Token::KwLong => write!(f, "long"),
            Token::KwUnsigned => write!(f, "unsigned"),
            Token::KwChar => write!(f, "char"),
            Token::KwBool => write!(f, "bool"),
            Token::KwVoid => write!(f, "void"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Assign => write!(f, "="),
            Token::Equals => write!(f, "=="),
            Token::Bang => write!(f, "!"),
            Token::NotEquals => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::LessEq => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEq => write!(f, ">="),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::PlusAssign => write!(f, "+="),
            Token::PlusPlus => write!(f, "++"),
            Token::MinusMinus => write!(f, "--"),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::ParenOpen => write!(f, "("),
            Token::ParenClose => write!(f, ")"),
            Token::BraceOpen => write!(f, "{{"),
            Token::BraceClose => write!(f, "}}"),
            Token::BracketOpen => write!(f, "["),
            Token::BracketClose => write!(f, "]"),
        }
    }
}

/// Whether a name is reserved for A-normal-form temporaries
pub fn is_reserved_temp(name: &str) -> bool {
    name.strip_prefix("_t")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Tokenize source code
pub fn lex() -> impl Parser<char, Vec<(Token, Span)>, Error = ParseErr<char>> {
    let integer = text::int(10).map(Token::Int);

    let float = text::int(10)
        .chain::<char, _, _>(just('.').chain(text::digits(10)))
        .collect::<String>()
        .map(Token::Float);

    let string = just('"')
        .ignore_then(filter(|c: &char| *c != '"' && *c != '\n').repeated().collect::<String>())
        .then_ignore(just('"'))
        .map(Token::Str);

    let symbol = choice((
        just("==").to(Token::Equals),
        just("!=").to(Token::NotEquals),
        just("<=").to(Token::LessEq),
        just(">=").to(Token::GreaterEq),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
        just("+=").to(Token::PlusAssign),
        just("++").to(Token::PlusPlus),
        just("--").to(Token::MinusMinus),
        one_of("+-*/%=!<>:;,(){}[]").map(|symb: char| match symb {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => Token::Assign,
            '!' => Token::Bang,
            '<' => Token::Less,
            '>' => Token::Greater,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '(' => Token::ParenOpen,
            ')' => Token::ParenClose,
            '{' => Token::BraceOpen,
            '}' => Token::BraceClose,
            '[' => Token::BracketOpen,
            ']' => Token::BracketClose,
            _ => unreachable!(),
        }),
    ));

    let kw_or_ident = text::ident().try_map(|ident: String, span: Span| {
        Ok(match ident.as_str() {
            "let" => Token::KwLet,
            "function" => Token::KwFunction,
            "if" => Token::KwIf,
            "else" => Token::KwElse,
            "while" => Token::KwWhile,
            "for" => Token::KwFor,
            "print" => Token::KwPrint,
            "return" => Token::KwReturn,
            "break" => Token::KwBreak,
            "continue" => Token::KwContinue,
            "int" => Token::KwInt,
            "float" => Token::KwFloat,
            "double" => Token::KwDouble,
            "short" => Token::KwShort,
            "long" => Token::KwLong,
            "unsigned" => Token::KwUnsigned,
            "char" => Token::KwChar,
            "bool" => Token::KwBool,
            "void" => Token::KwVoid,
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => {
                if is_reserved_temp(&ident) {
                    return Err(Simple::custom(
                        span,
                        format!("The name `{ident}` is reserved for compiler temporaries"),
                    ));
                }
                Token::Ident(ident)
            }
        })
    });

    let token = float.or(integer).or(string).or(symbol).or(kw_or_ident);

    let line_comment = just("//")
        .then(take_until(just('\n').ignored().or(end())))
        .padded();
    let block_comment = just("/*").then(take_until(just("*/"))).padded();
    let comment = line_comment.ignored().or(block_comment.ignored());

    token
        .map_with_span(|tok, span| (tok, span))
        .padded_by(comment.repeated())
        .padded()
        .repeated()
        .then_ignore(end())
}
