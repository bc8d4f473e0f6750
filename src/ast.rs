use crate::{Span, SymbolId, Type};

pub type Ident = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Type,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: Type::Unknown,
        }
    }

    /// Whether this expression is an atom in the A-normal-form sense:
    /// a literal or a variable, nothing that requires computation
    pub fn is_atom(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Int(_)
                | ExprKind::Float(_)
                | ExprKind::Bool(_)
                | ExprKind::Str(_)
                | ExprKind::Var { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),

    Var {
        name: Ident,
        /// Filled in by the scope resolver
        symbol: Option<SymbolId>,
    },

    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Call {
        callee: Ident,
        args: Vec<Expr>,
        /// Filled in by the scope resolver
        symbol: Option<SymbolId>,
    },
}

impl ExprKind {
    pub fn var(name: impl Into<Ident>) -> Self {
        ExprKind::Var {
            name: name.into(),
            symbol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equals,
    NotEquals,
    And,
    Or,
    Assign,
    AddAssign,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::NotEquals)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl {
        name: Ident,
        declared: Type,
        init: Option<Expr>,
    },

    Expr(Expr),

    Print(Expr),

    /// Introduces a new lexical scope
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// Desugared away before resolution
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    Return(Option<Expr>),

    Break,

    Continue,

    Function {
        name: Ident,
        return_type: Type,
        params: Vec<(Ident, Type)>,
        body: Box<Stmt>,
    },
}

use ptree::{print_tree, Style, TreeItem};
use std::borrow::Cow;
use std::{fmt, io};

impl Program {
    /// Dump the tree to stdout, one top-level statement per tree
    pub fn pretty_print(&self) -> io::Result<()> {
        for stmt in &self.stmts {
            print_tree(&AstNode::Stmt(stmt.clone()))?;
        }
        Ok(())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Inc => write!(f, "++"),
            UnaryOp::Dec => write!(f, "--"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Rem => write!(f, "%"),
            BinaryOp::Less => write!(f, "<"),
            BinaryOp::LessEq => write!(f, "<="),
            BinaryOp::Greater => write!(f, ">"),
            BinaryOp::GreaterEq => write!(f, ">="),
            BinaryOp::Equals => write!(f, "=="),
            BinaryOp::NotEquals => write!(f, "!="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::Assign => write!(f, "="),
            BinaryOp::AddAssign => write!(f, "+="),
        }
    }
}

/// A statement or expression, unified for tree rendering
#[derive(Clone)]
pub enum AstNode {
    Stmt(Stmt),
    Expr(Expr),
}

impl TreeItem for AstNode {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        let label = match self {
            AstNode::Stmt(stmt) => match &stmt.kind {
                StmtKind::VarDecl { name, declared, .. } => format!("VarDecl {name}: {declared}"),
                StmtKind::Expr(_) => String::from("ExprStmt"),
                StmtKind::Print(_) => String::from("Print"),
                StmtKind::Block(_) => String::from("Block"),
                StmtKind::If { .. } => String::from("If"),
                StmtKind::While { .. } => String::from("While"),
                StmtKind::For { .. } => String::from("For"),
                StmtKind::Return(_) => String::from("Return"),
                StmtKind::Break => String::from("Break"),
                StmtKind::Continue => String::from("Continue"),
                StmtKind::Function { name, return_type, params, .. } => {
                    let params: Vec<String> = params
                        .iter()
                        .map(|(name, ty)| format!("{name}: {ty}"))
                        .collect();
                    format!("Function {name}({}) -> {return_type}", params.join(", "))
                }
            },
            AstNode::Expr(expr) => match &expr.kind {
                ExprKind::Int(x) => format!("Int({x})"),
                ExprKind::Float(x) => format!("Float({x})"),
                ExprKind::Bool(x) => format!("Bool({x})"),
                ExprKind::Str(x) => format!("String({x:?})"),
                ExprKind::Var { name, .. } => format!("Var({name})"),
                ExprKind::Index { .. } => String::from("Index"),
                ExprKind::Unary { op, .. } => format!("Unary({op})"),
                ExprKind::Binary { op, .. } => format!("Binary({op})"),
                ExprKind::Call { callee, .. } => format!("Call({callee})"),
            },
        };
        write!(f, "{}", style.paint(label))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let children = match self {
            AstNode::Stmt(stmt) => match &stmt.kind {
                StmtKind::VarDecl { init, .. } => {
                    init.iter().cloned().map(AstNode::Expr).collect()
                }
                StmtKind::Expr(e) | StmtKind::Print(e) => vec![AstNode::Expr(e.clone())],
                StmtKind::Block(stmts) => stmts.iter().cloned().map(AstNode::Stmt).collect(),
                StmtKind::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let mut children = vec![
                        AstNode::Expr(condition.clone()),
                        AstNode::Stmt((**then_branch).clone()),
                    ];
                    if let Some(else_branch) = else_branch {
                        children.push(AstNode::Stmt((**else_branch).clone()));
                    }
                    children
                }
                StmtKind::While { condition, body } => vec![
                    AstNode::Expr(condition.clone()),
                    AstNode::Stmt((**body).clone()),
                ],
                StmtKind::For {
                    init,
                    condition,
                    increment,
                    body,
                } => {
                    let mut children = Vec::new();
                    if let Some(init) = init {
                        children.push(AstNode::Stmt((**init).clone()));
                    }
                    if let Some(condition) = condition {
                        children.push(AstNode::Expr(condition.clone()));
                    }
                    if let Some(increment) = increment {
                        children.push(AstNode::Expr(increment.clone()));
                    }
                    children.push(AstNode::Stmt((**body).clone()));
                    children
                }
                StmtKind::Return(value) => {
                    value.iter().cloned().map(AstNode::Expr).collect()
                }
                StmtKind::Break | StmtKind::Continue => Vec::new(),
                StmtKind::Function { body, .. } => vec![AstNode::Stmt((**body).clone())],
            },
            AstNode::Expr(expr) => match &expr.kind {
                ExprKind::Int(_)
                | ExprKind::Float(_)
                | ExprKind::Bool(_)
                | ExprKind::Str(_)
                | ExprKind::Var { .. } => Vec::new(),
                ExprKind::Index { array, index } => vec![
                    AstNode::Expr((**array).clone()),
                    AstNode::Expr((**index).clone()),
                ],
                ExprKind::Unary { operand, .. } => vec![AstNode::Expr((**operand).clone())],
                ExprKind::Binary { lhs, rhs, .. } => vec![
                    AstNode::Expr((**lhs).clone()),
                    AstNode::Expr((**rhs).clone()),
                ],
                ExprKind::Call { args, .. } => {
                    args.iter().cloned().map(AstNode::Expr).collect()
                }
            },
        };
        Cow::from(children)
    }
}
