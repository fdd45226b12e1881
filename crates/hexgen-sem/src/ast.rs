//! Syntax tree of instruction semantics.

use std::fmt;

use crate::lexer::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// `-`
    Neg,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Or,
    And,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    /// Operator for a `BINOP` token, or the operator of an `ASSGOP` token
    /// with the trailing `=` removed.
    #[must_use]
    pub fn from_symbol(sym: &str) -> Option<Self> {
        let op = match sym.strip_suffix('=').unwrap_or(sym) {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "|" => Self::Or,
            "&" => Self::And,
            "^" => Self::Xor,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            _ => return None,
        };
        Some(op)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Or => "|",
            Self::And => "&",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

impl RelOp {
    #[must_use]
    pub fn from_symbol(sym: &str) -> Option<Self> {
        let op = match sym {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<=" => Self::Le,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Operand, macro name or other identifier.
    Id(Token),
    IntCon(Token),
    StrCon(Token),
    Call {
        name: Token,
        args: Vec<Self>,
    },
    Unary {
        op: UnOp,
        expr: Box<Self>,
    },
    Binary {
        op: BinOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Relational {
        op: RelOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Logical {
        op: LogOp,
        left: Box<Self>,
        right: Box<Self>,
    },
}

impl Expr {
    /// Source offset of the leftmost token.
    #[must_use]
    pub fn pos(&self) -> usize {
        match self {
            Self::Id(t) | Self::IntCon(t) | Self::StrCon(t) | Self::Call { name: t, .. } => t.pos,
            Self::Unary { expr, .. } => expr.pos(),
            Self::Binary { left, .. }
            | Self::Relational { left, .. }
            | Self::Logical { left, .. } => left.pos(),
        }
    }
}

/// `target = value` or `target op= value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assign {
    pub target: Token,
    pub op: Option<BinOp>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Also produced by the `c ? (a) : (b)` sugar.
    If {
        cond: Expr,
        then: Box<Self>,
        els: Option<Box<Self>>,
    },
    While {
        cond: Expr,
        body: Box<Self>,
    },
    For {
        init: Option<Assign>,
        cond: Option<Expr>,
        step: Option<Assign>,
        body: Box<Self>,
    },
    Return(Option<Expr>),
    Assign(Assign),
    Call {
        name: Token,
        args: Vec<Expr>,
    },
    Block(Vec<Self>),
    Empty,
    Cancel,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(t) | Self::IntCon(t) | Self::StrCon(t) => f.write_str(&t.text),
            Self::Call { name, args } => {
                write!(f, "{}(", name.text)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Unary { op, expr } => {
                let sym = match op {
                    UnOp::Neg => "-",
                    UnOp::Not => "!",
                    UnOp::BitNot => "~",
                };
                write!(f, "{sym}{expr}")
            }
            Self::Binary { op, left, right } => write!(f, "({left}{}{right})", op.symbol()),
            Self::Relational { op, left, right } => {
                let sym = match op {
                    RelOp::Eq => "==",
                    RelOp::Ne => "!=",
                    RelOp::Le => "<=",
                    RelOp::Lt => "<",
                    RelOp::Ge => ">=",
                    RelOp::Gt => ">",
                };
                write!(f, "({left}{sym}{right})")
            }
            Self::Logical { op, left, right } => {
                let sym = match op {
                    LogOp::And => "&&",
                    LogOp::Or => "||",
                };
                write!(f, "({left}{sym}{right})")
            }
        }
    }
}
