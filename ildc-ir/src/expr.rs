use std::fmt;

use crate::instruction::SourceLocation;

/// Expression tree node with the IL span it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Compile-time constant.
    Constant(Constant),
    /// Method argument by index.
    Argument(u16),
    /// Local variable by index.
    Local(u16),
    /// Binary arithmetic or bitwise operation.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        /// Raises on overflow (`add.ovf` and friends).
        checked_overflow: bool,
        /// Operands are treated as unsigned.
        unsigned: bool,
    },
    /// Assignment: `target = value`
    Assign { target: Box<Expr>, value: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int32(i32),
    Int64(i64),
    Float(f64),
    String(String),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation) -> Self {
        Expr { kind, location }
    }

    pub fn constant(value: Constant, location: SourceLocation) -> Self {
        Expr::new(ExprKind::Constant(value), location)
    }

    /// Build a binary node spanning both operands.
    pub fn binary(op: BinOp, left: Expr, right: Expr, checked_overflow: bool, unsigned: bool) -> Self {
        let location = left.location.span_to(&right.location);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                checked_overflow,
                unsigned,
            },
            location,
        )
    }

    pub fn assign(target: Expr, value: Expr, location: SourceLocation) -> Self {
        Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            location,
        )
    }

    /// The `i32` value if this is an `Int32` constant.
    pub fn as_int32(&self) -> Option<i32> {
        match self.kind {
            ExprKind::Constant(Constant::Int32(v)) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        };
        f.write_str(s)
    }
}
