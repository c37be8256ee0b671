//! The expression tree produced by [`parse`](crate::parsing::parse).
//!
//! The parser accepts a general expression grammar, so this tree can
//! hold arithmetic, calls, attribute access and so forth. Conditions
//! only use a small part of it; the rest exists so that
//! [`grammar`](crate::grammar) can reject it by name.

use std::fmt;

/// A constant written in the condition text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    // Kept as written; the field decides what type it is.
    Number(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => f.write_str(s),
            Literal::Number(n) => f.write_str(n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum BoolOperator {
    And,
    Or,
}

/// Comparison operators, named as in Python's `ast` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    /// The operator as it is written in a condition.
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum UnaryOperator {
    Not,
    USub,
    UAdd,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum BinOperator {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// One node of an expression.
///
/// The variant name is the node's kind, as reported by [`Node::kind`].
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum Node {
    /// `a and b and c`, flattened.
    BoolOp {
        op: BoolOperator,
        values: Vec<Node>,
    },
    /// `left ops[0] comparators[0] ops[1] comparators[1] ...`
    Compare {
        left: Box<Node>,
        ops: Vec<CmpOp>,
        comparators: Vec<Node>,
    },
    Name {
        id: String,
    },
    Constant(Literal),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    BinOp {
        op: BinOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        func: Box<Node>,
        args: Vec<Node>,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
    },
    List {
        elts: Vec<Node>,
    },
    Tuple {
        elts: Vec<Node>,
    },
}

impl Node {
    /// The name of this node's kind, e.g. `"BinOp"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn name(id: impl Into<String>) -> Self {
        Node::Name { id: id.into() }
    }

    pub fn number(text: impl Into<String>) -> Self {
        Node::Constant(Literal::Number(text.into()))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Node::Constant(Literal::Str(text.into()))
    }

    /// Join `first` and `rest` with `op`, or return `first` alone
    /// when there is nothing to join.
    pub(crate) fn bool_op(op: BoolOperator, first: Node, rest: Vec<Node>) -> Node {
        if rest.is_empty() {
            first
        } else {
            let mut values = Vec::with_capacity(rest.len() + 1);
            values.push(first);
            values.extend(rest);
            Node::BoolOp { op, values }
        }
    }
}

/// The root of a parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub body: Node,
}

impl Expression {
    pub const KIND: &'static str = "Expression";
}
