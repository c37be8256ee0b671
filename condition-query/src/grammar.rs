//! The allow-list that turns a general expression into a condition.
//!
//! Only five node kinds may appear in a condition: the
//! [`Expression`] root, `and`/`or` combinations, comparisons using one
//! of the eight [`Comparator`]s, names, and literals. [`walk`] checks
//! each node against that list before looking inside it, and hands
//! the pieces it accepts to a [`Visitor`].
//!
//! Comparisons reach the visitor already split into adjacent pairs, so
//! `10 < price <= 20` arrives as `10 < price` and `price <= 20`.

use std::fmt;

use thiserror::Error;

use crate::ast::{BoolOperator, CmpOp, Expression, Literal, Node};
use crate::registry::Comparator;

/// Errors produced while walking an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A node of a kind conditions may not contain, named by kind.
    #[error("{0}")]
    Disallowed(&'static str),
    /// An allowed node in a position it can't occupy, or a
    /// comparison whose operators and operands don't line up.
    #[error("{0}")]
    Structure(String),
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'t> {
    Identifier(&'t str),
    Literal(&'t Literal),
}

impl Operand<'_> {
    pub fn is_identifier(&self) -> bool {
        matches!(self, Operand::Identifier(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Literal(_))
    }
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Identifier(name) => f.write_str(name),
            Operand::Literal(literal) => write!(f, "{}", literal),
        }
    }
}

/// A single `left op right` step of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison<'t> {
    pub left: Operand<'t>,
    pub op: Comparator,
    pub right: Operand<'t>,
}

impl<'t> Comparison<'t> {
    fn literal_first(&self) -> bool {
        self.left.is_literal() && self.right.is_identifier()
    }

    /// Move an identifier written on the right over to the left,
    /// leaving the operator as written.
    pub fn normalise(self) -> Self {
        if self.literal_first() {
            Comparison {
                left: self.right,
                op: self.op,
                right: self.left,
            }
        } else {
            self
        }
    }

    /// Move an identifier written on the right over to the left, and
    /// mirror the operator so the comparison means the same thing.
    pub fn reorient(self) -> Self {
        if self.literal_first() {
            Comparison {
                left: self.right,
                op: self.op.mirror(),
                right: self.left,
            }
        } else {
            self
        }
    }
}

/// Receives the accepted parts of an expression from [`walk`].
///
/// Results are produced bottom up: the values passed to
/// [`visit_bool_op`](Visitor::visit_bool_op) are the outputs for each
/// child, in the order they were written.
pub trait Visitor<'t> {
    type Output;
    type Error: From<GrammarError>;

    /// Called once at the root, before anything else is visited.
    fn enter_expression(&mut self) {}

    fn visit_bool_op(
        &mut self,
        op: BoolOperator,
        values: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_compare(&mut self, pairs: Vec<Comparison<'t>>) -> Result<Self::Output, Self::Error>;
}

fn operand(node: &Node) -> Result<Operand<'_>, GrammarError> {
    match node {
        Node::Name { id } => Ok(Operand::Identifier(id)),
        Node::Constant(literal) => Ok(Operand::Literal(literal)),
        Node::BoolOp { .. } | Node::Compare { .. } => Err(GrammarError::Structure(format!(
            "{} cannot be used as an operand",
            node.kind()
        ))),
        other => Err(GrammarError::Disallowed(other.kind())),
    }
}

/// Split a chained comparison into adjacent pairs.
///
/// `a < b <= c` becomes `[(a, <, b), (b, <=, c)]`.
pub fn pairs<'t>(
    left: &'t Node,
    ops: &[CmpOp],
    comparators: &'t [Node],
) -> Result<Vec<Comparison<'t>>, GrammarError> {
    if ops.is_empty() || ops.len() != comparators.len() {
        return Err(GrammarError::Structure(format!(
            "comparison has {} operators for {} operands",
            ops.len(),
            comparators.len() + 1
        )));
    }
    let mut result = Vec::with_capacity(ops.len());
    let mut lhs = operand(left)?;
    for (op, comparator) in ops.iter().zip(comparators) {
        let op = Comparator::try_from(*op)?;
        let rhs = operand(comparator)?;
        result.push(Comparison {
            left: lhs,
            op,
            right: rhs,
        });
        lhs = rhs;
    }
    Ok(result)
}

fn walk_node<'t, V>(node: &'t Node, visitor: &mut V) -> Result<V::Output, V::Error>
where
    V: Visitor<'t>,
{
    match node {
        Node::BoolOp { op, values } => {
            let results = values
                .iter()
                .map(|value| walk_node(value, visitor))
                .collect::<Result<Vec<_>, _>>()?;
            visitor.visit_bool_op(*op, results)
        }
        Node::Compare {
            left,
            ops,
            comparators,
        } => {
            let pairs = pairs(left, ops, comparators)?;
            visitor.visit_compare(pairs)
        }
        Node::Name { .. } | Node::Constant(_) => Err(GrammarError::Structure(format!(
            "expected a comparison, found {}",
            node.kind()
        ))
        .into()),
        other => Err(GrammarError::Disallowed(other.kind()).into()),
    }
}

/// Walk `expression`, rejecting anything outside the condition
/// grammar, and return the visitor's output for the root.
pub fn walk<'t, V>(expression: &'t Expression, visitor: &mut V) -> Result<V::Output, V::Error>
where
    V: Visitor<'t>,
{
    visitor.enter_expression();
    walk_node(&expression.body, visitor)
}
