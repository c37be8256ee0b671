//! Translate a condition into a [`Predicate`].
//!
//! The builder trusts that [`ConditionValidator`](crate::validator::ConditionValidator)
//! has already accepted the expression. It still enforces the grammar,
//! since it walks the tree itself, but an error here means the two
//! disagree rather than that the user wrote something wrong.

use log::trace;
use thiserror::Error;

use crate::ast::{BoolOperator, Expression};
use crate::filtering::FilterError;
use crate::grammar::{self, Comparison, GrammarError, Visitor};
use crate::predicate::Predicate;
use crate::registry::FieldRegistry;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("{0} does not exist")]
    UnknownField(String),
    #[error("cannot filter {field} by {value}: {source}")]
    Filter {
        field: String,
        value: String,
        source: FilterError,
    },
}

pub struct PredicateBuilder<'r, R> {
    registry: &'r FieldRegistry<R>,
}

impl<'r, R> PredicateBuilder<'r, R> {
    pub fn new(registry: &'r FieldRegistry<R>) -> Self {
        Self { registry }
    }

    pub fn build(&mut self, expression: &Expression) -> Result<Predicate<R>, BuildError> {
        let predicate = grammar::walk(expression, self)?;
        trace!("built predicate {}", predicate);
        Ok(predicate)
    }

    fn leaf(&self, pair: Comparison<'_>) -> Result<Predicate<R>, BuildError> {
        // Unlike validation, the operator must follow the operands here.
        let pair = pair.reorient();
        let field = pair.left.to_string();
        let value = pair.right.to_string();
        let descriptor = self
            .registry
            .get(&field)
            .ok_or_else(|| BuildError::UnknownField(field.clone()))?;
        let (lookup, negated) = pair.op.lookup();
        let filter = match descriptor.leaf(lookup, &value) {
            Ok(filter) => filter,
            Err(source) => {
                return Err(BuildError::Filter {
                    field,
                    value,
                    source,
                })
            }
        };
        let leaf = Predicate::leaf(field, lookup, value, filter);
        Ok(if negated { leaf.negate() } else { leaf })
    }
}

impl<'t, 'r, R> Visitor<'t> for PredicateBuilder<'r, R> {
    type Output = Predicate<R>;
    type Error = BuildError;

    fn visit_bool_op(
        &mut self,
        op: BoolOperator,
        values: Vec<Predicate<R>>,
    ) -> Result<Predicate<R>, BuildError> {
        Ok(values
            .into_iter()
            .fold(Predicate::Empty, |acc, value| match op {
                BoolOperator::And => acc.and(value),
                BoolOperator::Or => acc.or(value),
            }))
    }

    fn visit_compare(&mut self, pairs: Vec<Comparison<'t>>) -> Result<Predicate<R>, BuildError> {
        pairs
            .into_iter()
            .try_fold(Predicate::Empty, |acc, pair| Ok(acc.and(self.leaf(pair)?)))
    }
}
