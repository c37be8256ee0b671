//! Check a condition against a field registry.
//!
//! Validation collects every `(field, value, operator)` triple in the
//! expression, in the order fields are first mentioned, and then checks
//! each against the registry. The first failure is reported.

use log::debug;
use thiserror::Error;

use crate::ast::{BoolOperator, Expression};
use crate::builder::BuildError;
use crate::config::LimitError;
use crate::filtering::FilterError;
use crate::grammar::{self, Comparison, GrammarError, Visitor};
use crate::parsing::ParseError;
use crate::registry::{Comparator, FieldRegistry};

/// Errors reported to whoever wrote the condition.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// The text doesn't parse, or uses something conditions don't allow.
    #[error("Invalid syntax: {0}")]
    Syntax(String),
    #[error("{0} does not exist")]
    UnknownField(String),
    /// The field rejected the value.
    #[error("Invalid data ({field}, {value}): {source}")]
    InvalidValue {
        field: String,
        value: String,
        source: FilterError,
    },
    /// The field doesn't permit the operator used with this value.
    #[error("Invalid operator between {field} and {value}")]
    InvalidOperator { field: String, value: String },
    #[error("Invalid syntax: {0}")]
    Limit(#[from] LimitError),
    /// A validated condition failed to build.
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl From<GrammarError> for ConditionError {
    fn from(err: GrammarError) -> Self {
        ConditionError::Syntax(err.to_string())
    }
}

impl From<ParseError> for ConditionError {
    fn from(err: ParseError) -> Self {
        ConditionError::Syntax(err.to_string())
    }
}

/// Validates conditions against a [`FieldRegistry`].
///
/// One validator can check any number of expressions; what it
/// collects is discarded at the start of each.
pub struct ConditionValidator<'r, R> {
    registry: &'r FieldRegistry<R>,
    operands: Vec<(String, Vec<(String, Comparator)>)>,
}

impl<'r, R> ConditionValidator<'r, R> {
    pub fn new(registry: &'r FieldRegistry<R>) -> Self {
        Self {
            registry,
            operands: Vec::new(),
        }
    }

    pub fn validate(&mut self, expression: &Expression) -> Result<(), ConditionError> {
        grammar::walk(expression, self)?;
        debug!("validating {} field(s)", self.operands.len());
        self.check()
    }

    fn record(&mut self, field: String, value: String, op: Comparator) {
        match self.operands.iter_mut().find(|(name, _)| *name == field) {
            Some((_, pairs)) => pairs.push((value, op)),
            None => self.operands.push((field, vec![(value, op)])),
        }
    }

    fn check(&self) -> Result<(), ConditionError> {
        for (field, pairs) in &self.operands {
            let descriptor = self
                .registry
                .get(field)
                .ok_or_else(|| ConditionError::UnknownField(field.clone()))?;
            if descriptor.is_ignored() {
                continue;
            }
            for (value, op) in pairs {
                if let Err(source) = descriptor.clean(value) {
                    return Err(ConditionError::InvalidValue {
                        field: field.clone(),
                        value: value.clone(),
                        source,
                    });
                }
                if !descriptor.operators().contains(*op) {
                    return Err(ConditionError::InvalidOperator {
                        field: field.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<'t, 'r, R> Visitor<'t> for ConditionValidator<'r, R> {
    type Output = ();
    type Error = ConditionError;

    fn enter_expression(&mut self) {
        self.operands.clear();
    }

    fn visit_bool_op(&mut self, _op: BoolOperator, _values: Vec<()>) -> Result<(), ConditionError> {
        Ok(())
    }

    fn visit_compare(&mut self, pairs: Vec<Comparison<'t>>) -> Result<(), ConditionError> {
        for pair in pairs {
            // Operands only; the operator is recorded as written.
            let pair = pair.normalise();
            self.record(pair.left.to_string(), pair.right.to_string(), pair.op);
        }
        Ok(())
    }
}
