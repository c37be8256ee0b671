//! The whole pipeline, from text to [`Predicate`].

use log::{debug, trace};

use crate::ast::Expression;
use crate::builder::{BuildError, PredicateBuilder};
use crate::config::ConditionConfig;
use crate::parsing;
use crate::predicate::Predicate;
use crate::registry::FieldRegistry;
use crate::validator::{ConditionError, ConditionValidator};

/// A parsed condition.
///
/// Line breaks in the text are treated as spaces.
///
/// ```rust
/// use condition_query::{Condition, ConditionConfig};
///
/// let condition = Condition::parse("price < 100\nand code == '600'", &ConditionConfig::default())
///     .unwrap();
/// assert_eq!(condition.text(), "price < 100 and code == '600'");
/// ```
#[derive(Debug, Clone)]
pub struct Condition {
    text: String,
    expression: Expression,
}

fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

impl Condition {
    /// Parse `text`, after checking it against the limits in `config`.
    pub fn parse(text: &str, config: &ConditionConfig) -> Result<Self, ConditionError> {
        let text = collapse_newlines(text);
        config.check(&text)?;
        let expression = parsing::parse(&text).map_err(|err| {
            debug!("failed to parse {:?}: {}", text, err);
            err
        })?;
        trace!("parsed {:?} as {:?}", text, expression);
        Ok(Self { text, expression })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Check the condition against `registry`.
    pub fn validate<R>(&self, registry: &FieldRegistry<R>) -> Result<(), ConditionError> {
        ConditionValidator::new(registry)
            .validate(&self.expression)
            .map_err(|err| {
                debug!("rejected {:?}: {}", self.text, err);
                err
            })
    }

    /// Build a predicate without validating first.
    pub fn build<R>(&self, registry: &FieldRegistry<R>) -> Result<Predicate<R>, BuildError> {
        PredicateBuilder::new(registry).build(&self.expression)
    }

    /// Validate, then build.
    pub fn compile<R>(&self, registry: &FieldRegistry<R>) -> Result<Predicate<R>, ConditionError> {
        self.validate(registry)?;
        Ok(self.build(registry)?)
    }
}

/// Parse and validate `text`, discarding the result.
pub fn validate_condition<R>(
    text: &str,
    registry: &FieldRegistry<R>,
    config: &ConditionConfig,
) -> Result<(), ConditionError> {
    Condition::parse(text, config)?.validate(registry)
}

/// Parse, validate and build `text`.
pub fn compile<R>(
    text: &str,
    registry: &FieldRegistry<R>,
    config: &ConditionConfig,
) -> Result<Predicate<R>, ConditionError> {
    Condition::parse(text, config)?.compile(registry)
}
