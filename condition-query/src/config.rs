//! Limits on condition text.
//!
//! Conditions come from end users, so their size is bounded before
//! any parsing happens.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("condition is {length} characters long, the limit is {limit}")]
    TooLong { length: usize, limit: usize },
    #[error("condition nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    /// Longest condition accepted, in characters
    pub max_length: usize,

    /// Deepest nesting accepted, counting brackets and chains of
    /// prefix operators
    pub max_depth: usize,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            max_length: env::var("CONDITION_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            max_depth: env::var("CONDITION_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(32),
        }
    }
}

impl ConditionConfig {
    /// Read a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check `text` against the limits.
    pub fn check(&self, text: &str) -> Result<(), LimitError> {
        let length = text.chars().count();
        if length > self.max_length {
            return Err(LimitError::TooLong {
                length,
                limit: self.max_length,
            });
        }
        if nesting_depth(text) > self.max_depth {
            return Err(LimitError::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

/// How deeply `text` nests, ignoring anything inside quoted strings.
///
/// Each bracket is a level. So is each prefix operator (`-`, `+`, `~`,
/// `not`) and each `**`, until an operator that binds more loosely
/// ends the run at that bracket level.
fn nesting_depth(text: &str) -> usize {
    // Prefix runs suspended by the brackets currently open.
    let mut outer: Vec<usize> = Vec::new();
    let mut held = 0usize;
    let mut run = 0usize;
    // Whether the last token ended an operand, making `-` or `not` infix.
    let mut operand = false;
    let mut deepest = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                while let Some(next) = chars.next() {
                    if next == '\\' {
                        chars.next();
                    } else if next == c {
                        break;
                    }
                }
                operand = true;
            }
            '(' | '[' => {
                outer.push(run);
                held += run;
                run = 0;
                operand = false;
            }
            ')' | ']' => {
                if let Some(suspended) = outer.pop() {
                    held -= suspended;
                    run = suspended;
                }
                operand = true;
            }
            '-' | '+' if operand => {
                run = 0;
                operand = false;
            }
            '-' | '+' | '~' => run += 1,
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                run += 1;
                operand = false;
            }
            '*' | '/' | '%' | '<' | '>' | '=' | '!' | ',' => {
                run = 0;
                operand = false;
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !(next.is_alphanumeric() || next == '_' || next == '.') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.to_ascii_lowercase().as_str() {
                    "not" if !operand => run += 1,
                    "not" | "and" | "or" | "in" | "is" => {
                        run = 0;
                        operand = false;
                    }
                    _ => operand = true,
                }
            }
            _ => {}
        }
        deepest = deepest.max(outer.len() + held + run);
    }
    deepest
}
