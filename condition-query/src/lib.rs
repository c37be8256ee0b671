//! # Compile restricted conditions into record filters
//!
//! This crate turns short, user-written conditions such as
//!
//! ```text
//! price < 100 and (per < 10 or pbr < 1)
//! ```
//!
//! into [`Predicate`]s that can be applied to records. Only
//! comparisons joined by `and` and `or` are allowed; anything else
//! that parses as an expression (arithmetic, calls, attribute access)
//! is rejected before it gets anywhere near a record.
//!
//! A condition goes through four stages:
//!
//! - [`parsing`] reads the text as a general expression.
//! - [`grammar`] restricts that expression to what conditions allow.
//! - [`validator`] checks field names, values and operators against a
//!   [`FieldRegistry`].
//! - [`builder`] translates the expression into a [`Predicate`].
//!
//! [`Condition`] and [`compile`] run all four.
//!
//! ## Example
//!
//! ```rust
//! use condition_query::{compile, ConditionConfig, FieldRegistry, Filter, Filterable};
//!
//! #[derive(Filterable)]
//! struct Stock {
//!     #[condition(op(in, not_in))]
//!     code: String,
//!     #[condition(op(lt, lte, gt, gte))]
//!     price: f64,
//! }
//!
//! let registry = FieldRegistry::<Stock>::from_filterable();
//! let predicate = compile("price < 500 and code == '600'", &registry, &ConditionConfig::default())
//!     .unwrap();
//!
//! let mut stocks = vec![
//!     Stock { code: "100".to_string(), price: 100.0 },
//!     Stock { code: "600".to_string(), price: 250.0 },
//!     Stock { code: "200".to_string(), price: 300.0 },
//! ];
//! predicate.filter_vec(&mut stocks);
//! assert_eq!(stocks.len(), 1);
//! assert_eq!(stocks[0].code, "600");
//! ```
//!
//! Errors carry messages meant for whoever wrote the condition:
//!
//! ```rust
//! # use condition_query::{compile, ConditionConfig, FieldRegistry, Filterable};
//! # #[derive(Filterable)]
//! # struct Stock {
//! #     #[condition(op(in, not_in))]
//! #     code: String,
//! # }
//! let registry = FieldRegistry::<Stock>::from_filterable();
//! let err = compile("code < '1200'", &registry, &ConditionConfig::default()).unwrap_err();
//! assert_eq!(err.to_string(), "Invalid operator between code and 1200");
//! ```

pub mod ast;
pub mod builder;
pub mod condition;
pub mod config;
pub mod filtering;
pub mod grammar;
pub mod json;
pub mod parsing;
pub mod predicate;
pub mod registry;
pub mod validator;

pub use crate::builder::{BuildError, PredicateBuilder};
pub use crate::condition::{compile, validate_condition, Condition};
pub use crate::config::{ConditionConfig, LimitError};
pub use crate::filtering::{Filter, FilterError, Filterable};
pub use crate::predicate::Predicate;
pub use crate::registry::{
    print_fields, Comparator, ComparatorSet, FieldDescriptor, FieldRegistry, IgnoredField,
    TypedField,
};
pub use crate::validator::{ConditionError, ConditionValidator};
pub use condition_query_derive::Filterable;
