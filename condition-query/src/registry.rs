//! Field registries: what a condition may refer to.
//!
//! A [`FieldRegistry`] maps the names usable in a condition to
//! [`FieldDescriptor`]s. A descriptor knows how to check a value for
//! its field, which [`Comparator`]s are permitted on it, and how to
//! turn a comparison into a [`Filter`] over records.
//!
//! Registries can be assembled by hand:
//! ```rust
//! use condition_query::filtering::Accessor;
//! use condition_query::registry::{ComparatorSet, FieldRegistry, TypedField};
//!
//! struct Stock {
//!     code: String,
//!     price: f64,
//! }
//!
//! let registry: FieldRegistry<Stock> = FieldRegistry::new()
//!     .with(
//!         "code",
//!         TypedField::new(Accessor::new(|s: &Stock| &s.code), ComparatorSet::textual()),
//!     )
//!     .with(
//!         "price",
//!         TypedField::new(Accessor::new(|s: &Stock| &s.price), ComparatorSet::ordered())
//!             .min(0.0),
//!     );
//! assert!(registry.get("price").is_some());
//! ```
//! or discovered from a type deriving [`Filterable`](crate::Filterable)
//! with [`FieldRegistry::from_filterable`].

use core::marker::PhantomData;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::ast::CmpOp;
use crate::filtering::{
    instantiate, BaseOf, FieldValue, Filter, FilterError, Filterable, Lookup, Member, Meta,
    MetaVisitor,
};
use crate::grammar::GrammarError;

/// The comparison operators a condition can use.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum Comparator {
    #[strum(serialize = "eq")]
    Eq,
    #[strum(serialize = "ne")]
    NotEq,
    #[strum(serialize = "lt")]
    Lt,
    #[strum(serialize = "lte")]
    LtE,
    #[strum(serialize = "gt")]
    Gt,
    #[strum(serialize = "gte")]
    GtE,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not_in")]
    NotIn,
}

impl Comparator {
    /// The operator that means the same thing with its operands swapped.
    pub fn mirror(self) -> Self {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Gt => Comparator::Lt,
            Comparator::LtE => Comparator::GtE,
            Comparator::GtE => Comparator::LtE,
            other => other,
        }
    }

    /// The backend lookup for this operator, and whether its result is negated.
    pub fn lookup(self) -> (Lookup, bool) {
        match self {
            Comparator::Eq => (Lookup::Exact, false),
            Comparator::NotEq => (Lookup::Exact, true),
            Comparator::Lt => (Lookup::Lt, false),
            Comparator::LtE => (Lookup::Lte, false),
            Comparator::Gt => (Lookup::Gt, false),
            Comparator::GtE => (Lookup::Gte, false),
            Comparator::In => (Lookup::Contains, false),
            Comparator::NotIn => (Lookup::Contains, true),
        }
    }
}

impl TryFrom<CmpOp> for Comparator {
    type Error = GrammarError;

    fn try_from(op: CmpOp) -> Result<Self, Self::Error> {
        Ok(match op {
            CmpOp::Eq => Comparator::Eq,
            CmpOp::NotEq => Comparator::NotEq,
            CmpOp::Lt => Comparator::Lt,
            CmpOp::LtE => Comparator::LtE,
            CmpOp::Gt => Comparator::Gt,
            CmpOp::GtE => Comparator::GtE,
            CmpOp::In => Comparator::In,
            CmpOp::NotIn => Comparator::NotIn,
            CmpOp::Is | CmpOp::IsNot => return Err(GrammarError::Disallowed(op.into())),
        })
    }
}

/// A set of [`Comparator`]s, kept in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComparatorSet(BTreeSet<Comparator>);

impl ComparatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `==` and `!=`.
    pub fn equality() -> Self {
        [Comparator::Eq, Comparator::NotEq].into_iter().collect()
    }

    /// Equality and ordering, for numeric fields.
    pub fn ordered() -> Self {
        Self::equality()
            .with(Comparator::Lt)
            .with(Comparator::LtE)
            .with(Comparator::Gt)
            .with(Comparator::GtE)
    }

    /// Equality and containment, for string fields.
    pub fn textual() -> Self {
        Self::equality()
            .with(Comparator::In)
            .with(Comparator::NotIn)
    }

    pub fn all() -> Self {
        Comparator::iter().collect()
    }

    pub fn with(mut self, comparator: Comparator) -> Self {
        self.0.insert(comparator);
        self
    }

    pub fn contains(&self, comparator: Comparator) -> bool {
        self.0.contains(&comparator)
    }

    pub fn iter(&self) -> impl Iterator<Item = Comparator> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Comparator> for ComparatorSet {
    fn from_iter<I: IntoIterator<Item = Comparator>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.iter().map(Into::into).collect();
        f.write_str(&names.join(", "))
    }
}

/// Everything a condition needs to know about one field.
pub trait FieldDescriptor<R> {
    /// Check `raw` as a value for this field, returning it in the
    /// form the field would store it.
    fn clean(&self, raw: &str) -> Result<String, FilterError>;
    /// The comparators conditions may use on this field.
    fn operators(&self) -> &ComparatorSet;
    /// Whether validation should skip this field entirely.
    fn is_ignored(&self) -> bool {
        false
    }
    /// Make a filter applying `lookup` against `rhs`.
    fn leaf(&self, lookup: Lookup, rhs: &str) -> Result<Box<dyn Filter<R>>, FilterError>;
}

/// Constraint violations reported by [`TypedField::clean`](FieldDescriptor::clean).
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("ensure this value is greater than or equal to {0}")]
    BelowMinimum(String),
    #[error("ensure this value is less than or equal to {0}")]
    AboveMaximum(String),
    #[error("value does not match {0}")]
    Mismatch(String),
}

impl From<ConstraintError> for FilterError {
    fn from(err: ConstraintError) -> Self {
        FilterError::Instantiation(err.into())
    }
}

/// A field read through a [`Member`], with optional value constraints.
///
/// Values are cleaned by parsing them as the member's base type, then
/// checking any bounds and pattern that have been set.
pub struct TypedField<R, M>
where
    M: Member<R>,
{
    member: M,
    operators: ComparatorSet,
    min: Option<BaseOf<R, M>>,
    max: Option<BaseOf<R, M>>,
    pattern: Option<Regex>,
    _record: PhantomData<fn(&R)>,
}

impl<R, M> TypedField<R, M>
where
    M: Member<R>,
{
    pub fn new(member: M, operators: ComparatorSet) -> Self {
        Self {
            member,
            operators,
            min: None,
            max: None,
            pattern: None,
            _record: PhantomData,
        }
    }

    /// Reject values below `min`.
    pub fn min(mut self, min: BaseOf<R, M>) -> Self {
        self.min = Some(min);
        self
    }

    /// Reject values above `max`.
    pub fn max(mut self, max: BaseOf<R, M>) -> Self {
        self.max = Some(max);
        self
    }

    /// Reject values whose text doesn't match `pattern`.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

impl<R, M> FieldDescriptor<R> for TypedField<R, M>
where
    M: Member<R> + 'static,
    BaseOf<R, M>: FieldValue,
{
    fn clean(&self, raw: &str) -> Result<String, FilterError> {
        let value = <BaseOf<R, M> as FieldValue>::parse_value(raw)?;
        if let Some(min) = &self.min {
            if value < *min {
                return Err(ConstraintError::BelowMinimum(min.to_string()).into());
            }
        }
        if let Some(max) = &self.max {
            if value > *max {
                return Err(ConstraintError::AboveMaximum(max.to_string()).into());
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                return Err(ConstraintError::Mismatch(pattern.as_str().to_string()).into());
            }
        }
        Ok(value.to_string())
    }

    fn operators(&self) -> &ComparatorSet {
        &self.operators
    }

    fn leaf(&self, lookup: Lookup, rhs: &str) -> Result<Box<dyn Filter<R>>, FilterError> {
        instantiate::<R, M>(&self.member, lookup, rhs)
    }
}

/// A field that validation doesn't inspect.
///
/// Any value and any operator are accepted for it. If it wraps
/// another descriptor, predicates can still filter on it; otherwise
/// building a predicate that uses it fails with
/// [`FilterError::NoColumn`].
pub struct IgnoredField<R> {
    column: Option<Box<dyn FieldDescriptor<R>>>,
    operators: ComparatorSet,
}

impl<R> IgnoredField<R> {
    pub fn new() -> Self {
        Self {
            column: None,
            operators: ComparatorSet::all(),
        }
    }

    /// Skip validation for `column`, but still filter through it.
    pub fn over<D>(column: D) -> Self
    where
        D: FieldDescriptor<R> + 'static,
    {
        Self {
            column: Some(Box::new(column)),
            operators: ComparatorSet::all(),
        }
    }
}

impl<R> Default for IgnoredField<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FieldDescriptor<R> for IgnoredField<R> {
    fn clean(&self, raw: &str) -> Result<String, FilterError> {
        Ok(raw.to_string())
    }

    fn operators(&self) -> &ComparatorSet {
        &self.operators
    }

    fn is_ignored(&self) -> bool {
        true
    }

    fn leaf(&self, lookup: Lookup, rhs: &str) -> Result<Box<dyn Filter<R>>, FilterError> {
        match &self.column {
            Some(column) => column.leaf(lookup, rhs),
            None => Err(FilterError::NoColumn),
        }
    }
}

/// The fields a condition over records of type `R` may use.
pub struct FieldRegistry<R> {
    fields: BTreeMap<String, Box<dyn FieldDescriptor<R>>>,
}

impl<R> FieldRegistry<R> {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, replacing any of the same name.
    pub fn insert<D>(&mut self, name: impl Into<String>, descriptor: D)
    where
        D: FieldDescriptor<R> + 'static,
    {
        self.fields.insert(name.into(), Box::new(descriptor));
    }

    /// Add a field, builder style.
    pub fn with<D>(mut self, name: impl Into<String>, descriptor: D) -> Self
    where
        D: FieldDescriptor<R> + 'static,
    {
        self.insert(name, descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn FieldDescriptor<R>> {
        self.fields.get(name).map(|d| d.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One line per field, then one per field and permitted operator.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, descriptor) in &self.fields {
            if descriptor.is_ignored() {
                lines.push(format!("{} (ignored)", name));
            } else {
                lines.push(name.clone());
                lines.extend(descriptor.operators().iter().map(|op| format!("{}__{}", name, op)));
            }
        }
        lines
    }
}

impl<R> Default for FieldRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

struct RegistryCollector<R> {
    registry: FieldRegistry<R>,
}

impl<R: 'static> MetaVisitor<R> for RegistryCollector<R> {
    fn visit_member<M>(&mut self, name: &str, member: &M, operators: ComparatorSet, ignored: bool)
    where
        M: Member<R> + 'static,
        BaseOf<R, M>: FieldValue,
    {
        let field = TypedField::new(member.clone(), operators);
        if ignored {
            self.registry.insert(name, IgnoredField::over(field));
        } else {
            self.registry.insert(name, field);
        }
    }
}

impl<R> FieldRegistry<R>
where
    R: Filterable + 'static,
{
    /// Build a registry from the fields `R` exposes.
    pub fn from_filterable() -> Self {
        let mut collector = RegistryCollector {
            registry: FieldRegistry::new(),
        };
        R::get_meta().accept_visitor(&mut collector);
        collector.registry
    }
}

/// Debug print of a registry showing the supported comparisons.
///
/// For a registry with a single `price` field permitting ordering,
/// this prints
/// ```text
/// price
/// price__eq
/// price__ne
/// price__lt
/// price__lte
/// price__gt
/// price__gte
/// ```
pub fn print_fields<R>(registry: &FieldRegistry<R>) {
    for line in registry.describe() {
        println!("{}", line);
    }
}
