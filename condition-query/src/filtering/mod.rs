//! # Apply comparisons to Rust records
//!
//! A compiled condition ends up as a tree of leaf comparisons, each of
//! which tests one field of a record against one right hand side. This
//! module holds the machinery for those leaves. The terminology follows
//! Django's lookups: a leaf is a field name, a lookup such as `exact`,
//! `lt` or `contains`, and a right hand side, written `price__lt=100`.
//!
//! There are three layers:
//!
//! - An [`Operator`] takes a single value and produces a true/false
//!   result. The standard ones are in [`ops`].
//! - An [`OperatorClass`] parses a right hand side and makes an
//!   [`Operator`] instance from it.
//! - A [`Member`] applies an [`Operator`] to one field of a record.
//!   Fields holding [`Option<T>`] or [`Vec<T>`] distribute the
//!   operator over their contents via [`Operable`], as Django does.
//!
//! Combining a [`Member`] with an instantiated [`Operator`] produces a
//! [`Filter`], which is the unit the predicate tree is built from.
//!
//! Example:
//! ```rust
//! use condition_query::filtering::{instantiate, Accessor, Filter, Lookup};
//!
//! struct Stock {
//!     price: f64,
//! }
//!
//! let price = Accessor::new(|s: &Stock| &s.price);
//! let filter = instantiate(&price, Lookup::Lt, "100").unwrap();
//! assert!(filter.filter_one(&Stock { price: 99.5 }));
//! assert!(!filter.filter_one(&Stock { price: 100.0 }));
//! ```

pub mod ops;

use core::fmt::Display;
use core::marker::PhantomData;
use core::str::FromStr;

use thiserror::Error;

use crate::registry::ComparatorSet;

/// Errors produced by filtering.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The field validates values but has nothing to filter on.
    #[error("field has no backing column")]
    NoColumn,
    /// Failed to parse or check a right hand side.
    #[error(transparent)]
    Instantiation(#[from] anyhow::Error),
}

/// A value type that can appear on the right hand side of a comparison.
///
/// Anything that can be parsed from a string, printed back, and
/// ordered qualifies. Parsing failures are carried as
/// [`anyhow::Error`] so that they can be reported with their
/// original message.
pub trait FieldValue: Display + PartialOrd + Sized + 'static {
    /// Parse the textual form of a value.
    fn parse_value(raw: &str) -> Result<Self, anyhow::Error>;
}

impl<T> FieldValue for T
where
    T: FromStr + Display + PartialOrd + 'static,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    fn parse_value(raw: &str) -> Result<Self, anyhow::Error> {
        T::from_str(raw).map_err(anyhow::Error::from)
    }
}

/// A type that comparisons can work on.
///
/// Comparisons are defined in terms of operators on simple values,
/// like strings and numbers. Collections and nullable values are
/// [`Operable`] too: it's up to the implementation to decide how to
/// take an operator on its base type and apply it to its contents.
///
/// The implementations for [`Vec<T>`] and [`Option<T>`] match the default
/// behaviour in Django.
pub trait Operable {
    /// The underlying type that operators should be applied to.
    type Base;
    /// Apply `op` across our contents.
    fn apply<O: Operator<Self::Base>>(&self, op: &O) -> bool;
}

impl<T> Operable for Vec<T>
where
    T: Operable,
{
    type Base = <T as Operable>::Base;
    fn apply<O: Operator<Self::Base>>(&self, op: &O) -> bool {
        if self.is_empty() {
            op.empty_collection()
        } else {
            self.iter().any(|x| x.apply(op))
        }
    }
}

impl<T> Operable for Option<T>
where
    T: Operable,
{
    type Base = <T as Operable>::Base;
    fn apply<O: Operator<Self::Base>>(&self, op: &O) -> bool {
        if let Some(x) = self {
            x.apply(op)
        } else {
            op.null_option()
        }
    }
}

/// The base type operators on member `M` of record `R` act upon.
pub type BaseOf<R, M> = <<M as Member<R>>::Value as Operable>::Base;

/// A filterable field of a record.
///
/// You will normally generate implementations of [`Member`] using
/// the [`Filterable`](crate::Filterable) derive macro, or wrap a
/// closure in an [`Accessor`].
pub trait Member<R>: Clone {
    /// The type of the member's data, which must be [`Operable`] so
    /// that comparisons can be made against it.
    type Value: Operable;
    /// Apply an operator to the given field of `data`, returning the
    /// result.
    fn apply<O: Operator<<Self::Value as Operable>::Base>>(&self, op: &O, data: &R) -> bool;
}

/// A [`Member`] reading its field through a closure.
pub struct Accessor<R, T, F> {
    get: F,
    _marker: PhantomData<fn(&R) -> T>,
}

impl<R, T, F> Accessor<R, T, F>
where
    F: Fn(&R) -> &T,
{
    /// Wrap `get`, which must return a reference to the field.
    pub fn new(get: F) -> Self {
        Self {
            get,
            _marker: PhantomData,
        }
    }
}

impl<R, T, F: Clone> Clone for Accessor<R, T, F> {
    fn clone(&self) -> Self {
        Self {
            get: self.get.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R, T, F> Member<R> for Accessor<R, T, F>
where
    F: Fn(&R) -> &T + Clone,
    T: Operable,
{
    type Value = T;
    fn apply<O: Operator<<T as Operable>::Base>>(&self, op: &O, data: &R) -> bool {
        (self.get)(data).apply(op)
    }
}

/// Take a single value and produce a true/false result.
///
/// Operators are generally applied by [`Operable`] types, so the
/// operators themselves can be naive with respect to things like
/// [`Option<T>`] and collections. For operators that need to know about
/// special cases, there are the inelegant get-out functions
/// [`empty_collection`](Operator::empty_collection) and
/// [`null_option`](Operator::null_option) which can be
/// implemented. Both return `false` by default.
pub trait Operator<T> {
    /// Apply this operator a single value, producing a true/false
    /// result.
    fn apply(&self, value: &T) -> bool;
    /// Return a value for this operator when applied to an empty
    /// collection.  Implicitly, operators are distributed over
    /// collections with `any` semantics, so that any `true` result
    /// means the collection evaluates to `true`.
    fn empty_collection(&self) -> bool {
        false
    }
    /// Return a value for this operator when applied to a `None`
    /// value wrapping its target type.
    fn null_option(&self) -> bool {
        false
    }
}

/// Something that can make an operator instance from a right-hand side.
///
/// An [`OperatorClass`] can make a particular type of [`Operator`],
/// performing any needed parsing on the right-hand side of the
/// comparison. Since this is a parsing operation, it can fail.
pub trait OperatorClass<T> {
    /// The type of [`Operator`] this object can make.
    type Instance: Operator<T>;
    /// Create a new [`Operator`], parsing the supplied argument string.
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError>;
}

/// Test whether an object is included in a given result set.
pub trait Filter<R> {
    /// Produce a true/false response indicating an in/out result for the object.
    fn filter_one(&self, data: &R) -> bool;
    /// Helper method to filter an entire vector by this filter.
    fn filter_vec(&self, data: &mut Vec<R>) {
        data.retain(|r| self.filter_one(r))
    }
    /// Helper method to filter an entire vector of references by this filter.
    fn filter_ref_vec(&self, data: &mut Vec<&R>) {
        data.retain(|r| self.filter_one(r))
    }
}

/// A [`Member`] paired with an instantiated [`Operator`].
pub struct FilterImpl<M, O> {
    member: M,
    operator: O,
}

impl<M, O> FilterImpl<M, O> {
    pub fn new(member: M, operator: O) -> Self {
        Self { member, operator }
    }
}

impl<M, O, R> Filter<R> for FilterImpl<M, O>
where
    M: Member<R>,
    O: Operator<BaseOf<R, M>>,
{
    fn filter_one(&self, data: &R) -> bool {
        self.member.apply(&self.operator, data)
    }
}

/// The backend comparisons a leaf can perform.
///
/// The names are Django's lookup names, and are used when a
/// predicate is displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Lookup {
    Exact,
    Contains,
    Lt,
    Lte,
    Gt,
    Gte,
}

fn boxed<R, M, O>(member: &M, class: &O, rhs: &str) -> Result<Box<dyn Filter<R>>, FilterError>
where
    M: Member<R> + 'static,
    O: OperatorClass<BaseOf<R, M>>,
    <O as OperatorClass<BaseOf<R, M>>>::Instance: 'static,
{
    Ok(Box::new(FilterImpl::new(
        member.clone(),
        class.instantiate(rhs)?,
    )))
}

/// Make a boxed [`Filter`] applying `lookup` with right hand side
/// `rhs` to `member`.
pub fn instantiate<R, M>(
    member: &M,
    lookup: Lookup,
    rhs: &str,
) -> Result<Box<dyn Filter<R>>, FilterError>
where
    M: Member<R> + 'static,
    BaseOf<R, M>: FieldValue,
{
    match lookup {
        Lookup::Exact => boxed(member, &ops::Exact, rhs),
        Lookup::Contains => boxed(member, &ops::Contains, rhs),
        Lookup::Lt => boxed(member, &ops::Less, rhs),
        Lookup::Lte => boxed(member, &ops::LessEq, rhs),
        Lookup::Gt => boxed(member, &ops::Greater, rhs),
        Lookup::Gte => boxed(member, &ops::GreaterEq, rhs),
    }
}

/// A wrapper for a type that can be filtered.
///
/// A [`Meta`] holds a representation of a filterable type. When a
/// type is [`Filterable`] it can produce a [`Meta`] for itself, to
/// enable discovery of its members and their permitted comparators.
pub trait Meta<R> {
    /// `visitor` will be called with each exposed member of the type.
    fn accept_visitor<V: MetaVisitor<R>>(&self, visitor: &mut V)
    where
        Self: Sized;
}

/// Receive descriptions of the [`Member`]s a type contains from its [`Meta`].
pub trait MetaVisitor<R> {
    /// This will be called by a [`Meta`] instance for each filterable
    /// structure member. Here:
    /// - `name` is the name of the member, as exposed in conditions.
    /// - `member` is a [`Member`] wrapping that field.
    /// - `operators` is the set of comparators conditions may use on it.
    /// - `ignored` is set when values and comparators on this member
    ///    should not be checked during validation.
    fn visit_member<M>(&mut self, name: &str, member: &M, operators: ComparatorSet, ignored: bool)
    where
        M: Member<R> + 'static,
        BaseOf<R, M>: FieldValue;
}

/// Something which can produce a description of how to filter it.
///
/// This is the main derivable trait of the crate. A type implementing
/// [`Filterable`] can provide a [`Meta`] which describes its
/// supported fields and their comparators, from which a
/// [`FieldRegistry`](crate::registry::FieldRegistry) is built.
pub trait Filterable: Sized {
    /// The type which can describe our fields and their operators.
    type Meta: Meta<Self>;
    /// Produce an instance of our [`Meta`] type.
    fn get_meta() -> Self::Meta;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Holding {
        code: String,
        shares: Option<u32>,
        tags: Vec<String>,
    }

    fn holding() -> Holding {
        Holding {
            code: "7203".to_string(),
            shares: None,
            tags: vec!["auto".to_string(), "export".to_string()],
        }
    }

    #[test]
    fn exact_on_string() {
        let code = Accessor::new(|h: &Holding| &h.code);
        let filter = instantiate(&code, Lookup::Exact, "7203").unwrap();
        assert!(filter.filter_one(&holding()));
        let filter = instantiate(&code, Lookup::Exact, "7201").unwrap();
        assert!(!filter.filter_one(&holding()));
    }

    #[test]
    fn none_never_matches() {
        let shares = Accessor::new(|h: &Holding| &h.shares);
        for lookup in [Lookup::Exact, Lookup::Lt, Lookup::Gte] {
            let filter = instantiate(&shares, lookup, "10").unwrap();
            assert!(!filter.filter_one(&holding()));
        }
    }

    #[test]
    fn collections_use_any() {
        let tags = Accessor::new(|h: &Holding| &h.tags);
        let filter = instantiate(&tags, Lookup::Exact, "export").unwrap();
        assert!(filter.filter_one(&holding()));
        let filter = instantiate(&tags, Lookup::Contains, "xp").unwrap();
        assert!(filter.filter_one(&holding()));
        let filter = instantiate(&tags, Lookup::Exact, "bank").unwrap();
        assert!(!filter.filter_one(&holding()));
    }

    #[test]
    fn bad_rhs_is_an_instantiation_error() {
        let shares = Accessor::new(|h: &Holding| &h.shares);
        let err = instantiate(&shares, Lookup::Lt, "lots").err().unwrap();
        assert!(matches!(err, FilterError::Instantiation(_)));
        assert_eq!(err.to_string(), "invalid digit found in string");
    }

    #[test]
    fn errors_concern_the_value_or_column() {
        let shares = Accessor::new(|h: &Holding| &h.shares);
        let cases = [
            (FilterError::NoColumn, "field has no backing column"),
            (
                instantiate(&shares, Lookup::Gt, "-").err().unwrap(),
                "invalid digit found in string",
            ),
        ];
        for (err, message) in cases {
            // Unknown fields are reported by the validator and builder.
            match &err {
                FilterError::NoColumn | FilterError::Instantiation(_) => {}
            }
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn filter_vec_retains_matches() {
        let code = Accessor::new(|h: &Holding| &h.code);
        let filter = instantiate(&code, Lookup::Contains, "72").unwrap();
        let mut v = vec![
            holding(),
            Holding {
                code: "6758".to_string(),
                ..holding()
            },
        ];
        filter.filter_vec(&mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code, "7203");
    }
}
