//! Standard operators for use with filtering.
//!
//! Each comparator a condition can use is carried out by one of the
//! following, named after the matching Django lookup:
//!
//! [`Operator`]       | [`OperatorClass`] | Lookup       | Restrictions
//! -------------------|-------------------|--------------|--------------
//! [`ExactImpl`]      | [`Exact`]         | `exact`      | T: [`PartialEq`](core::cmp::PartialEq)
//! [`ContainsImpl`]   | [`Contains`]      | `contains`   | T: [`Display`](std::fmt::Display)
//! [`LessImpl`]       | [`Less`]          | `lt`         | T: [`PartialOrd`](core::cmp::PartialOrd)
//! [`GreaterImpl`]    | [`Greater`]       | `gt`         | T: [`PartialOrd`](core::cmp::PartialOrd)
//! [`LessEqImpl`]     | [`LessEq`]        | `lte`        | T: [`PartialOrd`](core::cmp::PartialOrd)
//! [`GreaterEqImpl`]  | [`GreaterEq`]     | `gte`        | T: [`PartialOrd`](core::cmp::PartialOrd)
//!
//! Negated comparisons (`!=`, `not in`) are not operators of their
//! own; the predicate tree wraps an `exact` or `contains` leaf instead.

use std::fmt::Display;

use crate::filtering::{FieldValue, FilterError, Operable, Operator, OperatorClass};

/// A value that is directly [`Operable`].
pub trait Scalar {}

impl Scalar for i8 {}
impl Scalar for u8 {}
impl Scalar for i16 {}
impl Scalar for u16 {}
impl Scalar for i32 {}
impl Scalar for u32 {}
impl Scalar for i64 {}
impl Scalar for u64 {}
impl Scalar for f32 {}
impl Scalar for f64 {}
impl Scalar for bool {}
impl Scalar for String {}

impl<T: chrono::TimeZone> Scalar for chrono::DateTime<T> {}

impl<T> Operable for T
where
    T: Scalar,
{
    type Base = Self;
    fn apply<O: Operator<Self::Base>>(&self, op: &O) -> bool {
        op.apply(self)
    }
}

/// Match when the value is equal to the target.
pub struct ExactImpl<T> {
    target: T,
}

impl<T> Operator<T> for ExactImpl<T>
where
    T: PartialEq,
{
    fn apply(&self, value: &T) -> bool {
        value == &self.target
    }
}

/// The [`OperatorClass`] that can instantiate [`ExactImpl`].
pub struct Exact;

impl<T> OperatorClass<T> for Exact
where
    T: FieldValue,
{
    type Instance = ExactImpl<T>;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(ExactImpl {
            target: T::parse_value(rhs)?,
        })
    }
}

/// Match when the string representation of the value contains the target.
pub struct ContainsImpl {
    target: String,
}

impl<T> Operator<T> for ContainsImpl
where
    T: Display,
{
    fn apply(&self, value: &T) -> bool {
        value.to_string().contains(&self.target)
    }
}

/// The [`OperatorClass`] that can instantiate [`ContainsImpl`].
pub struct Contains;

impl<T> OperatorClass<T> for Contains
where
    T: Display,
{
    type Instance = ContainsImpl;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(ContainsImpl {
            target: rhs.to_string(),
        })
    }
}

/// Match when value is less than the target.
pub struct LessImpl<T> {
    target: T,
}

impl<T> Operator<T> for LessImpl<T>
where
    T: PartialOrd,
{
    fn apply(&self, value: &T) -> bool {
        value < &self.target
    }
}

/// The [`OperatorClass`] that can instantiate [`LessImpl`].
pub struct Less;

impl<T> OperatorClass<T> for Less
where
    T: FieldValue,
{
    type Instance = LessImpl<T>;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(LessImpl {
            target: T::parse_value(rhs)?,
        })
    }
}

/// Match when value is greater than the target.
pub struct GreaterImpl<T> {
    target: T,
}

impl<T> Operator<T> for GreaterImpl<T>
where
    T: PartialOrd,
{
    fn apply(&self, value: &T) -> bool {
        value > &self.target
    }
}

/// The [`OperatorClass`] that can instantiate [`GreaterImpl`].
pub struct Greater;

impl<T> OperatorClass<T> for Greater
where
    T: FieldValue,
{
    type Instance = GreaterImpl<T>;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(GreaterImpl {
            target: T::parse_value(rhs)?,
        })
    }
}

/// Match when the value is less than or equal to the target.
pub struct LessEqImpl<T> {
    target: T,
}

impl<T> Operator<T> for LessEqImpl<T>
where
    T: PartialOrd,
{
    fn apply(&self, value: &T) -> bool {
        value <= &self.target
    }
}

/// The [`OperatorClass`] that can instantiate [`LessEqImpl`].
pub struct LessEq;

impl<T> OperatorClass<T> for LessEq
where
    T: FieldValue,
{
    type Instance = LessEqImpl<T>;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(LessEqImpl {
            target: T::parse_value(rhs)?,
        })
    }
}

/// Match when the value is greater than or equal to the target.
pub struct GreaterEqImpl<T> {
    target: T,
}

impl<T> Operator<T> for GreaterEqImpl<T>
where
    T: PartialOrd,
{
    fn apply(&self, value: &T) -> bool {
        value >= &self.target
    }
}

/// The [`OperatorClass`] that can instantiate [`GreaterEqImpl`].
pub struct GreaterEq;

impl<T> OperatorClass<T> for GreaterEq
where
    T: FieldValue,
{
    type Instance = GreaterEqImpl<T>;
    fn instantiate(&self, rhs: &str) -> Result<Self::Instance, FilterError> {
        Ok(GreaterEqImpl {
            target: T::parse_value(rhs)?,
        })
    }
}
