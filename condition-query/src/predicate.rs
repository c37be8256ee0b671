//! Composable predicates over records.
//!
//! A [`Predicate`] is what a condition compiles to: leaf comparisons
//! combined with AND, OR and NOT, much like a Django `Q` object. It is
//! itself a [`Filter`], so it can be applied to records directly.
//!
//! [`Predicate::Empty`] matches everything and disappears when combined
//! with anything else, so predicates can be folded up starting from it.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::filtering::{Filter, Lookup};

/// A single field comparison.
pub struct Leaf<R> {
    field: String,
    lookup: Lookup,
    value: String,
    filter: Box<dyn Filter<R>>,
}

impl<R> Leaf<R> {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

pub enum Predicate<R> {
    Empty,
    Leaf(Leaf<R>),
    Not(Box<Predicate<R>>),
    And(Vec<Predicate<R>>),
    Or(Vec<Predicate<R>>),
}

impl<R> Predicate<R> {
    pub fn leaf(
        field: impl Into<String>,
        lookup: Lookup,
        value: impl Into<String>,
        filter: Box<dyn Filter<R>>,
    ) -> Self {
        Predicate::Leaf(Leaf {
            field: field.into(),
            lookup,
            value: value.into(),
            filter,
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Predicate::Empty)
    }

    /// Both `self` and `other` must hold.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Predicate::Empty, p) | (p, Predicate::Empty) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(right)) => {
                let mut all = vec![p];
                all.extend(right);
                Predicate::And(all)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Either `self` or `other` must hold.
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Predicate::Empty, p) | (p, Predicate::Empty) => p,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, Predicate::Or(right)) => {
                let mut all = vec![p];
                all.extend(right);
                Predicate::Or(all)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::Empty => Predicate::Empty,
            Predicate::Not(inner) => *inner,
            p => Predicate::Not(Box::new(p)),
        }
    }

    /// Every leaf in the predicate, in order.
    pub fn leaves(&self) -> Vec<&Leaf<R>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Leaf<R>>) {
        match self {
            Predicate::Empty => {}
            Predicate::Leaf(leaf) => leaves.push(leaf),
            Predicate::Not(inner) => inner.collect_leaves(leaves),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

impl<R> Filter<R> for Predicate<R> {
    fn filter_one(&self, data: &R) -> bool {
        match self {
            Predicate::Empty => true,
            Predicate::Leaf(leaf) => leaf.filter.filter_one(data),
            Predicate::Not(inner) => !inner.filter_one(data),
            Predicate::And(children) => children.iter().all(|c| c.filter_one(data)),
            Predicate::Or(children) => children.iter().any(|c| c.filter_one(data)),
        }
    }
}

impl<R> BitAnd for Predicate<R> {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl<R> BitOr for Predicate<R> {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl<R> Not for Predicate<R> {
    type Output = Self;
    fn not(self) -> Self {
        self.negate()
    }
}

fn join<R>(f: &mut fmt::Formatter<'_>, children: &[Predicate<R>], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

impl<R> fmt::Display for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Empty => f.write_str("()"),
            Predicate::Leaf(leaf) => write!(f, "{}__{}={}", leaf.field, leaf.lookup, leaf.value),
            Predicate::Not(inner) => match **inner {
                Predicate::Leaf(_) => write!(f, "NOT ({})", inner),
                _ => write!(f, "NOT {}", inner),
            },
            Predicate::And(children) => join(f, children, "AND"),
            Predicate::Or(children) => join(f, children, "OR"),
        }
    }
}

impl<R> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{instantiate, Accessor};

    struct Row {
        price: i64,
    }

    fn leaf(lookup: Lookup, value: &str) -> Predicate<Row> {
        let price = Accessor::new(|r: &Row| &r.price);
        Predicate::leaf("price", lookup, value, instantiate(&price, lookup, value).unwrap())
    }

    #[test]
    fn empty_is_neutral() {
        let p = Predicate::Empty.and(leaf(Lookup::Gt, "10"));
        assert_eq!(p.to_string(), "price__gt=10");
        let p = leaf(Lookup::Gt, "10").or(Predicate::Empty);
        assert_eq!(p.to_string(), "price__gt=10");
        assert!(Predicate::<Row>::Empty.filter_one(&Row { price: 0 }));
        assert!(Predicate::<Row>::Empty.negate().is_empty());
    }

    #[test]
    fn combinators_flatten() {
        let p = leaf(Lookup::Gt, "10") & leaf(Lookup::Lte, "20") & leaf(Lookup::Exact, "15");
        assert_eq!(p.to_string(), "(price__gt=10 AND price__lte=20 AND price__exact=15)");
        let p = leaf(Lookup::Lt, "0") | (leaf(Lookup::Gt, "10") & leaf(Lookup::Lt, "20"));
        assert_eq!(p.to_string(), "(price__lt=0 OR (price__gt=10 AND price__lt=20))");
        assert_eq!(p.leaves().len(), 3);
    }

    #[test]
    fn negation() {
        let p = !leaf(Lookup::Exact, "600");
        assert_eq!(p.to_string(), "NOT (price__exact=600)");
        assert!(p.filter_one(&Row { price: 601 }));
        assert!(!p.filter_one(&Row { price: 600 }));
        let p = !p;
        assert_eq!(p.to_string(), "price__exact=600");
    }

    #[test]
    fn filters_records() {
        let p = leaf(Lookup::Gt, "10") & leaf(Lookup::Lte, "20");
        let mut rows: Vec<Row> = [5, 10, 15, 20, 25]
            .into_iter()
            .map(|price| Row { price })
            .collect();
        p.filter_vec(&mut rows);
        let prices: Vec<i64> = rows.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![15, 20]);
    }

    #[test]
    fn leaves_expose_their_parts() {
        let p = leaf(Lookup::Lte, "20");
        let leaves = p.leaves();
        assert_eq!(leaves[0].field(), "price");
        assert_eq!(leaves[0].lookup(), Lookup::Lte);
        assert_eq!(leaves[0].value(), "20");
    }
}
