//! Conditions over JSON objects.
//!
//! Records don't have to be Rust structs: [`JsonField`] is a
//! [`Member`] of [`serde_json::Value`] that reads one key of an
//! object. A missing key, or a value of the wrong JSON type, behaves
//! like `None` and never matches.
//!
//! ```rust
//! use condition_query::json;
//! use condition_query::registry::{ComparatorSet, FieldRegistry, TypedField};
//! use serde_json::Value;
//!
//! let registry: FieldRegistry<Value> = FieldRegistry::new()
//!     .with("price", TypedField::new(json::field::<f64>("price"), ComparatorSet::ordered()))
//!     .with("code", TypedField::new(json::field::<String>("code"), ComparatorSet::textual()));
//! assert_eq!(registry.len(), 2);
//! ```

use core::marker::PhantomData;

use serde_json::Value;

use crate::filtering::{Member, Operable, Operator};

/// A value that can be read out of JSON.
pub trait FromJson: Sized {
    fn from_json(value: &Value) -> Option<Self>;
}

impl FromJson for f64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromJson for i64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromJson for u64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl FromJson for bool {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromJson for String {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// The value at one key of a JSON object.
pub struct JsonField<T> {
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonField<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonField<T> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Member<Value> for JsonField<T>
where
    T: FromJson + Operable,
{
    type Value = Option<T>;
    fn apply<O: Operator<<Option<T> as Operable>::Base>>(&self, op: &O, data: &Value) -> bool {
        data.get(&self.key).and_then(T::from_json).apply(op)
    }
}

/// Read `key` from JSON objects as a `T`.
pub fn field<T>(key: impl Into<String>) -> JsonField<T> {
    JsonField {
        key: key.into(),
        _marker: PhantomData,
    }
}
