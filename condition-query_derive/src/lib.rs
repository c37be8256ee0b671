use proc_macro::{self, TokenStream};

use proc_macro2 as pm2;

mod attributes;
mod filtering;

/// Derive the `Filterable` trait, so that a field registry can be
/// discovered for the type.
///
/// This is only implemented for structs with named fields. All fields
/// will be exposed, permitting `==` and `!=` unless annotated to
/// indicate otherwise. The annotations use the `condition` attribute,
/// which has the following options:
///
/// - `#[condition(rename="new_name")]` Expose the annotated member
///   to conditions as `new_name` instead of using its name in the
///   source code.
///
/// - `#[condition(op(lt, lte, gt, gte))]` In addition to `==` and
///   `!=`, conditions may use these comparators on this field. The
///   names are `eq`, `ne`, `lt`, `lte`, `gt`, `gte`, `in` and `not_in`.
///
/// - `#[condition(exclude)]` Do not expose this field, it cannot be
///   used in conditions.
///
/// - `#[condition(ignore)]` Expose this field, but skip it during
///   validation: any value and operator are accepted for it.
#[proc_macro_derive(Filterable, attributes(condition))]
pub fn filterable(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = filtering::derive_filterable(derive);

    res.into()
}
