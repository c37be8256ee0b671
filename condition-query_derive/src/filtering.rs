use std::collections::BTreeMap;

use proc_macro2 as pm2;

use crate::attributes::ConditionMeta;

fn named_fields_error(ident: &syn::Ident) -> pm2::TokenStream {
    syn::Error::new(
        ident.span(),
        "Filterable can only be derived for structs with named fields.",
    )
    .to_compile_error()
}

pub fn derive_filterable(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        ..
    } = input;

    let mut body = pm2::TokenStream::new();
    let mut structs = pm2::TokenStream::new();

    let builtin_operators = BTreeMap::from([
        ("eq", "Eq"),
        ("ne", "NotEq"),
        ("lt", "Lt"),
        ("lte", "LtE"),
        ("gt", "Gt"),
        ("gte", "GtE"),
        ("in", "In"),
        ("not_in", "NotIn"),
    ]);

    let (impl_generics, ty_generics, wc) = generics.split_for_impl();

    let named = match data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => return named_fields_error(&ident),
    };

    for field in named.iter() {
        let fieldid = match field.ident.as_ref() {
            Some(fieldid) => fieldid,
            None => return named_fields_error(&ident),
        };

        let mut meta = ConditionMeta::default();
        for attr in field.attrs.iter() {
            if attr.path.is_ident("condition") {
                match attr.parse_args::<ConditionMeta>() {
                    Ok(parsed) => meta.merge(parsed),
                    Err(e) => return syn::Error::into_compile_error(e),
                }
            }
        }
        if meta.excluded {
            continue;
        }

        let fieldname = meta
            .name
            .unwrap_or_else(|| syn::LitStr::new(&fieldid.to_string(), fieldid.span()));

        // Every field can be compared for equality.
        let mut operators = vec![
            quote::format_ident!("Eq"),
            quote::format_ident!("NotEq"),
        ];
        for op in meta.operators {
            match builtin_operators.get(op.to_string().as_str()) {
                Some(variant) => {
                    let variant = syn::Ident::new(variant, op.span());
                    if !operators.contains(&variant) {
                        operators.push(variant);
                    }
                }
                None => {
                    return syn::Error::new(op.span(), format!("unknown operator {}", op))
                        .to_compile_error();
                }
            }
        }

        let fieldtype = &field.ty;
        let structname = syn::Ident::new(&format!("{}Field", fieldid), pm2::Span::call_site());
        let ignored = meta.ignored;

        structs.extend(quote::quote! {
            #[allow(non_camel_case_types)]
            #[derive(Clone)]
            struct #structname;
            #[automatically_derived]
            impl #impl_generics ::condition_query::filtering::Member<#ident #ty_generics> for #structname #wc {
                type Value = #fieldtype;
                fn apply<O: ::condition_query::filtering::Operator<<Self::Value as ::condition_query::filtering::Operable>::Base>>(&self, op: &O, data: &#ident #ty_generics) -> bool {
                    <Self::Value as ::condition_query::filtering::Operable>::apply(&data.#fieldid, op)
                }
            }
        });

        body.extend(quote::quote! {
            visitor.visit_member(
                #fieldname,
                &#structname,
                ::condition_query::registry::ComparatorSet::new()
                    #(.with(::condition_query::registry::Comparator::#operators))*,
                #ignored,
            );
        });
    }

    quote::quote! {
        const _: () = {
            #structs

            pub struct ConditionMeta;

            #[automatically_derived]
            impl #impl_generics ::condition_query::filtering::Meta<#ident #ty_generics> for ConditionMeta #wc {
                fn accept_visitor<V: ::condition_query::filtering::MetaVisitor<#ident #ty_generics>>(&self, visitor: &mut V) where Self: Sized {
                    #body
                }
            }

            #[automatically_derived]
            impl #impl_generics ::condition_query::filtering::Filterable for #ident #ty_generics #wc {
                type Meta = ConditionMeta;
                fn get_meta() -> Self::Meta {
                    ConditionMeta
                }
            }
        };
    }
}
