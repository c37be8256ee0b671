use syn::ext::IdentExt;
use syn::punctuated::Punctuated;

#[derive(Debug)]
pub enum ConditionItem {
    Rename(syn::LitStr),
    Operators(Vec<syn::Ident>),
    Excluded,
    Ignored,
}

impl syn::parse::Parse for ConditionItem {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let attr: syn::Ident = input.parse()?;
        match attr.to_string().as_str() {
            "rename" => {
                // rename = "MyString"
                let _: syn::Token![=] = input.parse()?;
                let new_name: syn::LitStr = input.parse()?;
                Ok(ConditionItem::Rename(new_name))
            }
            "exclude" => Ok(ConditionItem::Excluded),
            "ignore" => Ok(ConditionItem::Ignored),
            "op" => {
                // op(lt, in, not_in); `in` is a keyword, hence parse_any
                let content;
                let _: syn::token::Paren = syn::parenthesized!(content in input);
                let punc: Punctuated<syn::Ident, syn::Token![,]> =
                    Punctuated::parse_terminated_with(&content, syn::Ident::parse_any)?;
                Ok(ConditionItem::Operators(punc.into_iter().collect()))
            }
            _ => Err(syn::Error::new_spanned(attr, "unsupported condition attribute")),
        }
    }
}

/// Everything `#[condition(...)]` attributes on one field can say.
#[derive(Debug, Default)]
pub struct ConditionMeta {
    pub name: Option<syn::LitStr>,
    pub operators: Vec<syn::Ident>,
    pub excluded: bool,
    pub ignored: bool,
}

impl syn::parse::Parse for ConditionMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let mut meta = ConditionMeta::default();
        let punc = Punctuated::<ConditionItem, syn::Token![,]>::parse_terminated(input)?;

        for item in punc {
            match item {
                ConditionItem::Rename(new_name) => {
                    meta.name = Some(new_name);
                }
                ConditionItem::Operators(ops) => {
                    meta.operators.extend(ops);
                }
                ConditionItem::Excluded => {
                    meta.excluded = true;
                }
                ConditionItem::Ignored => {
                    meta.ignored = true;
                }
            }
        }

        Ok(meta)
    }
}

impl ConditionMeta {
    /// Fold another attribute's settings into this one.
    pub fn merge(&mut self, other: ConditionMeta) {
        if other.name.is_some() {
            self.name = other.name;
        }
        self.operators.extend(other.operators);
        self.excluded |= other.excluded;
        self.ignored |= other.ignored;
    }
}
