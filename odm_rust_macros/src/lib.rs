mod document;
mod model;

use proc_macro::TokenStream;

/// Derive `Fields` and `Model` for a struct with named fields.
///
/// Only fields marked `#[field]` are persisted, in declaration order:
///
/// ```ignore
/// #[derive(Model)]
/// struct Order {
///     #[model(extends)]
///     base: Audited,              // parent model, its fields come first
///     #[field]
///     total: i64,
///     #[field(name = "shipTo")]
///     ship_to: String,            // stored under another key
///     #[field(codable)]
///     address: Option<Address>,   // nested model, encoded recursively
///     cache: Vec<u8>,             // not persisted, starts at Default
/// }
/// ```
///
/// Documents mark their `DocumentMeta` with `#[document(meta)]` and also
/// derive `Document`.
#[proc_macro_derive(Model, attributes(field, model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}

/// Derive `Document`. Requires `#[derive(Model)]` on the same struct.
///
/// ```ignore
/// #[derive(Model, Document)]
/// #[document(name = "user", version = "2", sub_collections(posts, likes))]
/// struct User {
///     #[document(meta)]
///     meta: DocumentMeta,
///     #[field]
///     name: String,
/// }
/// ```
///
/// The model name defaults to the snake_case struct name, the version to "1".
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    document::derive_document(input)
}

pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Whether `field` carries `#[document(meta)]`.
pub(crate) fn is_meta_field(field: &syn::Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("document") {
            return false;
        }
        let mut is_meta = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("meta") {
                is_meta = true;
            }
            Ok(())
        });
        is_meta
    })
}
