use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr};

use crate::{is_meta_field, to_snake_case};

struct DocumentAttrs {
    name: Option<String>,
    version: Option<String>,
    sub_collections: Vec<String>,
}

pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = parse_struct_attrs(&input);
    let meta_field = extract_meta_field(&input);

    // Default: snake_case struct name
    let model_name = attrs
        .name
        .unwrap_or_else(|| to_snake_case(&name.to_string()));
    let version = attrs.version.map(|version| {
        quote! {
            fn version() -> &'static str {
                #version
            }
        }
    });
    let sub_collections = &attrs.sub_collections;

    let expanded = quote! {
        impl #impl_generics ::odm_rust::Document for #name #ty_generics #where_clause {
            const MODEL_NAME: &'static str = #model_name;

            #version

            fn sub_collection_names() -> &'static [&'static str] {
                &[#(#sub_collections),*]
            }

            fn meta(&self) -> &::odm_rust::DocumentMeta {
                &self.#meta_field
            }

            fn meta_mut(&mut self) -> &mut ::odm_rust::DocumentMeta {
                &mut self.#meta_field
            }
        }
    };

    TokenStream::from(expanded)
}

fn parse_struct_attrs(input: &DeriveInput) -> DocumentAttrs {
    let mut attrs = DocumentAttrs {
        name: None,
        version: None,
        sub_collections: Vec::new(),
    };

    for attr in &input.attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.name = Some(value.value());
            } else if meta.path.is_ident("version") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.version = Some(value.value());
            } else if meta.path.is_ident("sub_collections") {
                meta.parse_nested_meta(|collection| {
                    let ident = collection
                        .path
                        .get_ident()
                        .ok_or_else(|| collection.error("expected a collection name"))?;
                    attrs.sub_collections.push(ident.to_string());
                    Ok(())
                })?;
            } else {
                return Err(meta.error("expected `name`, `version` or `sub_collections(...)`"));
            }
            Ok(())
        })
        .unwrap_or_else(|err| panic!("Document derive: {}", err));
    }

    attrs
}

fn extract_meta_field(input: &DeriveInput) -> syn::Ident {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            for field in &fields.named {
                if is_meta_field(field) {
                    if let Some(ident) = &field.ident {
                        return ident.clone();
                    }
                }
            }
        }
    }

    panic!("Document derive: no field marked with #[document(meta)]");
}
