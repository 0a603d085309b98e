use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, Meta, PathArguments, Type,
};

use crate::is_meta_field;

enum Role<'a> {
    Persisted {
        ident: &'a Ident,
        stored: String,
        codable: Option<Codable<'a>>,
    },
    Parent {
        ident: &'a Ident,
        ty: &'a Type,
    },
    Meta(&'a Ident),
    Plain(&'a Ident),
}

struct Codable<'a> {
    ty: &'a Type,
    optional: bool,
}

pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Model derive only supports structs with named fields"),
        },
        _ => panic!("Model derive only supports structs"),
    };
    let roles: Vec<Role> = fields.iter().map(role).collect();

    let mut declarations = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut constructors = Vec::new();
    let mut parent = None;
    let mut meta = None;

    for role in &roles {
        match role {
            Role::Persisted {
                ident,
                stored,
                codable,
            } => {
                match codable {
                    Some(Codable { ty, optional: true }) => {
                        declarations.push(quote! { .codable::<#ty>(#stored) });
                        getters.push(quote! {
                            #stored => ::std::option::Option::Some(
                                ::odm_rust::FieldRef::optional_model(self.#ident.as_ref())
                            ),
                        });
                        setters.push(quote! { #stored => self.#ident = value.into_optional_model()?, });
                        constructors.push(quote! { #ident: ::std::option::Option::None });
                    }
                    Some(Codable { ty, optional: false }) => {
                        declarations.push(quote! { .codable::<#ty>(#stored) });
                        getters.push(quote! {
                            #stored => ::std::option::Option::Some(::odm_rust::FieldRef::model(&self.#ident)),
                        });
                        setters.push(quote! { #stored => self.#ident = value.into_model()?, });
                        constructors.push(quote! {
                            #ident: <#ty as ::odm_rust::Model>::construct(::std::option::Option::None)?
                        });
                    }
                    None => {
                        declarations.push(quote! { .field(#stored) });
                        getters.push(quote! {
                            #stored => ::std::option::Option::Some(::odm_rust::FieldRef::value(&self.#ident)),
                        });
                        setters.push(quote! { #stored => self.#ident = value.into_field()?, });
                        constructors.push(quote! { #ident: ::std::default::Default::default() });
                    }
                }
            }
            Role::Parent { ident, ty } => {
                if parent.is_some() {
                    panic!("Model derive: only one field may be marked #[model(extends)]");
                }
                parent = Some((*ident, *ty));
                constructors.push(quote! {
                    #ident: <#ty as ::odm_rust::Model>::construct(::std::option::Option::None)?
                });
            }
            Role::Meta(ident) => {
                meta = Some(*ident);
                constructors.push(quote! {
                    #ident: ::odm_rust::DocumentMeta::bind::<Self>(reference)?
                });
            }
            Role::Plain(ident) => {
                constructors.push(quote! { #ident: ::std::default::Default::default() });
            }
        }
    }

    let extends = parent.map(|(_, ty)| quote! { fields.extends::<#ty>(); });
    let declare = if declarations.is_empty() {
        quote! { let _ = fields; }
    } else {
        quote! { fields #(#declarations)*; }
    };

    let (field_fallback, set_fallback, parent_decoded) = match parent {
        Some((ident, _)) => (
            quote! { _ => ::odm_rust::Fields::field(&self.#ident, name), },
            quote! { _ => return ::odm_rust::Fields::set_field(&mut self.#ident, name, value), },
            quote! { ::odm_rust::Model::decoded(&mut self.#ident, data); },
        ),
        None => (
            quote! { _ => ::std::option::Option::None, },
            quote! { _ => return ::std::result::Result::Ok(false), },
            quote! {},
        ),
    };

    let unused_reference = if meta.is_none() {
        Some(quote! { let _ = reference; })
    } else {
        None
    };
    let audit = meta.map(|ident| quote! { self.#ident.apply_audit(data); });
    let unused_value = if setters.is_empty() && parent.is_none() {
        Some(quote! { let _ = value; })
    } else {
        None
    };

    let expanded = quote! {
        impl #impl_generics ::odm_rust::Fields for #name #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::std::option::Option<::odm_rust::FieldRef<'_>> {
                match name {
                    #(#getters)*
                    #field_fallback
                }
            }

            #[allow(unreachable_code)]
            fn set_field(
                &mut self,
                name: &str,
                value: ::odm_rust::FieldValue,
            ) -> ::std::result::Result<bool, ::odm_rust::OdmError> {
                #unused_value
                match name {
                    #(#setters)*
                    #set_fallback
                }
                ::std::result::Result::Ok(true)
            }
        }

        impl #impl_generics ::odm_rust::Model for #name #ty_generics #where_clause {
            fn declare_fields(fields: &mut ::odm_rust::FieldDeclarations) {
                #extends
                #declare
            }

            fn construct(
                reference: ::std::option::Option<::odm_rust::DocumentReference>,
            ) -> ::std::result::Result<Self, ::odm_rust::OdmError> {
                #unused_reference
                ::std::result::Result::Ok(Self {
                    #(#constructors,)*
                })
            }

            fn decoded(&mut self, data: &::odm_rust::Map) {
                let _ = data;
                #parent_decoded
                #audit
            }
        }
    };

    TokenStream::from(expanded)
}

fn role(field: &Field) -> Role<'_> {
    let ident = field
        .ident
        .as_ref()
        .expect("Model derive only supports named fields");

    if is_meta_field(field) {
        return Role::Meta(ident);
    }

    for attr in &field.attrs {
        if attr.path().is_ident("model") {
            let mut extends = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("extends") {
                    extends = true;
                }
                Ok(())
            });
            if extends {
                return Role::Parent {
                    ident,
                    ty: &field.ty,
                };
            }
        }

        if !attr.path().is_ident("field") {
            continue;
        }

        let mut stored = ident.to_string();
        let mut codable = false;
        if let Meta::List(_) = &attr.meta {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("codable") {
                    codable = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    stored = value.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `codable` or `name = \"...\"`"))
                }
            })
            .unwrap_or_else(|err| panic!("Model derive: {}", err));
        }

        let codable = codable.then(|| match option_inner(&field.ty) {
            Some(ty) => Codable { ty, optional: true },
            None => Codable {
                ty: &field.ty,
                optional: false,
            },
        });
        return Role::Persisted {
            ident,
            stored,
            codable,
        };
    }

    Role::Plain(ident)
}

/// `T` of a field written as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
