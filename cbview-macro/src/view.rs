use darling::ast::Data;
use darling::util::{Ignored, Override};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Type};

#[derive(FromField)]
#[darling(attributes(view))]
struct ViewField {
    ident: Option<syn::Ident>,
    ty: Type,
    /// `#[view(default)]` or `#[view(default = "path::to::fn")]`
    #[darling(default)]
    default: Option<Override<syn::Path>>,
    #[darling(default)]
    class_var: bool,
}

#[derive(FromDeriveInput)]
#[darling(attributes(view), supports(struct_named))]
struct ViewInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, ViewField>,
}

pub fn derive_view(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let parsed = match ViewInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };
    match generate_view_impl(&parsed) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_view_impl(input: &ViewInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = match &input.data {
        Data::Struct(fields) => &fields.fields,
        Data::Enum(_) => unreachable!("darling only accepts named structs here"),
    };

    let mut declarations = Vec::new();
    let mut initializers = Vec::new();
    for field in fields {
        let Some(field_name) = &field.ident else {
            continue;
        };
        let name = field_name.to_string();

        if field.class_var {
            let ty = &field.ty;
            declarations.push(quote! {
                ::cbview::view::Declaration::class_var::<#ty>(#name)
            });
            initializers.push(quote! {
                #field_name: ::core::default::Default::default()
            });
            continue;
        }

        let (inner, shared) = match arc_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (field.ty.clone(), false),
        };

        if let Type::TraitObject(_) = inner {
            if field.default.is_some() {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "trait object dependencies cannot have a default",
                ));
            }
            declarations.push(quote! {
                ::cbview::view::Declaration::required::<#inner>(#name)
            });
            initializers.push(quote! {
                #field_name: deps.take_trait::<#inner>(#name)?
            });
            continue;
        }

        declarations.push(match &field.default {
            None => quote! {
                ::cbview::view::Declaration::required::<#inner>(#name)
            },
            Some(Override::Inherit) => quote! {
                ::cbview::view::Declaration::with_default::<#inner>(
                    #name,
                    <#inner as ::core::default::Default>::default(),
                )
            },
            Some(Override::Explicit(path)) => quote! {
                ::cbview::view::Declaration::with_default::<#inner>(#name, #path())
            },
        });
        initializers.push(if shared {
            quote! { #field_name: deps.take::<#inner>(#name)? }
        } else {
            quote! { #field_name: deps.cloned::<#inner>(#name)? }
        });
    }

    Ok(quote! {
        impl #impl_generics ::cbview::View for #struct_name #ty_generics #where_clause {
            fn declarations() -> ::std::vec::Vec<::cbview::view::Declaration> {
                ::std::vec![#(#declarations),*]
            }

            fn init(
                #[allow(unused_mut)] mut deps: ::cbview::Injected,
                _args: ::cbview::BoundArguments,
            ) -> ::cbview::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#initializers),*
                })
            }
        }
    })
}

/// Extract the inner type from `Arc<T>` or `Arc<dyn Trait>`
pub(crate) fn arc_inner(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    }
}
