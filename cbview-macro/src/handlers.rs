use crate::view::arc_inner;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, Type};

const HTTP_METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];
const PARAM_ATTRS: [&str; 5] = ["param", "query", "header", "body", "inject"];

#[derive(Clone, Copy)]
enum ParamKind {
    Path,
    Query,
    Header,
    Body,
    Inject,
}

struct ParamInfo {
    ident: syn::Ident,
    ty: Type,
    kind: ParamKind,
}

struct RouteInfo {
    method: syn::Ident,
    path: LitStr,
    fn_name: syn::Ident,
    is_async: bool,
    params: Vec<ParamInfo>,
}

pub fn handlers_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    match generate_handlers_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_handlers_impl(input: ItemImpl) -> syn::Result<TokenStream2> {
    let mut routes = Vec::new();
    let mut clean_items = Vec::new();

    for item in input.items.iter() {
        let ImplItem::Fn(method) = item else {
            clean_items.push(item.clone());
            continue;
        };
        let Some(route) = extract_route_info(method)? else {
            clean_items.push(item.clone());
            continue;
        };
        routes.push(route);

        let mut clean_method = method.clone();
        clean_method.attrs.retain(|attr| !is_one_of(attr, &HTTP_METHODS));
        for input in clean_method.sig.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = input {
                pat_type.attrs.retain(|attr| !is_one_of(attr, &PARAM_ATTRS));
            }
        }
        clean_items.push(ImplItem::Fn(clean_method));
    }

    let registrations = routes.iter().map(route_registration);

    let attrs = &input.attrs;
    let self_ty = &input.self_ty;
    let generics = &input.generics;
    let where_clause = &input.generics.where_clause;

    Ok(quote! {
        #(#attrs)*
        impl #generics #self_ty #where_clause {
            #(#clean_items)*

            /// Registers every handler method of this view on `router`.
            pub fn register_routes(router: &mut ::cbview::RouteTable) {
                #(#registrations)*
            }
        }
    })
}

fn route_registration(route: &RouteInfo) -> TokenStream2 {
    let method = &route.method;
    let path = &route.path;
    let fn_name = &route.fn_name;
    let endpoint_name = fn_name.to_string();

    let declarations = route.params.iter().map(|p| {
        let name = p.ident.to_string();
        let ty = &p.ty;
        match p.kind {
            ParamKind::Path => quote! { ::cbview::Parameter::path(#name).annotated::<#ty>() },
            ParamKind::Query => quote! { ::cbview::Parameter::query(#name).annotated::<#ty>() },
            ParamKind::Header => quote! { ::cbview::Parameter::header(#name).annotated::<#ty>() },
            ParamKind::Body => quote! { ::cbview::Parameter::body(#name).annotated::<#ty>() },
            ParamKind::Inject => {
                let inner = arc_inner(ty).unwrap_or_else(|| ty.clone());
                quote! { ::cbview::Parameter::service::<#inner>(#name) }
            }
        }
    });

    let extractions = route.params.iter().map(|p| {
        let ident = &p.ident;
        let name = ident.to_string();
        let ty = &p.ty;
        let value = match p.kind {
            ParamKind::Path | ParamKind::Query | ParamKind::Header => {
                quote! { __args.parse::<#ty>(#name)? }
            }
            ParamKind::Body => quote! { __args.json::<#ty>(#name)? },
            ParamKind::Inject => match arc_inner(ty) {
                Some(inner @ Type::TraitObject(_)) => quote! { __args.take_trait::<#inner>(#name)? },
                Some(inner) => quote! { __args.take::<#inner>(#name)? },
                None => quote! { __args.take::<#ty>(#name)? },
            },
        };
        quote! { let #ident = #value; }
    });

    let args: Vec<_> = route.params.iter().map(|p| &p.ident).collect();
    let call = if route.is_async {
        quote! { __this.#fn_name(#(#args),*).await }
    } else {
        quote! { __this.#fn_name(#(#args),*) }
    };

    quote! {
        router.route(
            ::cbview::axum::http::Method::#method,
            #path,
            ::cbview::Endpoint::method::<Self, _, _, _>(
                #endpoint_name,
                ::cbview::Signature::empty()
                    .with(::cbview::Parameter::receiver("self"))
                    #(.with(#declarations))*,
                |__this: ::std::sync::Arc<Self>, __args: ::cbview::BoundArguments| async move {
                    #[allow(unused_mut)]
                    let mut __args = __args;
                    #(#extractions)*
                    ::core::result::Result::<_, ::cbview::ViewError>::Ok(
                        ::cbview::axum::response::IntoResponse::into_response(#call),
                    )
                },
            ),
        );
    }
}

fn extract_route_info(method: &ImplItemFn) -> syn::Result<Option<RouteInfo>> {
    let Some(attr) = method.attrs.iter().find(|attr| is_one_of(attr, &HTTP_METHODS)) else {
        return Ok(None);
    };
    let http_method = attr
        .path()
        .get_ident()
        .map(|ident| format_ident!("{}", ident.to_string().to_uppercase()))
        .ok_or_else(|| syn::Error::new_spanned(attr, "expected an HTTP method attribute"))?;
    let path: LitStr = attr.parse_args()?;

    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "handler methods must take `&self`",
            ));
        }
    }

    let mut params = Vec::new();
    for input in method.sig.inputs.iter().skip(1) {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "handler parameters must be plain identifiers",
            ));
        };
        let kind = param_kind(&pat_type.attrs);
        if let ParamKind::Inject = kind {
            if arc_inner(&pat_type.ty).is_none() {
                return Err(syn::Error::new_spanned(
                    &pat_type.ty,
                    "#[inject] parameters must be `Arc<T>`",
                ));
            }
        }
        params.push(ParamInfo {
            ident: pat_ident.ident.clone(),
            ty: (*pat_type.ty).clone(),
            kind,
        });
    }

    Ok(Some(RouteInfo {
        method: http_method,
        path,
        fn_name: method.sig.ident.clone(),
        is_async: method.sig.asyncness.is_some(),
        params,
    }))
}

/// Unannotated parameters are read from the query string.
fn param_kind(attrs: &[Attribute]) -> ParamKind {
    for attr in attrs {
        if let Some(ident) = attr.path().get_ident() {
            match ident.to_string().as_str() {
                "param" => return ParamKind::Path,
                "query" => return ParamKind::Query,
                "header" => return ParamKind::Header,
                "body" => return ParamKind::Body,
                "inject" => return ParamKind::Inject,
                _ => {}
            }
        }
    }
    ParamKind::Query
}

fn is_one_of(attr: &Attribute, names: &[&str]) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| names.contains(&ident.to_string().as_str()))
}
