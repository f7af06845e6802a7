use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, LitStr};

/// Used outside a `#[handlers]` block the route attribute only checks its
/// path argument; registration happens in `#[handlers]`.
pub fn http_method_attribute(_method: &str, attr: TokenStream, item: TokenStream) -> TokenStream {
    let _path = parse_macro_input!(attr as LitStr);
    let input = parse_macro_input!(item as syn::ImplItemFn);

    TokenStream::from(quote! {
        #input
    })
}
