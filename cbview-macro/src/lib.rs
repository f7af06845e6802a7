use proc_macro::TokenStream;

mod handlers;
mod http_methods;
mod view;

/// Derive macro implementing `cbview::View` from a struct's fields
///
/// Every named field is a dependency declaration, resolved by name when the
/// view is built for a request:
///
/// - `Arc<T>` is injected from the container.
/// - `Arc<dyn Trait>` is injected through a trait binding.
/// - Any other `T: Clone` is injected and cloned.
/// - `#[view(default)]` or `#[view(default = "path::to::fn")]` supplies a
///   value used when the container has none.
/// - `#[view(class_var)]` keeps the field out of the dependency list. It is
///   never injected; every instance, one per request, starts it from
///   `Default::default()`. State shared across requests belongs in a
///   container service instead.
///
/// # Example
/// ```ignore
/// use cbview::View;
///
/// #[derive(View)]
/// pub struct WidgetView {
///     repo: Arc<WidgetRepository>,
///     #[view(default = "default_page_size")]
///     page_size: u32,
/// }
/// ```
#[proc_macro_derive(View, attributes(view))]
pub fn derive_view(input: TokenStream) -> TokenStream {
    view::derive_view(input)
}

/// Attribute macro turning the routed methods of an impl block into
/// endpoints owned by the view
///
/// Generates `register_routes(&mut RouteTable)`. Parameter sources are
/// picked with `#[param]`, `#[query]`, `#[header]`, `#[body]` and
/// `#[inject]`; unannotated parameters come from the query string.
///
/// # Example
/// ```ignore
/// #[handlers]
/// impl WidgetView {
///     #[get("/widgets/{id}")]
///     async fn get_widget(&self, #[param] id: u64) -> Json<Widget> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    handlers::handlers_attribute(attr, item)
}

/// HTTP GET method attribute for view methods
#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("GET", attr, item)
}

/// HTTP POST method attribute for view methods
#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("POST", attr, item)
}

/// HTTP PUT method attribute for view methods
#[proc_macro_attribute]
pub fn put(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("PUT", attr, item)
}

/// HTTP DELETE method attribute for view methods
#[proc_macro_attribute]
pub fn delete(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("DELETE", attr, item)
}

/// HTTP PATCH method attribute for view methods
#[proc_macro_attribute]
pub fn patch(attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute("PATCH", attr, item)
}
