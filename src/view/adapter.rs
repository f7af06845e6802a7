use super::{ClassBinding, View};
use crate::endpoint::Endpoint;
use crate::error::{Result, ViewError};
use crate::routing::{Route, RouteTable};
use crate::signature::{ParamDefault, Parameter, ParameterKind, Signature};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, LazyLock};

static GLOBAL_REGISTRY: LazyLock<ViewRegistry> = LazyLock::new(ViewRegistry::new);

/// Records which views have been adapted, and their bindings.
///
/// A view is prepared at most once per registry; later adaptations reuse the
/// stored binding instead of wrapping the initializer again.
#[derive(Default)]
pub struct ViewRegistry {
    bindings: DashMap<TypeId, Arc<ClassBinding>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// The registry behind [`cbv`].
    pub fn global() -> &'static ViewRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn is_adapted<C: 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<C>())
    }

    pub fn binding<C: 'static>(&self) -> Option<Arc<ClassBinding>> {
        self.bindings
            .get(&TypeId::of::<C>())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Installs the injectable initializer of `C` unless already done.
    pub fn prepare<C: View>(&self) -> Result<Arc<ClassBinding>> {
        if let Some(binding) = self.binding::<C>() {
            return Ok(binding);
        }
        let binding = Arc::new(ClassBinding::install::<C>()?);
        tracing::debug!(
            view = binding.class().name(),
            dependencies = binding.dependencies().len(),
            "prepared view"
        );
        let stored = self
            .bindings
            .entry(TypeId::of::<C>())
            .or_insert(binding)
            .value()
            .clone();
        Ok(stored)
    }

    /// Adapts `C` and moves its routes on `router` behind a per-request
    /// instance of `C`.
    pub fn apply<C: View>(&self, router: &mut RouteTable) -> Result<Arc<ClassBinding>> {
        let binding = self.prepare::<C>()?;
        let relocated = relocate_routes(router, &binding)?;
        tracing::debug!(
            view = binding.class().name(),
            routes = relocated,
            "relocated view routes"
        );
        Ok(binding)
    }
}

/// Decorator-style entry point: `cbv(&mut router).view::<Widget>()`.
pub fn cbv(router: &mut RouteTable) -> Cbv<'_> {
    Cbv {
        router,
        registry: ViewRegistry::global(),
    }
}

pub struct Cbv<'r> {
    router: &'r mut RouteTable,
    registry: &'r ViewRegistry,
}

impl<'r> Cbv<'r> {
    pub fn with_registry(self, registry: &'r ViewRegistry) -> Self {
        Self { registry, ..self }
    }

    pub fn view<C: View>(self) -> Result<Arc<ClassBinding>> {
        self.registry.apply::<C>(self.router)
    }
}

/// Moves every route owned by the bound view to the end of `router`, in
/// their original relative order, with rewritten signatures.
///
/// Routes already relocated for this binding stay where they are. Nothing is
/// changed if any signature cannot be rewritten. Returns the number of
/// relocated routes.
pub fn relocate_routes(router: &mut RouteTable, binding: &Arc<ClassBinding>) -> Result<usize> {
    let class = binding.class();
    let pending = |route: &Route| {
        route.endpoint().is_owned_by(class) && !is_relocated(route.endpoint(), binding)
    };
    let rewritten = router
        .routes()
        .iter()
        .filter(|route| pending(route))
        .map(|route| rewrite_endpoint_signature(binding, route.endpoint()))
        .collect::<Result<Vec<_>>>()?;

    let matched: Vec<Route> = router.take_where(pending);
    let mut sub_router = RouteTable::new();
    for (route, signature) in matched.into_iter().zip(rewritten) {
        route.endpoint().set_signature(signature);
        sub_router.push(route);
    }
    let relocated = sub_router.len();
    router.include(sub_router);
    Ok(relocated)
}

/// The endpoint's receiver already constructs through `binding`.
fn is_relocated(endpoint: &Endpoint, binding: &Arc<ClassBinding>) -> bool {
    matches!(
        endpoint.signature().first().map(Parameter::default),
        Some(ParamDefault::Construct(bound)) if Arc::ptr_eq(bound, binding)
    )
}

/// Computes the injectable signature of a view method: the receiver
/// resolves by constructing the view, every other parameter binds by name.
pub fn rewrite_endpoint_signature(
    binding: &Arc<ClassBinding>,
    endpoint: &Endpoint,
) -> Result<Signature> {
    let current = endpoint.signature();
    let mut parameters = current.parameters().iter();
    let receiver = parameters
        .next()
        .ok_or_else(|| ViewError::SignatureIncompatible {
            class: binding.class().name().to_string(),
            endpoint: endpoint.name().to_string(),
        })?;

    let mut rewritten =
        vec![receiver.clone().with_default(ParamDefault::Construct(Arc::clone(binding)))];
    rewritten.extend(parameters.map(|p| match p.kind() {
        ParameterKind::VarPositional | ParameterKind::VarKeyword => p.clone(),
        _ => p.clone().keyword_only(),
    }));
    Signature::validated(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Arguments, BoundArguments, Injected, value};
    use crate::signature::{Parameter, Source, TypeInfo};
    use crate::view::Declaration;
    use axum::http::Method;

    struct Repository;

    struct Widget {
        #[allow(dead_code)]
        repo: Arc<Repository>,
    }

    impl View for Widget {
        fn declarations() -> Vec<Declaration> {
            vec![Declaration::required::<Repository>("repo")]
        }

        fn init(mut deps: Injected, _: BoundArguments) -> Result<Self> {
            Ok(Self {
                repo: deps.take::<Repository>("repo")?,
            })
        }
    }

    struct Gadget;

    impl View for Gadget {
        fn declarations() -> Vec<Declaration> {
            Vec::new()
        }

        fn init(_: Injected, _: BoundArguments) -> Result<Self> {
            Ok(Gadget)
        }
    }

    fn get_method<C: Send + Sync + 'static>(name: &str) -> Endpoint {
        Endpoint::method::<C, _, _, _>(
            name,
            Signature::empty()
                .with(Parameter::receiver("self"))
                .with(Parameter::path("id")),
            |_: Arc<C>, mut args: BoundArguments| async move { args.text("id") },
        )
    }

    fn health() -> Endpoint {
        Endpoint::function("health", Signature::empty(), |_| async { "ok" })
    }

    fn paths(router: &RouteTable) -> Vec<String> {
        router
            .routes()
            .iter()
            .map(|r| format!("{} {}", r.method(), r.path()))
            .collect()
    }

    #[test]
    fn test_apply_relocates_only_owned_routes() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        router
            .route(Method::GET, "/widgets/{id}", get_method::<Widget>("get"))
            .route(Method::GET, "/health", health())
            .route(Method::DELETE, "/widgets/{id}", get_method::<Widget>("remove"))
            .route(Method::GET, "/gadgets/{id}", get_method::<Gadget>("get"));

        registry.apply::<Widget>(&mut router).unwrap();

        assert_eq!(router.len(), 4);
        assert_eq!(
            paths(&router),
            [
                "GET /health",
                "GET /gadgets/{id}",
                "GET /widgets/{id}",
                "DELETE /widgets/{id}",
            ]
        );
        // Gadget shares the method name `get` but is left alone.
        let gadget = &router.routes()[1];
        assert!(matches!(
            gadget.endpoint().signature().first().unwrap().default(),
            ParamDefault::Empty
        ));
    }

    #[test]
    fn test_rewritten_signature_is_keyword_only_after_receiver() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        let endpoint = get_method::<Widget>("get");
        router.route(Method::GET, "/widgets/{id}", endpoint.clone());

        registry.apply::<Widget>(&mut router).unwrap();

        let sig = endpoint.signature();
        let receiver = sig.first().unwrap();
        assert_eq!(receiver.name(), "self");
        assert_eq!(receiver.source(), Source::Receiver);
        assert!(matches!(receiver.default(), ParamDefault::Construct(b) if b.class() == TypeInfo::of::<Widget>()));
        assert!(
            sig.parameters()[1..]
                .iter()
                .all(|p| p.kind() == ParameterKind::KeywordOnly)
        );
        // The handler itself still binds against what it declared.
        assert_eq!(
            endpoint.declared_signature().get("id").unwrap().kind(),
            ParameterKind::PositionalOrKeyword
        );
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        router.route(Method::GET, "/widgets/{id}", get_method::<Widget>("get"));

        let first = registry.apply::<Widget>(&mut router).unwrap();
        let second = registry.apply::<Widget>(&mut router).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_adapted::<Widget>());
        assert_eq!(router.len(), 1);
        // A second wrapping would pop `repo` twice and fail.
        second
            .construct_as::<Widget>(Arguments::new().with_keyword("repo", value(Repository)))
            .unwrap();
    }

    #[test]
    fn test_reapply_leaves_relocated_routes_in_place() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        router.route(Method::GET, "/widgets/{id}", get_method::<Widget>("get"));
        registry.apply::<Widget>(&mut router).unwrap();

        router.route(Method::GET, "/health", health());
        let binding = registry.binding::<Widget>().unwrap();
        let relocated = relocate_routes(&mut router, &binding).unwrap();

        assert_eq!(relocated, 0);
        assert_eq!(paths(&router), ["GET /widgets/{id}", "GET /health"]);

        // A route registered after the first pass is still picked up.
        router.route(Method::DELETE, "/widgets/{id}", get_method::<Widget>("remove"));
        registry.apply::<Widget>(&mut router).unwrap();
        assert_eq!(
            paths(&router),
            ["GET /widgets/{id}", "GET /health", "DELETE /widgets/{id}"]
        );
    }

    #[test]
    fn test_rewrite_keeps_variadic_parameters() {
        let binding = Arc::new(ClassBinding::install::<Gadget>().unwrap());
        let endpoint = Endpoint::method::<Gadget, _, _, _>(
            "search",
            Signature::empty()
                .with(Parameter::receiver("self"))
                .with(Parameter::query("term"))
                .with(Parameter::var_positional("args"))
                .with(Parameter::var_keyword("kwargs")),
            |_: Arc<Gadget>, _: BoundArguments| async { "" },
        );

        let sig = rewrite_endpoint_signature(&binding, &endpoint).unwrap();

        let kinds: Vec<_> = sig.parameters().iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            [
                ParameterKind::PositionalOrKeyword,
                ParameterKind::KeywordOnly,
                ParameterKind::VarPositional,
                ParameterKind::VarKeyword,
            ]
        );
    }

    #[test]
    fn test_receiverless_method_fails_without_touching_router() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        router
            .route(Method::GET, "/widgets/{id}", get_method::<Widget>("get"))
            .route(Method::GET, "/health", health())
            .route(
                Method::GET,
                "/widgets",
                Endpoint::method::<Widget, _, _, _>(
                    "list",
                    Signature::empty(),
                    |_: Arc<Widget>, _: BoundArguments| async { "[]" },
                ),
            );

        let err = registry.apply::<Widget>(&mut router).unwrap_err();

        assert!(matches!(err, ViewError::SignatureIncompatible { endpoint, .. } if endpoint == "list"));
        assert_eq!(
            paths(&router),
            ["GET /widgets/{id}", "GET /health", "GET /widgets"]
        );
        assert!(matches!(
            router.routes()[0].endpoint().signature().first().unwrap().default(),
            ParamDefault::Empty
        ));
    }

    #[test]
    fn test_sequential_views_do_not_interfere() {
        let registry = ViewRegistry::new();
        let mut widgets = RouteTable::new();
        let mut gadgets = RouteTable::new();
        widgets.route(Method::GET, "/w/{id}", get_method::<Widget>("get"));
        gadgets.route(Method::GET, "/g/{id}", get_method::<Gadget>("get"));

        registry.apply::<Widget>(&mut widgets).unwrap();
        registry.apply::<Gadget>(&mut gadgets).unwrap();

        let widget_default = widgets.routes()[0].endpoint().signature();
        let gadget_default = gadgets.routes()[0].endpoint().signature();
        assert!(matches!(widget_default.first().unwrap().default(), ParamDefault::Construct(b) if b.class().name().ends_with("Widget")));
        assert!(matches!(gadget_default.first().unwrap().default(), ParamDefault::Construct(b) if b.class().name().ends_with("Gadget")));
    }

    #[test]
    fn test_cbv_uses_the_given_registry() {
        let registry = ViewRegistry::new();
        let mut router = RouteTable::new();
        router.route(Method::GET, "/gadgets/{id}", get_method::<Gadget>("get"));

        cbv(&mut router).with_registry(&registry).view::<Gadget>().unwrap();

        assert!(registry.is_adapted::<Gadget>());
    }
}
