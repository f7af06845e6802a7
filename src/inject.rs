//! Request-time parameter resolution.
//!
//! The injector walks a published [`Signature`] and supplies every parameter
//! it can, always by name. Parameters it cannot resolve and that carry no
//! default are left out; the callee reports them when it binds.

use crate::arguments::{Arguments, Value, value};
use crate::di::Container;
use crate::error::Result;
use crate::signature::{ParamDefault, Parameter, Signature, Source};
use axum::body::Bytes;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Everything a request offers to the injector.
pub struct RequestContext<'a> {
    container: &'a Container,
    path: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
    parsed_body: OnceLock<Option<serde_json::Value>>,
}

impl<'a> RequestContext<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            container,
            path: HashMap::new(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            parsed_body: OnceLock::new(),
        }
    }

    pub fn with_path(mut self, path: HashMap<String, String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn container(&self) -> &Container {
        self.container
    }

    fn body_json(&self) -> Result<Option<serde_json::Value>> {
        if let Some(parsed) = self.parsed_body.get() {
            return Ok(parsed.clone());
        }
        let parsed = if self.body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&self.body)?)
        };
        Ok(self.parsed_body.get_or_init(|| parsed).clone())
    }

    fn header(&self, name: &str) -> Option<String> {
        let header = name.replace('_', "-");
        self.headers
            .get(header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

pub struct Injector;

impl Injector {
    /// Resolves the arguments for `signature` from `ctx`.
    pub fn resolve(signature: &Signature, ctx: &RequestContext<'_>) -> Result<Arguments> {
        let mut args = Arguments::new();
        for parameter in signature.parameters() {
            if parameter.is_variadic() {
                continue;
            }
            if let Some(resolved) = Self::resolve_parameter(parameter, ctx)? {
                args.insert(parameter.name(), resolved);
            }
        }
        Ok(args)
    }

    fn resolve_parameter(parameter: &Parameter, ctx: &RequestContext<'_>) -> Result<Option<Value>> {
        if let ParamDefault::Construct(binding) = parameter.default() {
            let init_args = Self::resolve(binding.signature(), ctx)?;
            return binding.construct(init_args).map(Some);
        }

        let name = parameter.name();
        let found = match parameter.source() {
            Source::Receiver => None,
            Source::Path => ctx.path.get(name).cloned().map(value),
            Source::Query => ctx.query.get(name).cloned().map(value),
            Source::Header => ctx.header(name).map(value),
            Source::Body => ctx.body_json()?.map(value),
            Source::Service => parameter
                .annotation()
                .and_then(|ty| ctx.container.resolve_value(ty.id())),
        };

        Ok(found.or_else(|| match parameter.default() {
            ParamDefault::Value(default) => Some(default.clone()),
            _ => None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{BoundArguments, Injected};
    use crate::error::ViewError;
    use crate::view::{ClassBinding, Declaration, View};
    use std::sync::Arc;

    struct Repository {
        name: &'static str,
    }

    struct Catalog {
        repo: Arc<Repository>,
        page_size: u32,
    }

    impl View for Catalog {
        fn declarations() -> Vec<Declaration> {
            vec![
                Declaration::required::<Repository>("repo"),
                Declaration::with_default::<u32>("page_size", 20),
            ]
        }

        fn init(mut deps: Injected, _: BoundArguments) -> Result<Self> {
            Ok(Self {
                repo: deps.take::<Repository>("repo")?,
                page_size: deps.cloned::<u32>("page_size")?,
            })
        }
    }

    fn receiver_signature(binding: Arc<ClassBinding>) -> Signature {
        Signature::empty()
            .with(Parameter::receiver("self").with_default(ParamDefault::Construct(binding)))
            .with(Parameter::path("id").keyword_only())
            .with(Parameter::query("q").keyword_only())
            .with(Parameter::header("x_tenant").keyword_only())
    }

    #[test]
    fn test_constructs_receiver_with_container_dependencies_and_defaults() {
        let binding = Arc::new(ClassBinding::install::<Catalog>().unwrap());
        let mut container = Container::new();
        container.register(Repository { name: "pg" });

        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());
        let ctx = RequestContext::new(&container)
            .with_path(HashMap::from([("id".to_string(), "42".to_string())]))
            .with_headers(headers);

        let sig = receiver_signature(binding);
        let args = Injector::resolve(&sig, &ctx).unwrap();
        assert!(!args.contains_keyword("q"));

        let without_q = Signature::validated(
            sig.parameters()
                .iter()
                .filter(|p| p.name() != "q")
                .cloned()
                .collect(),
        )
        .unwrap();
        let mut bound = args.bind(&without_q).unwrap();

        let catalog = bound.take::<Catalog>("self").unwrap();
        assert_eq!(catalog.repo.name, "pg");
        assert_eq!(catalog.page_size, 20);
        assert_eq!(bound.text("id").unwrap(), "42");
        assert_eq!(bound.text("x_tenant").unwrap(), "acme");
    }

    #[test]
    fn test_container_value_overrides_default() {
        let binding = Arc::new(ClassBinding::install::<Catalog>().unwrap());
        let mut container = Container::new();
        container.register(Repository { name: "pg" });
        container.register(50u32);

        let ctx = RequestContext::new(&container);
        let args = Injector::resolve(binding.signature(), &ctx).unwrap();
        let catalog = binding.construct_as::<Catalog>(args).unwrap();
        assert_eq!(catalog.page_size, 50);
    }

    #[test]
    fn test_missing_required_dependency_fails_construction() {
        let binding = Arc::new(ClassBinding::install::<Catalog>().unwrap());
        let container = Container::new();
        let ctx = RequestContext::new(&container);

        let err = Injector::resolve(&receiver_signature(binding), &ctx).unwrap_err();
        assert!(matches!(err, ViewError::DependencyMissing { name, .. } if name == "repo"));
    }

    #[test]
    fn test_body_is_parsed_once_and_shared() {
        let container = Container::new();
        let ctx = RequestContext::new(&container).with_body(Bytes::from_static(br#"{"n":1}"#));
        let sig = Signature::empty()
            .with(Parameter::body("first"))
            .with(Parameter::body("second"));

        let mut bound = Injector::resolve(&sig, &ctx).unwrap().bind(&sig).unwrap();
        assert_eq!(*bound.take::<serde_json::Value>("first").unwrap(), serde_json::json!({"n": 1}));
        assert!(bound.contains("second"));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let container = Container::new();
        let ctx = RequestContext::new(&container).with_body(Bytes::from_static(b"{"));
        let sig = Signature::empty().with(Parameter::body("payload"));

        let err = Injector::resolve(&sig, &ctx).unwrap_err();
        assert!(matches!(err, ViewError::InvalidBody(_)));
    }
}
