use super::{Route, RouteTable};
use crate::di::HasContainer;
use crate::endpoint::Endpoint;
use crate::error::{Result, ViewError};
use crate::inject::{Injector, RequestContext};
use axum::extract::{FromRequestParts, Path, Query, Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use std::collections::HashMap;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Resolves the endpoint's current signature against `ctx` and calls it.
pub async fn dispatch(endpoint: &Endpoint, ctx: &RequestContext<'_>) -> Result<Response> {
    let signature = endpoint.signature();
    let args = Injector::resolve(&signature, ctx)?;
    endpoint.call(args).await
}

impl RouteTable {
    /// Builds an axum router serving every route of this table.
    ///
    /// Routes sharing a path are mounted on one method router, in table
    /// order. Registering the same method twice for a path is an error.
    pub fn into_router<S>(self) -> Result<axum::Router<S>>
    where
        S: HasContainer + Clone + Send + Sync + 'static,
    {
        let mut grouped: Vec<(String, Vec<Route>)> = Vec::new();
        for route in self.into_routes() {
            match grouped.iter_mut().find(|(path, _)| path == route.path()) {
                Some((_, routes)) => routes.push(route),
                None => grouped.push((route.path().to_string(), vec![route])),
            }
        }

        let mut router = axum::Router::new();
        for (path, routes) in grouped {
            let mut method_router: MethodRouter<S> = MethodRouter::new();
            let mut mounted: Vec<Method> = Vec::new();
            for route in routes {
                if mounted.contains(route.method()) {
                    return Err(ViewError::DuplicateRoute {
                        method: route.method().to_string(),
                        path,
                    });
                }
                let filter = MethodFilter::try_from(route.method().clone()).map_err(|_| {
                    ViewError::UnsupportedMethod {
                        method: route.method().to_string(),
                    }
                })?;
                tracing::debug!(
                    method = %route.method(),
                    path = %path,
                    endpoint = route.endpoint().name(),
                    "mounting route"
                );
                mounted.push(route.method().clone());
                method_router = method_router.on(filter, endpoint_handler::<S>(route.endpoint().clone()));
            }
            router = router.route(&path, method_router);
        }
        Ok(router)
    }
}

fn endpoint_handler<S>(
    endpoint: Endpoint,
) -> impl FnOnce(State<S>, Request) -> crate::endpoint::BoxFuture<Response> + Clone + Send + Sync + 'static
where
    S: HasContainer + Clone + Send + Sync + 'static,
{
    move |State(state): State<S>, request: Request| -> crate::endpoint::BoxFuture<Response> {
        Box::pin(async move {
            match serve(&endpoint, &state, request).await {
                Ok(response) => response,
                Err(err) => {
                    if err.status().is_server_error() {
                        tracing::error!(endpoint = endpoint.name(), error = %err, "request failed");
                    } else {
                        tracing::warn!(endpoint = endpoint.name(), error = %err, "request rejected");
                    }
                    err.into_response()
                }
            }
        })
    }
}

async fn serve<S>(endpoint: &Endpoint, state: &S, request: Request) -> Result<Response>
where
    S: HasContainer + Send + Sync,
{
    let (mut parts, body) = request.into_parts();
    let path = Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    let body = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| ViewError::BodyRead(e.to_string()))?;

    let ctx = RequestContext::new(state.get_container())
        .with_path(path)
        .with_query(query)
        .with_headers(parts.headers)
        .with_body(body);
    dispatch(endpoint, &ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Container;
    use crate::signature::{Parameter, Signature};
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn echo() -> Endpoint {
        Endpoint::function(
            "echo",
            Signature::empty().with(Parameter::path("word")),
            |mut args| async move { args.text("word") },
        )
    }

    #[test]
    fn test_duplicate_method_and_path_is_rejected() {
        let mut table = RouteTable::new();
        table.get("/echo/{word}", echo()).get("/echo/{word}", echo());

        let err = table.into_router::<Arc<Container>>().unwrap_err();
        assert!(matches!(err, ViewError::DuplicateRoute { .. }));
    }

    #[tokio::test]
    async fn test_methods_on_one_path_share_a_router() {
        let mut table = RouteTable::new();
        table.get("/echo/{word}", echo()).post("/echo/{word}", echo());
        let app = table
            .into_router::<Arc<Container>>()
            .unwrap()
            .with_state(Arc::new(Container::new()));

        for method in [Method::GET, Method::POST] {
            let response = app
                .clone()
                .oneshot(
                    axum::http::Request::builder()
                        .method(method)
                        .uri("/echo/hi")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_dispatch_reads_the_current_signature() {
        let endpoint = echo();
        let container = Container::new();
        let ctx = RequestContext::new(&container)
            .with_query(HashMap::from([("word".to_string(), "q".to_string())]));

        // `word` is a path parameter, so the query value is ignored.
        let err = dispatch(&endpoint, &ctx).await.unwrap_err();
        assert!(matches!(err, ViewError::ArgumentMissing { .. }));

        endpoint.set_signature(Signature::empty().with(Parameter::query("word")));
        let response = dispatch(&endpoint, &ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
