use crate::endpoint::Endpoint;
use axum::http::Method;

/// One registration: method and path matched to an endpoint.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    path: String,
    endpoint: Endpoint,
    tags: Vec<String>,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            method,
            path: path.into(),
            endpoint,
            tags: Vec::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// An ordered, mutable collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, method: Method, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.push(Route::new(method, path, endpoint));
        self
    }

    pub fn get(&mut self, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.route(Method::GET, path, endpoint)
    }

    pub fn post(&mut self, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.route(Method::POST, path, endpoint)
    }

    pub fn put(&mut self, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.route(Method::PUT, path, endpoint)
    }

    pub fn delete(&mut self, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.route(Method::DELETE, path, endpoint)
    }

    pub fn patch(&mut self, path: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.route(Method::PATCH, path, endpoint)
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }

    /// Removes and returns the matching routes. Both the removed and the
    /// remaining routes keep their relative order.
    pub fn take_where<F>(&mut self, mut predicate: F) -> Vec<Route>
    where
        F: FnMut(&Route) -> bool,
    {
        let (taken, kept) = std::mem::take(&mut self.routes)
            .into_iter()
            .partition(|route| predicate(route));
        self.routes = kept;
        taken
    }

    /// Appends the routes of `other` unchanged.
    pub fn include(&mut self, other: RouteTable) {
        self.routes.extend(other.routes);
    }

    /// Appends the routes of `other`, tagging each one.
    pub fn include_tagged<I, T>(&mut self, other: RouteTable, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.routes.extend(other.routes.into_iter().map(|mut route| {
            route.tags.extend(tags.iter().cloned());
            route
        }));
    }

    /// Appends the routes of `other` under `prefix`.
    pub fn nest(&mut self, prefix: &str, other: RouteTable) {
        let prefix = prefix.trim_end_matches('/');
        self.routes.extend(other.routes.into_iter().map(|mut route| {
            route.path = if route.path == "/" && !prefix.is_empty() {
                prefix.to_string()
            } else {
                format!("{}{}", prefix, route.path)
            };
            route
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::function(name, Signature::empty(), |_| async { "" })
    }

    fn paths(table: &RouteTable) -> Vec<&str> {
        table.routes().iter().map(Route::path).collect()
    }

    #[test]
    fn test_take_where_is_stable() {
        let mut table = RouteTable::new();
        table
            .get("/a", endpoint("a"))
            .get("/b", endpoint("b"))
            .get("/c", endpoint("c"))
            .get("/d", endpoint("d"));

        let taken = table.take_where(|r| r.path() == "/b" || r.path() == "/d");

        assert_eq!(paths(&table), ["/a", "/c"]);
        assert_eq!(taken.iter().map(Route::path).collect::<Vec<_>>(), ["/b", "/d"]);
    }

    #[test]
    fn test_nest_prefixes_paths() {
        let mut inner = RouteTable::new();
        inner.get("/", endpoint("root")).get("/login", endpoint("login"));

        let mut web = RouteTable::new();
        web.nest("/web/", inner);

        assert_eq!(paths(&web), ["/web", "/web/login"]);
    }

    #[test]
    fn test_include_tagged_keeps_order() {
        let mut inner = RouteTable::new();
        inner.post("/x", endpoint("x")).delete("/y", endpoint("y"));

        let mut outer = RouteTable::new();
        outer.get("/first", endpoint("first"));
        outer.include_tagged(inner, ["Test"]);

        assert_eq!(paths(&outer), ["/first", "/x", "/y"]);
        assert!(outer.routes()[0].tags().is_empty());
        assert_eq!(outer.routes()[2].tags(), ["Test".to_string()]);
    }
}
