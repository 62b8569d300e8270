//! Explicit route table
//!
//! Routes are registered on a [`Router`] value that the server owns; there is
//! no process-wide registry. Dispatch matches the path component of the
//! request target exactly and falls back to `404` for unknown paths and `405`
//! for known paths requested with another method.

use super::response;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use std::sync::Arc;

/// A request handler
///
/// Implemented for any `Fn(&Request<()>) -> Response<Bytes>` closure or function.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: &Request<()>) -> Response<Bytes>;
}

impl<F> Handler for F
where
    F: Fn(&Request<()>) -> Response<Bytes> + Send + Sync + 'static,
{
    fn call(&self, request: &Request<()>) -> Response<Bytes> {
        self(request)
    }
}

#[derive(Clone)]
struct Route {
    path: String,
    methods: Vec<Method>,
    handler: Arc<dyn Handler>,
}

/// Route table mapping paths and methods to handlers
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `path`, accepting only `methods`
    pub fn route<H: Handler>(mut self, path: impl Into<String>, methods: &[Method], handler: H) -> Self {
        self.routes.push(Route {
            path: path.into(),
            methods: methods.to_vec(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes a request to its handler
    pub fn dispatch(&self, request: &Request<()>) -> Response<Bytes> {
        let path = request.uri().path();
        let mut allowed: Vec<Method> = Vec::new();

        for route in self.routes.iter().filter(|route| route.path == path) {
            if route.methods.contains(request.method()) {
                return route.handler.call(request);
            }
            allowed.extend(route.methods.iter().cloned());
        }

        if allowed.is_empty() {
            response::status(StatusCode::NOT_FOUND)
        } else {
            response::method_not_allowed(&allowed)
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| (&route.path, &route.methods)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ALLOW;

    fn ok(_: &Request<()>) -> Response<Bytes> {
        Response::new(Bytes::from_static(b"ok"))
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_dispatch_matches_route() {
        let router = Router::new().route("/headers", &[Method::GET, Method::POST], ok);

        let response = router.dispatch(&request(Method::GET, "/headers"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&response.body()[..], b"ok");

        let response = router.dispatch(&request(Method::POST, "/headers?debug=1"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let router = Router::new().route("/headers", &[Method::GET], ok);

        for uri in ["/", "/header", "/headers/", "/other"] {
            let response = router.dispatch(&request(Method::GET, uri));
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");
        }
    }

    #[test]
    fn test_wrong_method_is_not_allowed() {
        let router = Router::new().route("/headers", &[Method::GET, Method::POST], ok);

        let response = router.dispatch(&request(Method::DELETE, "/headers"));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }

    #[test]
    fn test_empty_router() {
        let router = Router::new();
        assert!(router.is_empty());
        let response = router.dispatch(&request(Method::GET, "/headers"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
