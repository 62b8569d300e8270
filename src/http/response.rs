//! Response builders shared by the router and the server

use bytes::Bytes;
use http::header::{ALLOW, CONNECTION, CONTENT_TYPE, HeaderValue, SERVER};
use http::{Method, Response, StatusCode};

/// Builds a JSON response with the given status
pub fn json(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Builds a plain-text response whose body is the status line
pub fn status(status: StatusCode) -> Response<Bytes> {
    let body = format!(
        "{} {}\n",
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Builds a `405 Method Not Allowed` response listing the accepted methods
pub fn method_not_allowed(allowed: &[Method]) -> Response<Bytes> {
    let mut response = status(StatusCode::METHOD_NOT_ALLOWED);
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Adds the connection-level headers every response carries
pub fn finalize(
    mut response: Response<Bytes>,
    keep_alive: bool,
    server_name: Option<&str>,
) -> Response<Bytes> {
    let headers = response.headers_mut();
    if let Some(value) = server_name.and_then(|name| HeaderValue::from_str(name).ok()) {
        headers.insert(SERVER, value);
    }
    headers.insert(
        CONNECTION,
        HeaderValue::from_static(if keep_alive { "keep-alive" } else { "close" }),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body() {
        let response = status(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&response.body()[..], b"404 Not Found\n");
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = method_not_allowed(&[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }

    #[test]
    fn test_finalize() {
        let response = finalize(status(StatusCode::OK), false, Some("HeaderEcho/test"));
        assert_eq!(response.headers()[CONNECTION], "close");
        assert_eq!(response.headers()[SERVER], "HeaderEcho/test");

        let response = finalize(status(StatusCode::OK), true, None);
        assert_eq!(response.headers()[CONNECTION], "keep-alive");
        assert!(response.headers().get(SERVER).is_none());
    }
}
