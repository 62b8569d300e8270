use super::headers::HeaderMapping;
use super::response;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use tracing::{debug, error, info};

/// Echoes the request headers back as a JSON object
///
/// Each distinct header name appears once in the body with the last value
/// received for it. The mapping is logged on every call.
///
/// # Examples
///
/// ```
/// use header_echo::http::echo_headers;
/// use header_echo::HeaderMapping;
/// use http::{Request, StatusCode};
///
/// let request = Request::get("/headers")
///     .header("X-Test", "abc")
///     .header("Accept", "*/*")
///     .body(())
///     .unwrap();
///
/// let response = echo_headers(&request);
/// assert_eq!(response.status(), StatusCode::OK);
///
/// let mapping = HeaderMapping::from_json(response.body()).unwrap();
/// assert_eq!(mapping.get("X-Test"), Some("abc"));
/// assert_eq!(mapping.get("Accept"), Some("*/*"));
/// ```
pub fn echo_headers(request: &Request<()>) -> Response<Bytes> {
    for (name, value) in request.headers() {
        debug!("-> {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }

    let mapping = HeaderMapping::from_headers(request.headers());
    info!(count = mapping.len(), headers = %mapping, "Echoing request headers");

    match mapping.to_json() {
        Ok(body) => response::json(StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to serialize header mapping");
            response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_echo_headers_duplicates() {
        let request = Request::post("/headers")
            .header("x-dup", "one")
            .header("Host", "localhost")
            .header("X-Dup", "two")
            .body(())
            .unwrap();

        let response = echo_headers(&request);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let mapping = HeaderMapping::from_json(response.body()).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("X-Dup"), Some("two"));
        assert_eq!(mapping.get("Host"), Some("localhost"));
    }

    #[test]
    fn test_echo_no_headers() {
        let request = Request::get("/headers").body(()).unwrap();
        let response = echo_headers(&request);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&response.body()[..], b"{}");
    }
}
