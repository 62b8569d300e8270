//! HTTP/1.x framing for the server side of a connection
//!
//! [`HttpCodec`] decodes request heads into `http::Request<()>` and encodes
//! `http::Response<Bytes>`. Request bodies are never surfaced: bodies framed by
//! `Content-Length` are skipped, and any other transfer coding puts the codec
//! into a draining state where every further byte is discarded and the
//! connection must be closed after the current response.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{Method, Request, Response, StatusCode, Version};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug, thiserror::Error)]
pub enum HttpProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Too many header fields")]
    TooManyHeaders,
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("Unsupported HTTP version")]
    UnsupportedVersion,
    #[error("Incomplete request")]
    IncompleteRequest,
    #[error("Incomplete response")]
    IncompleteResponse,
}

impl HttpProtocolError {
    /// Status code to answer the client with, if the error warrants a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpProtocolError::HttpParse(_) | HttpProtocolError::InvalidRequest(_) => {
                Some(StatusCode::BAD_REQUEST)
            }
            HttpProtocolError::TooManyHeaders | HttpProtocolError::HeadTooLarge(_) => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            HttpProtocolError::UnsupportedVersion => Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED),
            HttpProtocolError::Io(_)
            | HttpProtocolError::IncompleteRequest
            | HttpProtocolError::IncompleteResponse => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    Empty,
    Remaining(usize),
    Draining,
}

/// Codec that frames HTTP/1.x requests and responses
#[derive(Debug)]
pub struct HttpCodec {
    max_headers: usize,
    max_head_size: usize,
    body: BodyState,
}

impl HttpCodec {
    pub fn new(max_headers: usize, max_head_size: usize) -> Self {
        Self {
            max_headers,
            max_head_size,
            body: BodyState::Empty,
        }
    }

    /// Whether the last request carried a body this codec cannot delimit
    pub fn must_close(&self) -> bool {
        self.body == BodyState::Draining
    }

    fn skip_body(&mut self, src: &mut BytesMut) -> bool {
        match self.body {
            BodyState::Empty => true,
            BodyState::Remaining(remaining) => {
                let n = remaining.min(src.len());
                src.advance(n);
                if n == remaining {
                    self.body = BodyState::Empty;
                    true
                } else {
                    self.body = BodyState::Remaining(remaining - n);
                    false
                }
            }
            BodyState::Draining => {
                src.clear();
                false
            }
        }
    }
}

impl Decoder for HttpCodec {
    type Item = Request<()>;
    type Error = HttpProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !self.skip_body(src) || src.is_empty() {
            return Ok(None);
        }

        let mut headers = vec![httparse::EMPTY_HEADER; self.max_headers];
        let mut parsed = httparse::Request::new(&mut headers);

        let head_len = match parsed.parse(&src[..]) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                if src.len() > self.max_head_size {
                    return Err(HttpProtocolError::HeadTooLarge(self.max_head_size));
                }
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => return Err(HttpProtocolError::TooManyHeaders),
            Err(httparse::Error::Version) => return Err(HttpProtocolError::UnsupportedVersion),
            Err(e) => {
                return Err(HttpProtocolError::HttpParse(format!(
                    "Failed to parse headers: {e}"
                )));
            }
        };

        if head_len > self.max_head_size {
            return Err(HttpProtocolError::HeadTooLarge(self.max_head_size));
        }

        let request = build_request(&parsed)?;
        src.advance(head_len);

        self.body = body_state(&request)?;
        self.skip_body(src);

        Ok(Some(request))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(request) => Ok(Some(request)),
            None if buf.is_empty() => Ok(None),
            None => Err(HttpProtocolError::IncompleteRequest),
        }
    }
}

impl Encoder<Response<Bytes>> for HttpCodec {
    type Error = HttpProtocolError;

    fn encode(&mut self, response: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = response.into_parts();
        let reason = parts.status.canonical_reason().unwrap_or("");

        dst.reserve(128 + body.len());
        dst.put_slice(b"HTTP/1.1 ");
        dst.put_slice(parts.status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(reason.as_bytes());
        dst.put_slice(b"\r\n");

        for (name, value) in &parts.headers {
            dst.put_slice(name.as_str().as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        if !parts.headers.contains_key(CONTENT_LENGTH) {
            dst.put_slice(b"content-length: ");
            dst.put_slice(body.len().to_string().as_bytes());
            dst.put_slice(b"\r\n");
        }

        dst.put_slice(b"\r\n");
        dst.put_slice(&body);
        Ok(())
    }
}

fn build_request(parsed: &httparse::Request<'_, '_>) -> Result<Request<()>, HttpProtocolError> {
    let method = parsed
        .method
        .ok_or_else(|| HttpProtocolError::InvalidRequest("missing method".to_string()))?;
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|e| HttpProtocolError::InvalidRequest(format!("invalid method: {e}")))?;
    let path = parsed
        .path
        .ok_or_else(|| HttpProtocolError::InvalidRequest("missing path".to_string()))?;
    let version = match parsed.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };

    let mut builder = Request::builder().method(method).uri(path).version(version);
    for header in parsed.headers.iter() {
        builder = builder.header(header.name, header.value);
    }

    builder
        .body(())
        .map_err(|e| HttpProtocolError::InvalidRequest(e.to_string()))
}

fn body_state(request: &Request<()>) -> Result<BodyState, HttpProtocolError> {
    let headers = request.headers();

    if let Some(coding) = headers.get(TRANSFER_ENCODING) {
        if !coding.as_bytes().eq_ignore_ascii_case(b"identity") {
            return Ok(BodyState::Draining);
        }
    }

    let mut length: Option<usize> = None;
    for value in headers.get_all(CONTENT_LENGTH) {
        let parsed = parse_content_length(value.as_bytes()).ok_or_else(|| {
            HttpProtocolError::InvalidRequest("invalid Content-Length".to_string())
        })?;
        if length.is_some_and(|len| len != parsed) {
            return Err(HttpProtocolError::InvalidRequest(
                "conflicting Content-Length values".to_string(),
            ));
        }
        length = Some(parsed);
    }

    Ok(match length {
        None | Some(0) => BodyState::Empty,
        Some(len) => BodyState::Remaining(len),
    })
}

/// Parses a Content-Length value made of ASCII digits only
fn parse_content_length(value: &[u8]) -> Option<usize> {
    let digits = value.trim_ascii();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
