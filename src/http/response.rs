use tokio::fs::File;

use crate::http::mime::TEXT_PLAIN;

/// HTTP status codes the server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use sluice::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Where the bytes after the header block come from.
#[derive(Debug)]
pub enum Body {
    /// A literal message, written right after the header.
    Bytes(Vec<u8>),
    /// An open file streamed after the header; `len` is the size that was
    /// advertised in `Content-Length`.
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A complete response: status, ordered header block and body source.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    /// Header lines in the order they are written.
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

/// Builder for constructing responses in a fluent style.
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(Body::Bytes(b"<p>hi</p>".to_vec()))
///     .build();
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Bytes(Vec::new()),
        }
    }

    /// Adds or replaces a header. Names compare case-insensitively.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Builds the final response.
    ///
    /// `Content-Length` is always derived from the body so the advertised
    /// length and the bytes that follow can never disagree.
    pub fn build(self) -> Response {
        let len = self.body.len();
        let this = self.header("Content-Length", len.to_string());

        Response {
            status: this.status,
            headers: this.headers,
            body: this.body,
        }
    }
}

impl Response {
    /// A 200 response streaming `file`, whose size was already queried.
    pub fn file(file: File, len: u64, content_type: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", content_type)
            .body(Body::File { file, len })
            .build()
    }

    /// A plain-text error response whose body is `message`.
    pub fn error(status: StatusCode, message: &str) -> Self {
        ResponseBuilder::new(status)
            .header("Content-Type", TEXT_PLAIN)
            .body(Body::Bytes(message.as_bytes().to_vec()))
            .build()
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound, StatusCode::NotFound.reason_phrase())
    }

    pub fn internal_error() -> Self {
        Self::error(
            StatusCode::InternalServerError,
            StatusCode::InternalServerError.reason_phrase(),
        )
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
