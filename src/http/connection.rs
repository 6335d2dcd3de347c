use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{ErrorKind, ParseError, Phase, ServeError};
use crate::files::{self, Target};
use crate::http::parser::parse_request_line;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Lifecycle of one connection. States only ever move forward.
#[derive(Debug)]
pub enum ConnectionState {
    Reading,
    Parsed(Request),
    Resolving(Request),
    Responding(Response),
    Error(ServeError),
    Closed,
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Reading => "reading",
            ConnectionState::Parsed(_) => "parsed",
            ConnectionState::Resolving(_) => "resolving",
            ConnectionState::Responding(_) => "responding",
            ConnectionState::Error(_) => "error",
            ConnectionState::Closed => "closed",
        }
    }
}

/// Owns one accepted stream from the first read to the final close.
///
/// The stream is released when the connection is dropped, which happens on
/// every exit path of [`Connection::run`].
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    config: Arc<Config>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: Arc<Config>) -> Self {
        let capacity = config.server.max_request_bytes;
        Self {
            stream,
            buffer: BytesMut::with_capacity(capacity),
            state: ConnectionState::Reading,
            config,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the connection to `Closed` and releases it.
    pub async fn run(mut self) {
        while self.advance().await {}
        self.linger().await;
        debug!("connection closed");
    }

    /// Performs one state transition. Returns `false` once `Closed`.
    pub async fn advance(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

        self.state = match state {
            ConnectionState::Reading => match self.read_request().await {
                Ok(request) => ConnectionState::Parsed(request),
                Err(e) => ConnectionState::Error(e),
            },

            ConnectionState::Parsed(request) => {
                if request.method == Method::GET {
                    ConnectionState::Resolving(request)
                } else {
                    ConnectionState::Error(
                        ParseError::UnsupportedMethod(request.method.to_string()).into(),
                    )
                }
            }

            ConnectionState::Resolving(request) => match self.resolve(&request).await {
                Ok(response) => ConnectionState::Responding(response),
                Err(e) => ConnectionState::Error(e),
            },

            ConnectionState::Responding(response) => {
                let mut writer = ResponseWriter::new(&response, self.config.server.write_timeout());
                match writer.write_to_stream(&mut self.stream, response.body).await {
                    Ok(()) => {
                        debug!(
                            status = response.status.as_u16(),
                            bytes = writer.bytes_sent(),
                            "response sent"
                        );
                        ConnectionState::Closed
                    }
                    // Too late for a corrective response once bytes are out.
                    Err(e) if writer.started() => {
                        error!(error = %e, bytes = writer.bytes_sent(), "response aborted");
                        ConnectionState::Closed
                    }
                    Err(e) => ConnectionState::Error(e),
                }
            }

            ConnectionState::Error(e) => {
                self.respond_with_error(&e).await;
                ConnectionState::Closed
            }

            ConnectionState::Closed => return false,
        };

        true
    }

    /// Reads until a full request line is buffered.
    ///
    /// One deadline covers the whole state; bytes arriving do not extend it.
    async fn read_request(&mut self) -> Result<Request, ServeError> {
        let limit = self.config.server.max_request_bytes;
        let read_timeout = self.config.server.read_timeout();
        let deadline = Instant::now() + read_timeout;

        loop {
            match parse_request_line(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(request);
                }
                Err(ParseError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }

            let room = limit.saturating_sub(self.buffer.len());
            if room == 0 {
                return Err(ParseError::TooLarge { limit }.into());
            }

            let n = timeout_at(
                deadline,
                self.stream.read_buf(&mut (&mut self.buffer).limit(room)),
            )
            .await
            .map_err(|_| ServeError::Timeout {
                phase: Phase::Read,
                after: read_timeout,
            })??;

            if n == 0 {
                // Peer closed before finishing the request line.
                return Err(ParseError::Incomplete.into());
            }
        }
    }

    async fn resolve(&self, request: &Request) -> Result<Response, ServeError> {
        let statics = &self.config.static_files;
        let candidate = files::resolve(&statics.root, &request.path, &statics.index);
        let target = files::inspect(&statics.root, candidate, &statics.index).await?;

        info!(
            method = %request.method,
            path = %request.path,
            resolved = ?resolved_path(&target),
            exists = target.exists(),
            "request"
        );

        match target {
            Target::File(found) => {
                let (file, len) = found.open().await?;
                Ok(Response::file(file, len, found.content_type))
            }
            Target::Missing(_) | Target::Rejected => {
                info!(path = %request.path, "not found");
                Ok(Response::not_found())
            }
        }
    }

    async fn respond_with_error(&mut self, e: &ServeError) {
        match e.kind() {
            ErrorKind::MalformedRequest => warn!(error = %e, "malformed request"),
            ErrorKind::IoFailure => error!(error = %e, "request failed"),
        }

        let response = Response::internal_error();
        let mut writer = ResponseWriter::new(&response, self.config.server.write_timeout());
        if let Err(write_err) = writer.write_to_stream(&mut self.stream, response.body).await {
            debug!(error = %write_err, "could not deliver error response");
        }
    }

    /// Half-closes the stream and drains unread request bytes for a short
    /// window so the peer is not reset before it reads the response.
    async fn linger(&mut self) {
        match timeout(self.config.server.write_timeout(), self.stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(error = %e, "shutdown failed");
                return;
            }
            Err(_) => {
                debug!("shutdown timed out");
                return;
            }
        }

        let window = self.config.server.linger();
        let stream = &mut self.stream;
        let mut scratch = [0u8; 512];
        let drain = async {
            while let Ok(n) = stream.read(&mut scratch).await {
                if n == 0 {
                    break;
                }
            }
        };
        let _ = timeout(window, drain).await;
    }
}

fn resolved_path(target: &Target) -> Option<&std::path::Path> {
    match target {
        Target::File(found) => Some(&found.path),
        Target::Missing(path) => Some(path),
        Target::Rejected => None,
    }
}
