use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::{Phase, ServeError};
use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Chunk size used when streaming file bodies.
const BUFFER_SIZE: usize = 8192;

/// Serializes the status line and header block, blank line included.
pub fn serialize_head(resp: &Response) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);

    buf.put_slice(
        format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            resp.status.as_u16(),
            resp.status.reason_phrase()
        )
        .as_bytes(),
    );

    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"\r\n");
    buf.freeze()
}

/// Writes one response, retrying short writes until every byte is out.
///
/// Each individual write is bounded by the write timeout. The writer keeps
/// count of what reached the socket so the caller can tell whether the
/// response had already started when a failure occurred.
#[derive(Debug)]
pub struct ResponseWriter {
    head: Bytes,
    sent: u64,
    write_timeout: Duration,
}

impl ResponseWriter {
    pub fn new(response: &Response, write_timeout: Duration) -> Self {
        Self {
            head: serialize_head(response),
            sent: 0,
            write_timeout,
        }
    }

    /// Total bytes written so far, header included.
    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    pub fn started(&self) -> bool {
        self.sent > 0
    }

    pub async fn write_to_stream<S>(
        &mut self,
        stream: &mut S,
        body: Body,
    ) -> Result<(), ServeError>
    where
        S: AsyncWrite + Unpin,
    {
        let head = self.head.clone();
        self.write_all(stream, &head).await?;

        match body {
            Body::Bytes(bytes) => self.write_all(stream, &bytes).await?,
            Body::File { file, len } => {
                let mut file = file.take(len);
                let mut chunk = vec![0u8; BUFFER_SIZE];
                let mut copied = 0u64;

                loop {
                    let n = file.read(&mut chunk).await?;
                    if n == 0 {
                        break;
                    }
                    self.write_all(stream, &chunk[..n]).await?;
                    copied += n as u64;
                }

                if copied < len {
                    return Err(ServeError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("file ended after {copied} of {len} advertised bytes"),
                    )));
                }
            }
        }

        timeout(self.write_timeout, stream.flush())
            .await
            .map_err(|_| self.timed_out())??;
        Ok(())
    }

    async fn write_all<S>(&mut self, stream: &mut S, mut buf: &[u8]) -> Result<(), ServeError>
    where
        S: AsyncWrite + Unpin,
    {
        while !buf.is_empty() {
            let n = timeout(self.write_timeout, stream.write(buf))
                .await
                .map_err(|_| self.timed_out())??;

            if n == 0 {
                return Err(ServeError::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing",
                )));
            }

            self.sent += n as u64;
            buf = &buf[n..];
        }

        Ok(())
    }

    fn timed_out(&self) -> ServeError {
        ServeError::Timeout {
            phase: Phase::Write,
            after: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;
    use crate::http::response::StatusCode;

    /// Accepts at most `max` bytes per write call.
    struct Trickle {
        out: Vec<u8>,
        max: usize,
    }

    impl AsyncWrite for Trickle {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let n = buf.len().min(self.max);
            self.out.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn head_layout() {
        let resp = Response::not_found();
        let head = serialize_head(&resp);
        assert_eq!(
            &head[..],
            b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn short_writes_are_retried() {
        let resp = Response::error(StatusCode::InternalServerError, "Internal Server Error");
        let mut writer = ResponseWriter::new(&resp, Duration::from_secs(1));
        let mut sink = Trickle { out: Vec::new(), max: 3 };

        writer.write_to_stream(&mut sink, resp.body).await.unwrap();

        let text = String::from_utf8(sink.out).unwrap();
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(text.ends_with("\r\n\r\nInternal Server Error"));
        assert_eq!(writer.bytes_sent(), text.len() as u64);
    }

    #[tokio::test]
    async fn zero_length_write_is_an_error() {
        let resp = Response::not_found();
        let mut writer = ResponseWriter::new(&resp, Duration::from_secs(1));
        let mut sink = Trickle { out: Vec::new(), max: 0 };

        let err = writer.write_to_stream(&mut sink, resp.body).await.unwrap_err();
        assert!(matches!(err, ServeError::Io(ref e) if e.kind() == io::ErrorKind::WriteZero));
        assert!(!writer.started());
    }

    #[tokio::test]
    async fn stalled_peer_times_out() {
        // The reading half is never drained, so the duplex buffer fills up.
        let (mut client, _server) = tokio::io::duplex(16);
        let resp = Response::error(StatusCode::Ok, &"x".repeat(1024));
        let mut writer = ResponseWriter::new(&resp, Duration::from_millis(50));

        let err = writer.write_to_stream(&mut client, resp.body).await.unwrap_err();
        assert!(matches!(
            err,
            ServeError::Timeout {
                phase: Phase::Write,
                ..
            }
        ));
        assert!(writer.started());
    }

    #[tokio::test]
    async fn file_shorter_than_advertised_sends_what_exists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("short.txt");
        std::fs::write(&path, "12345").unwrap();
        let file = tokio::fs::File::open(&path).await.unwrap();

        let resp = Response::file(file, 10, "text/plain");
        let mut writer = ResponseWriter::new(&resp, Duration::from_secs(1));
        let mut sink: Vec<u8> = Vec::new();

        let err = writer.write_to_stream(&mut sink, resp.body).await.unwrap_err();
        assert!(matches!(err, ServeError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
        assert!(writer.started());
        assert!(sink.ends_with(b"Content-Length: 10\r\n\r\n12345"));
    }
}
