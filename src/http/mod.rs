//! HTTP protocol layer.
//!
//! Only as much HTTP as a static file server needs: one request line in,
//! one fixed-length response out, then close.
//!
//! # Architecture
//!
//! - **`connection`**: the per-connection state machine
//! - **`parser`**: tokenizes the `METHOD SP PATH SP VERSION` request line
//! - **`request`**: parsed request line
//! - **`response`**: status, header block and body source
//! - **`writer`**: serializes responses and streams file bodies
//! - **`mime`**: content-type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Buffer bytes until the request line is complete
//!        └──────┬──────┘
//!               │ Line tokenized
//!               ▼
//!        ┌─────────────┐
//!        │   Parsed    │ ← Reject anything but GET
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │  Resolving  │ ← Map path onto the root, open the file or pick 404
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │ Responding  │ ← Header, then body; short writes retried
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │ ← Shut down, drain, release
//!        └─────────────┘
//! ```
//!
//! Any state before `Closed` may divert to `Error`, which writes a 500 on a
//! best-effort basis and then closes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sluice::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! let listener = TcpListener::bind("127.0.0.1:8080").await?;
//! loop {
//!     let (socket, _addr) = listener.accept().await?;
//!     tokio::spawn(Connection::new(socket, Arc::clone(&config)).run());
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
