//! Sluice - asynchronous static file server
//!
//! Accepts TCP connections, reads one request line, maps it onto a served
//! directory and answers with the file, a 404 or a 500.

pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod server;
