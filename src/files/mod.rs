//! Mapping request paths onto the served directory tree.
//!
//! [`resolver`] is the pure, lexical half: it never touches the filesystem
//! and refuses any path that would climb out of the served root.
//! [`target`] is the I/O half: it confirms existence, re-checks containment
//! after symlinks are followed, and opens the file for streaming.

pub mod resolver;
pub mod target;

pub use resolver::resolve;
pub use target::{ResolvedTarget, Target, inspect};
