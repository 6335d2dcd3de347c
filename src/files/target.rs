use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};

use crate::http::mime::content_type_for;

/// Outcome of checking a candidate path against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The path escaped the served root, lexically or through a symlink.
    Rejected,
    /// Nothing servable exists at the path.
    Missing(PathBuf),
    /// A regular file inside the root.
    File(ResolvedTarget),
}

impl Target {
    pub fn exists(&self) -> bool {
        matches!(self, Target::File(_))
    }
}

/// A regular file inside the served root, ready to be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// Inferred from the requested name's extension.
    pub content_type: String,
}

impl ResolvedTarget {
    /// Opens the file and queries its current size.
    pub async fn open(&self) -> io::Result<(File, u64)> {
        let file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }
}

/// Inspects `candidate` (as produced by [`resolve`](super::resolve)) under
/// the canonical `root`.
///
/// A directory is served through its `index` document. Errors other than
/// "does not exist" are returned so the connection can answer with a 500.
pub async fn inspect(root: &Path, candidate: Option<PathBuf>, index: &str) -> io::Result<Target> {
    let Some(candidate) = candidate else {
        return Ok(Target::Rejected);
    };

    // The content type follows the name that was asked for, not wherever a
    // symlink leads.
    let (target, requested) = match contained(root, &candidate).await? {
        Lookup::File(path) => (path, candidate),
        Lookup::Dir(dir) => match contained(root, &dir.join(index)).await? {
            Lookup::File(path) => (path, dir.join(index)),
            Lookup::Dir(_) | Lookup::Other => return Ok(Target::Missing(candidate)),
            Lookup::Missing => return Ok(Target::Missing(dir.join(index))),
            Lookup::Escaped => return Ok(Target::Rejected),
        },
        Lookup::Other | Lookup::Missing => return Ok(Target::Missing(candidate)),
        Lookup::Escaped => return Ok(Target::Rejected),
    };

    let content_type = content_type_for(&requested);
    Ok(Target::File(ResolvedTarget {
        path: target,
        content_type,
    }))
}

enum Lookup {
    File(PathBuf),
    Dir(PathBuf),
    Other,
    Missing,
    Escaped,
}

async fn contained(root: &Path, path: &Path) -> io::Result<Lookup> {
    let canonical = match fs::canonicalize(path).await {
        Ok(p) => p,
        Err(e) if is_missing(&e) => return Ok(Lookup::Missing),
        Err(e) => return Err(e),
    };

    if !canonical.starts_with(root) {
        return Ok(Lookup::Escaped);
    }

    let meta = fs::metadata(&canonical).await?;
    Ok(if meta.is_file() {
        Lookup::File(canonical)
    } else if meta.is_dir() {
        Lookup::Dir(canonical)
    } else {
        Lookup::Other
    })
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
