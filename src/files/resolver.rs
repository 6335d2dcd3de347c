use std::path::{Component, Path, PathBuf};

/// Maps a raw request path onto a candidate file under `root`.
///
/// The query string is dropped, a single leading `/` is stripped and an
/// empty remainder becomes `index`. Returns `None` when the path would
/// escape `root` (a `..` above the top, an absolute override, a drive
/// prefix) or contains a NUL byte; callers treat that exactly like a
/// missing file.
///
/// ```
/// # use std::path::Path;
/// # use sluice::files::resolve;
/// let root = Path::new("/srv/www");
/// assert_eq!(resolve(root, "/", "index.html"), Some(root.join("index.html")));
/// assert_eq!(resolve(root, "/a/b.txt?v=1", "index.html"), Some(root.join("a/b.txt")));
/// assert_eq!(resolve(root, "/a/../../etc/passwd", "index.html"), None);
/// ```
pub fn resolve(root: &Path, raw: &str, index: &str) -> Option<PathBuf> {
    let path = match raw.find('?') {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = if path.is_empty() { index } else { path };

    if path.contains('\0') {
        return None;
    }

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(path).components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    // `/a/..` collapses back onto the root itself.
    if depth == 0 {
        resolved.push(index);
    }

    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "index.html";

    fn root() -> PathBuf {
        PathBuf::from("/srv/www")
    }

    #[test]
    fn root_and_empty_map_to_index() {
        assert_eq!(resolve(&root(), "/", INDEX), Some(root().join(INDEX)));
        assert_eq!(resolve(&root(), "", INDEX), Some(root().join(INDEX)));
        assert_eq!(resolve(&root(), "/?lang=en", INDEX), Some(root().join(INDEX)));
    }

    #[test]
    fn second_slash_is_an_absolute_override() {
        assert_eq!(resolve(&root(), "//etc/passwd", INDEX), None);
    }

    #[test]
    fn dot_segments_inside_root_are_allowed() {
        assert_eq!(
            resolve(&root(), "/a/./c/../b.txt", INDEX),
            Some(root().join("a/b.txt"))
        );
        assert_eq!(resolve(&root(), "/a/..", INDEX), Some(root().join(INDEX)));
    }

    #[test]
    fn nul_byte_is_rejected() {
        assert_eq!(resolve(&root(), "/a\0.txt", INDEX), None);
    }
}
