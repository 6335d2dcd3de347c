use std::path::{Path, PathBuf};

use sluice::files::resolve;

const INDEX: &str = "index.html";

fn root() -> PathBuf {
    PathBuf::from("/srv/www")
}

#[test]
fn test_index_substitution() {
    assert_eq!(resolve(&root(), "/", INDEX), Some(root().join("index.html")));
    assert_eq!(resolve(&root(), "", INDEX), Some(root().join("index.html")));
    assert_eq!(
        resolve(&root(), "/", "default.htm"),
        Some(root().join("default.htm"))
    );
}

#[test]
fn test_leading_slash_and_query_are_stripped() {
    assert_eq!(
        resolve(&root(), "/a/b.txt", INDEX),
        Some(root().join("a").join("b.txt"))
    );
    assert_eq!(
        resolve(&root(), "a/b.txt", INDEX),
        Some(root().join("a").join("b.txt"))
    );
    assert_eq!(
        resolve(&root(), "/a/b.txt?v=1&x=../../etc", INDEX),
        Some(root().join("a").join("b.txt"))
    );
}

#[test]
fn test_result_stays_under_root() {
    for raw in ["/", "/a/b.txt", "/a/./b/../c", "/x/y/z?q", "/a/.."] {
        let resolved = resolve(&root(), raw, INDEX).unwrap();
        assert!(resolved.starts_with(root()), "{raw} -> {resolved:?}");
    }
}

#[test]
fn test_traversal_is_rejected() {
    for raw in [
        "/..",
        "/../etc/passwd",
        "/a/../../etc/passwd",
        "/a/b/../../../secret",
        "/./../x",
    ] {
        assert_eq!(resolve(&root(), raw, INDEX), None, "{raw}");
    }
}

#[test]
fn test_absolute_override_is_rejected() {
    assert_eq!(resolve(&root(), "//etc/passwd", INDEX), None);
    assert_eq!(resolve(&root(), "/etc/passwd", INDEX), Some(root().join("etc/passwd")));
}

#[test]
fn test_resolver_is_pure() {
    let root = Path::new("/definitely/not/a/real/dir");
    let first = resolve(root, "/a/b.txt", INDEX);
    let second = resolve(root, "/a/b.txt", INDEX);
    assert_eq!(first, second);
    assert_eq!(first, Some(root.join("a/b.txt")));
}
