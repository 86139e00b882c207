//! Static file resolution.

use crate::executor::DispatchError;
use crate::handler::Reply;

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

const PARENT: &str = "..";

/// Whether any segment tries to leave the directory it is resolved against.
pub fn is_traversal<S: AsRef<str>>(segments: &[S]) -> bool {
    segments.iter().any(|s| {
        let s: &str = s.as_ref();
        s == PARENT
            || s.contains('\\')
            || s.contains('\0')
            || Path::new(s)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    })
}

/// Resolves `segments` below `root`. Returns `None` for anything that would
/// end up outside of `root`.
pub fn resolve<S: AsRef<str>>(root: &Path, segments: &[S]) -> Option<PathBuf> {
    if is_traversal(segments) {
        return None;
    }
    let mut path = root.to_path_buf();
    for s in segments {
        let s: &str = s.as_ref();
        path.push(s);
    }
    Some(path)
}

/// Serves the file at `segments` below `root`, or `index` for a directory.
///
/// The file is read into memory in one piece. Large files belong behind a
/// dedicated file server.
pub(crate) fn serve<S: AsRef<str>>(
    root: &Path,
    index: Option<&str>,
    segments: &[S],
) -> Result<Reply, DispatchError> {
    let mut path = match resolve(root, segments) {
        Some(p) => p,
        None => {
            debug!(root = %root.display(), "path traversal rejected");
            return Err(DispatchError::NotFound);
        }
    };

    if path.is_dir() {
        match index {
            Some(index) => path.push(index),
            None => return Err(DispatchError::NotFound),
        }
    }

    // symlinks may still point outside of the root
    let (real_root, real_path) = match (root.canonicalize(), path.canonicalize()) {
        (Ok(r), Ok(p)) => (r, p),
        (_, Err(ref e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DispatchError::NotFound)
        }
        (Err(e), _) | (_, Err(e)) => return Err(DispatchError::Handler(Box::new(e))),
    };
    if !real_path.starts_with(&real_root) {
        debug!(path = %path.display(), "resolved outside of static root");
        return Err(DispatchError::NotFound);
    }
    if !real_path.is_file() {
        return Err(DispatchError::NotFound);
    }

    match std::fs::read(&real_path) {
        Ok(contents) => Ok(Reply::File { path, contents }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DispatchError::NotFound),
        Err(e) => Err(DispatchError::Handler(Box::new(e))),
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal() {
        assert!(is_traversal(&["..", "etc", "passwd"]));
        assert!(is_traversal(&["a", "..", "b"]));
        assert!(is_traversal(&["a\\..\\b"]));
        assert!(is_traversal(&["/etc"]));
        assert!(!is_traversal(&["css", "site.css"]));
        assert!(!is_traversal(&["..hidden"]));
        assert!(!is_traversal::<&str>(&[]));
    }

    #[test]
    fn resolve_below_root() {
        let root = Path::new("/srv/static");
        assert_eq!(
            resolve(root, &["css", "a.css"]),
            Some(PathBuf::from("/srv/static/css/a.css"))
        );
        assert_eq!(resolve(root, &["..", "etc", "passwd"]), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a/b.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }
}
