//! `GET /ontology/{*path}`: static files from the ontology directory.
//!
//! Requests are checked twice. A lexical check refuses traversal syntax
//! before the filesystem is touched; then the canonical path must still lie
//! under the canonical root, which catches symlinks pointing elsewhere.

use std::path::{Component, Path, PathBuf};

use axum::{
    extract::{OriginalUri, Path as UriPath, State},
    http::Method,
    response::Response,
    routing::get,
};

use super::{blocking, format, routes::Routes};
use crate::{app::AppContext, Error, Result};

fn rejected(path: &str, reason: &'static str) -> Error {
    Error::PathRejected {
        path: path.to_string(),
        reason,
    }
}

/// Lexical validation of the requested relative path.
///
/// # Errors
///
/// Returns [`Error::PathRejected`] for empty paths, `..` segments, doubled
/// slashes, backslashes and anything that is not a plain relative path.
pub fn check_lexically<'p>(raw_uri_path: &str, relative: &'p str) -> Result<&'p Path> {
    if relative.is_empty() {
        return Err(rejected(relative, "empty path"));
    }
    if raw_uri_path.contains("//") || relative.contains("//") {
        return Err(rejected(relative, "doubled slash"));
    }
    if relative.contains('\\') {
        return Err(rejected(relative, "backslash"));
    }
    if relative.contains('\0') {
        return Err(rejected(relative, "nul byte"));
    }
    if relative.split('/').any(|segment| segment == "..") {
        return Err(rejected(relative, "parent segment"));
    }
    let path = Path::new(relative);
    if !path
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return Err(rejected(relative, "not a relative path"));
    }
    Ok(path)
}

/// Resolves `relative` under `root` after following symlinks.
///
/// # Errors
///
/// [`Error::NotFound`] when the file is absent or not a regular file,
/// [`Error::PathRejected`] when it resolves outside `root`.
pub fn resolve_under_root(root: &Path, relative: &Path) -> Result<PathBuf> {
    let root = root.canonicalize().map_err(|err| {
        tracing::error!(err.msg = %err, root = %root.display(), "ontology_root_unavailable");
        Error::NotFound
    })?;
    let Ok(candidate) = root.join(relative).canonicalize() else {
        return Err(Error::NotFound);
    };
    if !candidate.starts_with(&root) {
        return Err(rejected(&relative.to_string_lossy(), "escapes ontology root"));
    }
    if !candidate.is_file() {
        return Err(Error::NotFound);
    }
    Ok(candidate)
}

/// Content type served for `path`, by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jsonld" | "json") => "application/ld+json; charset=utf-8",
        Some("ttl") => "text/turtle; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}

pub async fn serve(
    State(ctx): State<AppContext>,
    OriginalUri(uri): OriginalUri,
    UriPath(path): UriPath<String>,
) -> Result<Response> {
    let relative = check_lexically(uri.path(), &path)?.to_path_buf();
    let root = ctx.ontology_root();
    let file = blocking(move || resolve_under_root(&root, &relative)).await?;
    let bytes = tokio::fs::read(&file).await?;
    format::render(content_type_for(&file), bytes)
}

pub fn routes() -> Routes {
    Routes::at("/ontology").add("/{*path}", Method::GET, get(serve))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case("../secret.txt")]
    #[case("core/../../secret.txt")]
    #[case("..")]
    #[case("a//b.ttl")]
    #[case("..\\secret.txt")]
    #[case("/etc/passwd")]
    fn lexical_check_refuses_traversal(#[case] relative: &str) {
        let raw = format!("/ontology/{relative}");
        assert!(matches!(
            check_lexically(&raw, relative),
            Err(Error::PathRejected { .. })
        ));
    }

    #[test]
    fn lexical_check_sees_doubled_slashes_in_the_raw_uri() {
        assert!(check_lexically("/ontology//etc/passwd", "etc/passwd").is_err());
        assert!(check_lexically("/ontology/core.ttl", "core.ttl").is_ok());
        assert!(check_lexically("/ontology/nested/core.ttl", "nested/core.ttl").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_out_of_the_root_are_rejected() {
        let outside = tempfile::tempdir().expect("outside");
        fs::write(outside.path().join("secret.txt"), "secret").expect("secret");
        let root = tempfile::tempdir().expect("root");
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).expect("symlink");

        assert!(matches!(
            resolve_under_root(root.path(), Path::new("link/secret.txt")),
            Err(Error::PathRejected { .. })
        ));
    }

    #[test]
    fn missing_files_and_directories_are_not_found() {
        let root = tempfile::tempdir().expect("root");
        fs::create_dir(root.path().join("nested")).expect("nested");
        fs::write(root.path().join("core.ttl"), "").expect("core");

        assert!(matches!(
            resolve_under_root(root.path(), Path::new("absent.ttl")),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            resolve_under_root(root.path(), Path::new("nested")),
            Err(Error::NotFound)
        ));
        assert!(resolve_under_root(root.path(), Path::new("core.ttl")).is_ok());
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(
            content_type_for(Path::new("context.jsonld")),
            "application/ld+json; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("core.TTL")), "text/turtle; charset=utf-8");
        assert_eq!(content_type_for(Path::new("README.md")), "text/markdown; charset=utf-8");
        assert_eq!(content_type_for(Path::new("image.png")), "application/octet-stream");
    }
}
