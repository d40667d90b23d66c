//! Relative path computation
//!
//! Produces the portable relative path that a linked `Compile` item uses to
//! point from the target project folder back at a source file.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Scheme assigned to plain local paths.
const FILE_SCHEME: &str = "file";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Path argument '{0}' must not be empty")]
    Empty(&'static str),
}

/// Creates a relative path from one location to another.
///
/// `from` is treated as a directory only when it ends with a separator;
/// otherwise its last segment is taken to be a file name and the path is
/// computed from its parent. When the two locations use different address
/// schemes (say an `http://` URL and a local path) there is no meaningful
/// relative form and `to` is returned unchanged.
pub fn relative_path(from: &str, to: &str) -> Result<String, PathError> {
    if from.is_empty() {
        return Err(PathError::Empty("from"));
    }
    if to.is_empty() {
        return Err(PathError::Empty("to"));
    }

    let from_scheme = scheme_of(from);
    let to_scheme = scheme_of(to);
    if from_scheme != to_scheme {
        return Ok(to.to_string());
    }

    if to_scheme != FILE_SCHEME {
        let relative = Url::parse(from)
            .ok()
            .zip(Url::parse(to).ok())
            .and_then(|(base, target)| base.make_relative(&target));
        return Ok(relative.unwrap_or_else(|| to.to_string()));
    }

    let from = to_native_separators(from);
    let to = to_native_separators(to);

    let from_path = normalize(&local_path(&from));
    let base = if ends_with_separator(&from) {
        from_path
    } else {
        from_path.parent().map(Path::to_path_buf).unwrap_or(from_path)
    };
    let target = normalize(&local_path(&to));

    let relative = pathdiff::diff_paths(&target, &base).unwrap_or(target);
    Ok(relative.to_string_lossy().into_owned())
}

/// Lexically resolves `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component.as_os_str()),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn scheme_of(location: &str) -> String {
    match Url::parse(location) {
        // Single-letter schemes are Windows drive letters, not URLs.
        Ok(url) if url.scheme().len() > 1 => url.scheme().to_ascii_lowercase(),
        _ => FILE_SCHEME.to_string(),
    }
}

fn local_path(location: &str) -> PathBuf {
    match Url::parse(location) {
        Ok(url) if url.scheme() == FILE_SCHEME => url
            .to_file_path()
            .unwrap_or_else(|_| PathBuf::from(location)),
        _ => PathBuf::from(location),
    }
}

fn ends_with_separator(location: &str) -> bool {
    location.ends_with(MAIN_SEPARATOR) || location.ends_with('/')
}

fn to_native_separators(location: &str) -> String {
    if cfg!(windows) {
        location.replace('/', "\\")
    } else {
        location.to_string()
    }
}
