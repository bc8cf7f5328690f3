//! Extension traits and path helpers for base types defined in `boxfile-core`.
use std::path::{Component, Path, PathBuf};

use boxfile_core::Entry;

use crate::{AppendError, ExtractError};

pub trait EntryExt {
    fn check_path(&self) -> Result<&Path, ExtractError>;
}

impl EntryExt for Entry {
    /// Iterate the components of the path and ensure that there are no
    /// non-normal components.
    fn check_path(&self) -> Result<&Path, ExtractError> {
        let path = Path::new(self.path());
        for component in path.components() {
            match component {
                Component::Normal(_) => {}
                invalid => {
                    let bad_component: &Path = invalid.as_ref();
                    return Err(ExtractError::UnsafePath {
                        entry: self.path().to_string(),
                        component: bad_component.to_path_buf(),
                    });
                }
            }
        }
        Ok(path)
    }
}

/// Turn the path of a source file into the path recorded in its entry.
///
/// The path is taken lexically: `.` components are dropped and components
/// are joined with `/`. Absolute paths, `..` components and paths that are
/// not UTF-8 cannot be extracted safely and are refused.
pub fn entry_path(source: &Path) -> Result<String, AppendError> {
    let invalid = |reason| AppendError::InvalidPath {
        path: source.to_path_buf(),
        reason,
    };

    let mut parts = Vec::new();
    for component in source.components() {
        match component {
            Component::Normal(part) => {
                parts.push(part.to_str().ok_or_else(|| invalid("not UTF-8"))?);
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("contains a parent directory component")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("is absolute")),
        }
    }

    if parts.is_empty() {
        return Err(invalid("is empty"));
    }
    Ok(parts.join("/"))
}

/// Make `path` relative to `base` when it is absolute and below `base`.
/// Other paths are returned as they are.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.to_path_buf();
        }
    }
    path.to_path_buf()
}
