use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Sanitize an archive entry path for extraction under `base`.
///
/// Entry names are attacker-controllable strings; they may carry absolute
/// paths or `..` segments. Absolute entries are rejected outright. Relative
/// entries are normalized lexically; a `..` that would climb above the entry's
/// own root is an escape, not a no-op, and fails the entry. The resolved path
/// must stay inside `base`.
pub fn sanitize_entry_path<P: AsRef<Path>, B: AsRef<Path>>(
    entry_path: P,
    base: B,
) -> Result<SanitizedPath> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();

    if entry_path.is_absolute() {
        return Err(Error::AbsolutePath {
            entry: entry_path.to_path_buf(),
        });
    }

    let mut normalized = PathBuf::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                // Underflow means the entry points above its own root.
                if !normalized.pop() {
                    return Err(Error::PathEscape {
                        entry: entry_path.to_path_buf(),
                        resolved: base.join(entry_path),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::AbsolutePath {
                    entry: entry_path.to_path_buf(),
                });
            }
        }
    }

    let resolved = base.join(&normalized);
    if !resolved.starts_with(base) {
        return Err(Error::PathEscape {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }

    Ok(SanitizedPath {
        original: entry_path.to_path_buf(),
        resolved,
    })
}
