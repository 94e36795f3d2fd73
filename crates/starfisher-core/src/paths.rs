//! Containment-enforcing path resolution.
//!
//! Every file-backed entity load and every entity-file write goes through
//! [`resolve_under_base`]; no component opens a path derived from manifest
//! content without this check.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, WorkspaceError};

/// Resolves `reference` against `base` and guarantees the result stays
/// lexically under `base`.
///
/// Absolute references and references whose `..` segments would climb out
/// of `base` fail with [`WorkspaceError::PathTraversal`]. The check is
/// lexical so references to files that do not exist yet still resolve.
pub fn resolve_under_base(base: &Path, reference: impl AsRef<Path>) -> Result<PathBuf> {
    let reference = reference.as_ref();
    let traversal = || WorkspaceError::PathTraversal {
        reference: reference.display().to_string(),
    };

    if reference.as_os_str().is_empty() || reference.is_absolute() {
        return Err(traversal());
    }

    let mut resolved = base.to_path_buf();
    let mut depth: usize = 0;
    for component in reference.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return Err(traversal());
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_relative_reference_resolves_under_base() {
        let base = Path::new("/ws");
        let resolved = resolve_under_base(base, "charts/ada.yml").expect("contained");
        assert_eq!(resolved, PathBuf::from("/ws/charts/ada.yml"));
        assert!(resolved.starts_with(base));
    }

    #[test]
    fn internal_parent_segments_are_allowed_when_contained() {
        let base = Path::new("/ws");
        let resolved = resolve_under_base(base, "charts/../subjects/ada.yml").expect("contained");
        assert_eq!(resolved, PathBuf::from("/ws/subjects/ada.yml"));
    }

    #[test]
    fn absolute_reference_is_rejected() {
        let err = resolve_under_base(Path::new("/ws"), "/etc/passwd").unwrap_err();
        assert!(matches!(err, WorkspaceError::PathTraversal { .. }));
    }

    #[test]
    fn escaping_parent_segments_are_rejected() {
        for reference in ["../evil.yml", "charts/../../evil.yml", "../../.."] {
            let err = resolve_under_base(Path::new("/ws"), reference).unwrap_err();
            assert!(
                matches!(err, WorkspaceError::PathTraversal { .. }),
                "{reference} should be rejected"
            );
        }
    }

    #[test]
    fn empty_reference_is_rejected() {
        let err = resolve_under_base(Path::new("/ws"), "").unwrap_err();
        assert!(matches!(err, WorkspaceError::PathTraversal { .. }));
    }
}
