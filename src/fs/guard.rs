//! Path sandboxing.
//!
//! A [`PathGuard`] confines operations to a set of allowed root directories.
//! Paths are resolved to an absolute, symlink-free form before the check, so
//! `..` segments and links cannot be used to step outside a root.

use std::io;
use std::path::{Component, Path, PathBuf};

use super::error::{FsError, FsResult};

/// Confines filesystem access to a set of allowed roots.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    roots: Vec<PathBuf>,
}

impl PathGuard {
    /// Creates a guard that allows paths inside any of `roots`.
    ///
    /// An empty list allows every path.
    #[must_use]
    pub const fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Creates a guard that allows every path.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self { roots: Vec::new() }
    }

    /// Returns the configured roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Checks that `path` lies inside an allowed root.
    ///
    /// Returns the resolved absolute path on success. The path does not need
    /// to exist yet, so targets of writes and directory creation can be
    /// checked before they are made.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::AccessDenied`] if the path is outside every root,
    /// or [`FsError::InvalidPath`] if it cannot be resolved.
    pub fn check(&self, path: &Path) -> FsResult<PathBuf> {
        let resolved = resolve(path)?;

        if self.roots.is_empty() {
            return Ok(resolved);
        }

        for root in &self.roots {
            let Ok(canonical_root) = root.canonicalize() else {
                continue; // Skip roots that don't exist
            };

            if resolved.starts_with(&canonical_root) {
                return Ok(resolved);
            }
        }

        tracing::warn!(path = %path.display(), "Rejected path outside allowed directories");
        Err(FsError::AccessDenied)
    }

    /// Checks `path` and returns the location an operation should act on.
    ///
    /// The parent directory comes back resolved and the final component is
    /// kept as given, so a trailing symlink is acted on as a link and not as
    /// its target. Acting on this location instead of the caller's path
    /// means intermediate links are not looked up a second time.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`PathGuard::check`].
    pub fn confine(&self, path: &Path) -> FsResult<PathBuf> {
        let resolved = self.check(path)?;

        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Ok(resolved);
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };

        Ok(resolve(parent)?.join(name))
    }
}

/// Resolves `path` to an absolute path with symlinks expanded.
///
/// The longest existing prefix is canonicalised and any missing trailing
/// components are appended as-is. A `..` among the missing components
/// cannot be resolved safely and is rejected.
fn resolve(path: &Path) -> FsResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(FsError::invalid_path(path, "path is empty"));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| FsError::io("resolve", path, e))?
            .join(path)
    };

    let components: Vec<Component<'_>> = absolute.components().collect();
    let mut existing = components.len();

    let base = loop {
        let prefix: PathBuf = components[..existing].iter().collect();
        match prefix.canonicalize() {
            Ok(canonical) => break canonical,
            Err(e) if e.kind() == io::ErrorKind::NotFound && existing > 1 => existing -= 1,
            Err(e) => return Err(FsError::io("resolve", path, e)),
        }
    };

    let mut resolved = base;
    for component in &components[existing..] {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            _ => {
                return Err(FsError::invalid_path(
                    path,
                    "'..' cannot follow a directory that does not exist",
                ))
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_allows_everything() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::unrestricted();
        assert!(guard.check(dir.path()).is_ok());
    }

    #[test]
    fn existing_path_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();

        let guard = PathGuard::new(vec![dir.path().to_path_buf()]);
        let resolved = guard.check(&file).unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[test]
    fn missing_path_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(vec![dir.path().to_path_buf()]);

        let target = dir.path().join("new").join("deeper").join("file.txt");
        let resolved = guard.check(&target).unwrap();
        assert!(resolved.ends_with("new/deeper/file.txt"));
    }

    #[test]
    fn dot_dot_escape_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir(&inner).unwrap();

        let guard = PathGuard::new(vec![inner.clone()]);
        let err = guard.check(&inner.join("..")).unwrap_err();
        assert!(matches!(err, FsError::AccessDenied));
    }

    #[test]
    fn dot_dot_after_missing_component_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(vec![dir.path().to_path_buf()]);

        let err = guard
            .check(&dir.path().join("ghost").join("..").join("x"))
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
    }

    #[test]
    fn empty_path_is_invalid() {
        let guard = PathGuard::unrestricted();
        assert!(matches!(
            guard.check(Path::new("")),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn missing_roots_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(vec![
            dir.path().join("does-not-exist"),
            dir.path().to_path_buf(),
        ]);
        assert!(guard.check(dir.path()).is_ok());
        assert_eq!(guard.roots().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_denied() {
        let outside = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let link = root.path().join("escape");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let guard = PathGuard::new(vec![root.path().to_path_buf()]);
        assert!(matches!(guard.check(&link), Err(FsError::AccessDenied)));
    }

    #[test]
    fn confine_resolves_parent_and_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(vec![dir.path().to_path_buf()]);

        let target = guard.confine(&dir.path().join("new.txt")).unwrap();
        assert_eq!(target, dir.path().canonicalize().unwrap().join("new.txt"));

        // The root itself is still reachable even though its parent is not
        let root = guard.confine(dir.path()).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn confine_keeps_trailing_link_and_resolves_linked_parent() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("f.txt"), "x").unwrap();
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let guard = PathGuard::new(vec![dir.path().to_path_buf()]);
        let canonical = dir.path().canonicalize().unwrap();

        assert_eq!(guard.confine(&link).unwrap(), canonical.join("alias"));
        assert_eq!(
            guard.confine(&link.join("f.txt")).unwrap(),
            canonical.join("real").join("f.txt")
        );
    }
}
