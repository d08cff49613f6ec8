//! Path normalization for component identity.

use std::path::{Component, Path, PathBuf};

/// Absolute form of `path`.
///
/// Existing files are canonicalized, so `./bin/app`, `bin/app` and a symlink
/// to it all agree. Paths that name nothing on disk, such as archive members
/// (`libx.a(a.o)`), are made absolute and cleaned lexically.
#[must_use]
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    lexical_clean(&joined)
}

/// Drop `.` components and fold `..` into its parent.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_spellings_of_one_file_agree() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("bin")).unwrap();
        std::fs::write(tmp.path().join("bin/app"), b"x").unwrap();

        let plain = absolute_path(&tmp.path().join("bin/app"));
        let dotted = absolute_path(&tmp.path().join("bin/./app"));
        let parent = absolute_path(&tmp.path().join("bin/../bin/app"));
        assert_eq!(plain, dotted);
        assert_eq!(plain, parent);
        assert!(plain.is_absolute());
    }

    #[test]
    fn test_missing_paths_are_cleaned_lexically() {
        assert_eq!(
            absolute_path(Path::new("/lib/./x/../libx.a(a.o)")),
            PathBuf::from("/lib/libx.a(a.o)")
        );
        assert_eq!(
            absolute_path(Path::new("/../nonexistent-binsbom")),
            PathBuf::from("/nonexistent-binsbom")
        );
        assert!(absolute_path(Path::new("nonexistent-binsbom/a.o")).is_absolute());
    }
}
