//! Path manipulation utilities for dev-compose

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Compute the path from `output_root` to `base`/`target`, expressed as a
/// relative path usable from the output root.
///
/// This is the shared rewrite primitive for build contexts, env files and
/// volume sources: each of those values is meaningful relative to the
/// application workspace (`base`) it was declared in, but the aggregate
/// compose file is consumed from `output_root`, one level below the project
/// root.
///
/// The computation is purely lexical — no path needs to exist yet. Relative
/// inputs are anchored at the current working directory before comparing.
/// Results that stay below the output root carry a leading `./`; results
/// that climb out of it start with `..`.
pub fn relativize(output_root: &Path, base: &Path, target: &str) -> Result<String> {
    let from = lexical_absolute(output_root)?;
    let to = lexical_absolute(&base.join(target))?;

    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part);
    }

    if rel.as_os_str().is_empty() {
        return Ok(".".to_string());
    }

    let rel = if rel.starts_with("..") {
        rel
    } else {
        Path::new(".").join(rel)
    };

    rel.into_os_string()
        .into_string()
        .map_err(|p| Error::Path {
            message: format!("non-UTF-8 path: {}", PathBuf::from(p).display()),
        })
}

/// Resolve a path to an absolute form without touching the filesystem.
///
/// `.` components are dropped and `..` components pop their parent; popping
/// past the filesystem root is an error.
pub fn lexical_absolute(path: &Path) -> Result<PathBuf> {
    let anchored = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(Error::Path {
                        message: format!(
                            "path escapes the filesystem root: {}",
                            anchored.display()
                        ),
                    });
                }
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relativize_into_app_workspace() {
        let rel = relativize(Path::new("_build"), Path::new("_build/apps/foo"), ".").unwrap();
        assert_eq!(rel, "./apps/foo");
    }

    #[test]
    fn test_relativize_app_subdirectory() {
        let rel = relativize(Path::new("_build"), Path::new("_build/apps/foo"), "./db").unwrap();
        assert_eq!(rel, "./apps/foo/db");
    }

    #[test]
    fn test_relativize_root_project_climbs_out() {
        // The root project lives one level above the output root
        let rel = relativize(Path::new("_build"), Path::new("."), ".").unwrap();
        assert_eq!(rel, "..");
    }

    #[test]
    fn test_relativize_root_project_subdirectory() {
        let rel = relativize(Path::new("_build"), Path::new("."), "web").unwrap();
        assert_eq!(rel, "../web");
    }

    #[test]
    fn test_relativize_same_directory() {
        let rel = relativize(Path::new("_build"), Path::new("_build"), ".").unwrap();
        assert_eq!(rel, ".");
    }

    #[test]
    fn test_relativize_round_trip() {
        // output_root joined with the result must land back on base/target
        let output_root = Path::new("_build");
        let base = Path::new("_build/apps/foo");

        let rel = relativize(output_root, base, ".").unwrap();
        let resolved = lexical_absolute(&output_root.join(&rel)).unwrap();
        assert_eq!(resolved, lexical_absolute(base).unwrap());
    }

    #[test]
    fn test_relativize_round_trip_with_target() {
        let output_root = Path::new("_build");
        let base = Path::new("_build/apps/foo");

        let rel = relativize(output_root, base, "./db/data").unwrap();
        let resolved = lexical_absolute(&output_root.join(&rel)).unwrap();
        assert_eq!(resolved, lexical_absolute(&base.join("db/data")).unwrap());
    }

    #[test]
    fn test_lexical_absolute_collapses_dots() {
        let resolved = lexical_absolute(Path::new("/a/b/./c/../d")).unwrap();
        assert_eq!(resolved, PathBuf::from("/a/b/d"));
    }

    #[test]
    fn test_lexical_absolute_anchors_relative_paths() {
        let resolved = lexical_absolute(Path::new("x/y")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("x/y"));
    }

    #[test]
    fn test_lexical_absolute_rejects_escape_from_root() {
        let result = lexical_absolute(Path::new("/../.."));
        assert!(result.is_err());
    }
}
