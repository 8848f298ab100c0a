//! Source file discovery and file-to-module mapping.
//!
//! - Early directory pruning via `WalkDir::filter_entry`
//! - Parallel extension checks via Rayon's `par_bridge`
//! - Results sorted by path, so everything downstream sees a fixed order

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{LogvalError, LogvalResult};

/// Directories never scanned.
const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules", ".cargo"];

/// `src/bin/*` files are separate binary crates.
const BIN_DIR: &str = "bin";

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    excludes.contains(name) || (entry.depth() == 1 && name == BIN_DIR)
}

fn walk_error(root: &Path, err: walkdir::Error) -> LogvalError {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(io) => LogvalError::io(path, io),
        None => LogvalError::Io {
            path,
            message: "filesystem loop detected".to_string(),
            source: None,
        },
    }
}

/// Gathers every `.rs` file under `src_root`, sorted by path.
///
/// `excludes` are directory names skipped in addition to `target/`,
/// `.git/`, `node_modules/`, `.cargo/` and the top-level `bin/`.
pub fn gather_rs_files(src_root: &Path, excludes: &[String]) -> LogvalResult<Vec<PathBuf>> {
    if !src_root.is_dir() {
        return Ok(Vec::new());
    }
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().map(String::as_str))
        .collect();

    let mut files = WalkDir::new(src_root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && path.extension().is_some_and(|ext| ext == "rs") {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(walk_error(src_root, e))),
        })
        .collect::<LogvalResult<Vec<_>>>()?;
    files.sort();
    Ok(files)
}

/// Whether `file` is the crate root file (`lib.rs` or `main.rs` directly in
/// the source root).
pub fn is_crate_root_file(src_root: &Path, file: &Path) -> bool {
    file.parent() == Some(src_root)
        && file
            .file_name()
            .is_some_and(|name| name == "lib.rs" || name == "main.rs")
}

/// Whether `file` is a `main.rs` root sitting next to a `lib.rs`. Cargo
/// builds it as a separate binary crate, so its modules are not part of the
/// library the generated table is compiled into.
pub fn is_binary_root(src_root: &Path, file: &Path) -> bool {
    is_crate_root_file(src_root, file)
        && file.file_name().is_some_and(|name| name == "main.rs")
        && src_root.join("lib.rs").is_file()
}

/// Module path implied by a file's location under the source root.
///
/// - `lib.rs`, `main.rs` → `[]`
/// - `a/mod.rs` → `["a"]`
/// - `a/b.rs` → `["a", "b"]`
///
/// Returns `None` for files outside the root or with non-UTF-8 names.
pub fn module_path(src_root: &Path, file: &Path) -> Option<Vec<String>> {
    if is_crate_root_file(src_root, file) {
        return Some(Vec::new());
    }
    let relative = file.strip_prefix(src_root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.to_string()),
            _ => return None,
        }
    }
    let file_name = segments.pop()?;
    let stem = file_name.strip_suffix(".rs")?;
    if stem != "mod" {
        segments.push(stem.to_string());
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_rules() {
        let root = Path::new("/p/src");
        assert_eq!(module_path(root, Path::new("/p/src/lib.rs")), Some(vec![]));
        assert_eq!(module_path(root, Path::new("/p/src/main.rs")), Some(vec![]));
        assert_eq!(
            module_path(root, Path::new("/p/src/fmt/mod.rs")),
            Some(vec!["fmt".to_string()])
        );
        assert_eq!(
            module_path(root, Path::new("/p/src/fmt/money.rs")),
            Some(vec!["fmt".to_string(), "money".to_string()])
        );
        assert_eq!(module_path(root, Path::new("/elsewhere/a.rs")), None);
    }

    #[test]
    fn test_nested_lib_is_not_crate_root() {
        let root = Path::new("/p/src");
        assert!(!is_crate_root_file(root, Path::new("/p/src/a/lib.rs")));
        assert_eq!(
            module_path(root, Path::new("/p/src/a/lib.rs")),
            Some(vec!["a".to_string(), "lib".to_string()])
        );
    }

    #[test]
    fn test_main_is_a_binary_root_only_next_to_lib() {
        let root = std::env::temp_dir().join(format!("logval-scan-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let main = root.join("main.rs");
        assert!(!is_binary_root(&root, &main));
        std::fs::write(root.join("lib.rs"), "").unwrap();
        assert!(is_binary_root(&root, &main));
        assert!(!is_binary_root(&root, &root.join("lib.rs")));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let files = gather_rs_files(Path::new("/definitely/not/here/src"), &[]).unwrap();
        assert!(files.is_empty());
    }
}
