//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use core_fs::{Fs, FsConfig, WalkEntry};

/// Context over the native loaders, ignoring any installed primary runtime.
pub fn native_fs() -> Fs {
    Fs::new(
        FsConfig::builder()
            .detect_primary_runtime(false)
            .build()
            .unwrap(),
    )
}

/// Canonical path of a fresh temp dir, so followed links compare equal.
pub fn fixture_root(dir: &tempfile::TempDir) -> PathBuf {
    std::fs::canonicalize(dir.path()).unwrap()
}

pub fn touch(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

/// Entry paths relative to `root` with `/` separators, sorted. The root
/// itself shows up as `""`.
pub fn relative_paths(root: &Path, entries: &[WalkEntry]) -> Vec<String> {
    let mut paths: Vec<String> = entries
        .iter()
        .map(|e| {
            e.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    paths.sort();
    paths
}
