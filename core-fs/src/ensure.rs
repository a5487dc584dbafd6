//! Idempotent "make sure it exists" operations and `empty_dir`.

use std::path::{Path, PathBuf};

use bridge_traits::{CreateDirectoryOptions, FileInfo, RemoveOptions, SymlinkOptions, WriteOptions};
use futures::future::try_join_all;
use tracing::debug;

use crate::dispatch::Fs;
use crate::error::{FsError, Result};

fn mismatch(expected: &'static str, info: &FileInfo) -> FsError {
    FsError::TypeMismatch {
        expected,
        actual: info.kind_name(),
    }
}

fn expect_dir(info: &FileInfo) -> Result<()> {
    if info.is_directory {
        Ok(())
    } else {
        Err(mismatch("dir", info))
    }
}

/// Parent directory, `.` for bare names.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl Fs {
    /// Creates `path` and its parents unless it is already a directory.
    /// Anything else at `path` is a [`FsError::TypeMismatch`].
    pub async fn ensure_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.lstat(path).await {
            Ok(info) => return expect_dir(&info),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        match self.make_dir(path, &CreateDirectoryOptions::recursive()).await {
            Ok(()) => Ok(()),
            // Lost a race with another creator; fine if it made a directory.
            Err(err) if err.is_already_exists() => expect_dir(&self.lstat(path).await?),
            Err(err) => Err(err),
        }
    }

    pub fn ensure_dir_sync(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.lstat_sync(path) {
            Ok(info) => return expect_dir(&info),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        match self.make_dir_sync(path, &CreateDirectoryOptions::recursive()) {
            Ok(()) => Ok(()),
            Err(err) if err.is_already_exists() => expect_dir(&self.lstat_sync(path)?),
            Err(err) => Err(err),
        }
    }

    /// Creates an empty file, and any missing parents, unless `path` is
    /// already a file. An existing file is left untouched.
    pub async fn ensure_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.lstat(path).await {
            Ok(info) if info.is_file => Ok(()),
            Ok(info) => Err(mismatch("file", &info)),
            Err(err) if err.is_not_found() => {
                self.ensure_dir(parent_dir(path)).await?;
                self.write_file(path, b"", &WriteOptions::append()).await
            }
            Err(err) => Err(err),
        }
    }

    pub fn ensure_file_sync(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.lstat_sync(path) {
            Ok(info) if info.is_file => Ok(()),
            Ok(info) => Err(mismatch("file", &info)),
            Err(err) if err.is_not_found() => {
                self.ensure_dir_sync(parent_dir(path))?;
                self.write_file_sync(path, b"", &WriteOptions::append())
            }
            Err(err) => Err(err),
        }
    }

    /// Hard-links `dest` to `src`, creating `dest`'s parent first.
    pub async fn ensure_link(&self, src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        self.ensure_dir(parent_dir(dest)).await?;
        self.link(src, dest).await
    }

    pub fn ensure_link_sync(&self, src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        self.ensure_dir_sync(parent_dir(dest))?;
        self.link_sync(src, dest)
    }

    /// Creates a symlink at `dest` pointing to `target`, creating `dest`'s
    /// parent first. An existing `dest` is reported as `AlreadyExists`.
    pub async fn ensure_symlink(
        &self,
        target: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<()> {
        let dest = dest.as_ref();
        self.ensure_dir(parent_dir(dest)).await?;
        self.symlink(target, dest, &SymlinkOptions::default()).await
    }

    pub fn ensure_symlink_sync(
        &self,
        target: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<()> {
        let dest = dest.as_ref();
        self.ensure_dir_sync(parent_dir(dest))?;
        self.symlink_sync(target, dest, &SymlinkOptions::default())
    }

    /// Removes everything inside `dir`, keeping `dir` itself. A missing
    /// directory is created.
    pub async fn empty_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let children = match self.read_dir(dir).await {
            Ok(children) => children,
            Err(err) if err.is_not_found() => {
                return self.make_dir(dir, &CreateDirectoryOptions::recursive()).await;
            }
            Err(err) => return Err(err),
        };

        debug!(dir = ?dir, count = children.len(), "Emptying directory");
        let options = RemoveOptions::recursive();
        try_join_all(
            children
                .iter()
                .map(|child| self.remove(dir.join(&child.name), &options)),
        )
        .await?;
        Ok(())
    }

    pub fn empty_dir_sync(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let children = match self.read_dir_sync(dir) {
            Ok(children) => children,
            Err(err) if err.is_not_found() => {
                return self.make_dir_sync(dir, &CreateDirectoryOptions::recursive());
            }
            Err(err) => return Err(err),
        };

        debug!(dir = ?dir, count = children.len(), "Emptying directory");
        let options = RemoveOptions::recursive();
        for child in &children {
            self.remove_sync(dir.join(&child.name), &options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("a.txt")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/x/a.txt")), PathBuf::from("/x"));
        assert_eq!(parent_dir(Path::new("/")), PathBuf::from("."));
    }

    #[test]
    fn test_mismatch_message() {
        let info = FileInfo {
            is_directory: true,
            ..FileInfo::default()
        };
        assert_eq!(
            mismatch("file", &info).to_string(),
            "Ensure path exists, expected 'file', got 'dir'"
        );
    }
}
