//! Recursive copy and move.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use bridge_traits::{FileInfo, RemoveOptions, SymlinkOptions};
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::dispatch::Fs;
use crate::error::{invalid_input, FsError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Replace existing files at the destination.
    pub overwrite: bool,
    /// Carry access and modification times over to the copies.
    pub preserve_timestamps: bool,
}

impl CopyOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Remove an existing destination before moving.
    pub overwrite: bool,
}

impl MoveOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Collapses `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// True when `dest` lies strictly inside `src`.
fn is_subdir(src: &Path, dest: &Path) -> bool {
    src != dest && dest.starts_with(src)
}

fn timestamps(info: &FileInfo) -> Option<(SystemTime, SystemTime)> {
    Some((info.atime?.into(), info.mtime?.into()))
}

fn same_path_error() -> FsError {
    invalid_input("Source and destination cannot be the same.")
}

fn subdir_error(verb: &str, src: &Path, dest: &Path) -> FsError {
    invalid_input(format!(
        "Cannot {verb} '{}' to a subdirectory of itself, '{}'.",
        src.display(),
        dest.display()
    ))
}

/// What an existing destination means for a copy.
fn check_existing(
    src: &Path,
    dest: &Path,
    existing: &FileInfo,
    is_dir: bool,
    overwrite: bool,
) -> Result<()> {
    if is_dir && !existing.is_directory {
        return Err(invalid_input(format!(
            "Cannot overwrite non-directory '{}' with directory '{}'.",
            dest.display(),
            src.display()
        )));
    }
    if !overwrite {
        return Err(FsError::already_exists(dest));
    }
    Ok(())
}

impl Fs {
    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(normalize(path))
        } else {
            Ok(normalize(&self.cwd()?.join(path)))
        }
    }

    /// `Ok(None)` when `dest` is free, the existing entry otherwise.
    async fn valid_copy_target(
        &self,
        src: &Path,
        dest: &Path,
        is_dir: bool,
        options: CopyOptions,
    ) -> Result<Option<FileInfo>> {
        match self.lstat(dest).await {
            Ok(existing) => {
                check_existing(src, dest, &existing, is_dir, options.overwrite)?;
                Ok(Some(existing))
            }
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn valid_copy_target_sync(
        &self,
        src: &Path,
        dest: &Path,
        is_dir: bool,
        options: CopyOptions,
    ) -> Result<Option<FileInfo>> {
        match self.lstat_sync(dest) {
            Ok(existing) => {
                check_existing(src, dest, &existing, is_dir, options.overwrite)?;
                Ok(Some(existing))
            }
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Copies a file, directory tree or symlink. Links are recreated, not
    /// followed.
    pub async fn copy(
        &self,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        options: CopyOptions,
    ) -> Result<()> {
        let src = self.absolute(src.as_ref())?;
        let dest = self.absolute(dest.as_ref())?;
        if src == dest {
            return Err(same_path_error());
        }

        let info = self.lstat(&src).await?;
        if info.is_directory && is_subdir(&src, &dest) {
            return Err(subdir_error("copy", &src, &dest));
        }
        debug!(src = ?src, dest = ?dest, kind = info.kind_name(), "Copying");
        self.copy_entry(&src, &dest, &info, options).await
    }

    pub fn copy_sync(
        &self,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        options: CopyOptions,
    ) -> Result<()> {
        let src = self.absolute(src.as_ref())?;
        let dest = self.absolute(dest.as_ref())?;
        if src == dest {
            return Err(same_path_error());
        }

        let info = self.lstat_sync(&src)?;
        if info.is_directory && is_subdir(&src, &dest) {
            return Err(subdir_error("copy", &src, &dest));
        }
        debug!(src = ?src, dest = ?dest, kind = info.kind_name(), "Copying");
        self.copy_entry_sync(&src, &dest, &info, options)
    }

    fn copy_entry<'a>(
        &'a self,
        src: &'a Path,
        dest: &'a Path,
        info: &'a FileInfo,
        options: CopyOptions,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if info.is_symlink {
                self.copy_symlink(src, dest, options).await
            } else if info.is_directory {
                self.copy_dir(src, dest, info, options).await
            } else {
                self.valid_copy_target(src, dest, false, options).await?;
                self.copy_file(src, dest).await?;
                self.preserve_times(dest, info, options).await
            }
        }
        .boxed()
    }

    fn copy_entry_sync(
        &self,
        src: &Path,
        dest: &Path,
        info: &FileInfo,
        options: CopyOptions,
    ) -> Result<()> {
        if info.is_symlink {
            self.copy_symlink_sync(src, dest, options)
        } else if info.is_directory {
            self.copy_dir_sync(src, dest, info, options)
        } else {
            self.valid_copy_target_sync(src, dest, false, options)?;
            self.copy_file_sync(src, dest)?;
            self.preserve_times_sync(dest, info, options)
        }
    }

    async fn copy_symlink(&self, src: &Path, dest: &Path, options: CopyOptions) -> Result<()> {
        if self.valid_copy_target(src, dest, false, options).await?.is_some() {
            self.remove(dest, &RemoveOptions::default()).await?;
        }
        let target = self.read_link(src).await?;
        self.symlink(&target, dest, &SymlinkOptions::default()).await
    }

    fn copy_symlink_sync(&self, src: &Path, dest: &Path, options: CopyOptions) -> Result<()> {
        if self.valid_copy_target_sync(src, dest, false, options)?.is_some() {
            self.remove_sync(dest, &RemoveOptions::default())?;
        }
        let target = self.read_link_sync(src)?;
        self.symlink_sync(&target, dest, &SymlinkOptions::default())
    }

    async fn copy_dir(
        &self,
        src: &Path,
        dest: &Path,
        info: &FileInfo,
        options: CopyOptions,
    ) -> Result<()> {
        if self.valid_copy_target(src, dest, true, options).await?.is_none() {
            self.ensure_dir(dest).await?;
        }
        self.preserve_times(dest, info, options).await?;

        for child in self.read_dir(src).await? {
            let child_src = src.join(&child.name);
            let child_dest = dest.join(&child.name);
            let child_info = self.lstat(&child_src).await?;
            self.copy_entry(&child_src, &child_dest, &child_info, options)
                .await?;
        }
        Ok(())
    }

    fn copy_dir_sync(
        &self,
        src: &Path,
        dest: &Path,
        info: &FileInfo,
        options: CopyOptions,
    ) -> Result<()> {
        if self
            .valid_copy_target_sync(src, dest, true, options)?
            .is_none()
        {
            self.ensure_dir_sync(dest)?;
        }
        self.preserve_times_sync(dest, info, options)?;

        for child in self.read_dir_sync(src)? {
            let child_src = src.join(&child.name);
            let child_dest = dest.join(&child.name);
            let child_info = self.lstat_sync(&child_src)?;
            self.copy_entry_sync(&child_src, &child_dest, &child_info, options)?;
        }
        Ok(())
    }

    async fn preserve_times(
        &self,
        dest: &Path,
        info: &FileInfo,
        options: CopyOptions,
    ) -> Result<()> {
        match timestamps(info) {
            Some((atime, mtime)) if options.preserve_timestamps => {
                self.utime(dest, atime, mtime).await
            }
            _ => Ok(()),
        }
    }

    fn preserve_times_sync(
        &self,
        dest: &Path,
        info: &FileInfo,
        options: CopyOptions,
    ) -> Result<()> {
        match timestamps(info) {
            Some((atime, mtime)) if options.preserve_timestamps => {
                self.utime_sync(dest, atime, mtime)
            }
            _ => Ok(()),
        }
    }

    /// Renames `src` to `dest`. Moving onto itself does nothing.
    pub async fn move_path(
        &self,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        options: MoveOptions,
    ) -> Result<()> {
        let src = self.absolute(src.as_ref())?;
        let dest = self.absolute(dest.as_ref())?;
        if src == dest {
            return Ok(());
        }

        let info = self.stat(&src).await?;
        if info.is_directory && is_subdir(&src, &dest) {
            return Err(subdir_error("move", &src, &dest));
        }

        if options.overwrite {
            match self.remove(&dest, &RemoveOptions::recursive()).await {
                Err(err) if !err.is_not_found() => return Err(err),
                _ => {}
            }
        } else {
            match self.lstat(&dest).await {
                Ok(_) => return Err(FsError::already_exists(&dest)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        self.rename(&src, &dest).await
    }

    pub fn move_path_sync(
        &self,
        src: impl AsRef<Path>,
        dest: impl AsRef<Path>,
        options: MoveOptions,
    ) -> Result<()> {
        let src = self.absolute(src.as_ref())?;
        let dest = self.absolute(dest.as_ref())?;
        if src == dest {
            return Ok(());
        }

        let info = self.stat_sync(&src)?;
        if info.is_directory && is_subdir(&src, &dest) {
            return Err(subdir_error("move", &src, &dest));
        }

        if options.overwrite {
            match self.remove_sync(&dest, &RemoveOptions::recursive()) {
                Err(err) if !err.is_not_found() => return Err(err),
                _ => {}
            }
        } else {
            match self.lstat_sync(&dest) {
                Ok(_) => return Err(FsError::already_exists(&dest)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        self.rename_sync(&src, &dest)
    }
}
