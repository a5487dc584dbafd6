//! Blocking backend on top of `std::fs`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bridge_traits::{
    error::Result,
    Backend, CreateDirectoryOptions, DirectoryInfo, FileInfo, FsSupports, OpenOptions,
    RemoveOptions, Supports, SymlinkOptions, SyncBackend, SyncFileHandle, WriteOptions,
};
use bytes::Bytes;
use tracing::debug;

use crate::handle::StdFileHandle;
use crate::metadata::file_info;

/// Sync operation table backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdBackend;

impl StdBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for StdBackend {
    fn name(&self) -> &'static str {
        "std"
    }
}

impl SyncBackend for StdBackend {
    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        set_mode(path, mode)?;
        debug!(path = ?path, mode = format_args!("{mode:o}"), "Changed mode");
        Ok(())
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        set_owner(path, uid, gid)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let copied = fs::copy(from, to)?;
        debug!(from = ?from, to = ?to, size = copied, "Copied file");
        Ok(())
    }

    fn link(&self, existing: &Path, new: &Path) -> Result<()> {
        fs::hard_link(existing, new)?;
        Ok(())
    }

    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(file_info(path, &metadata))
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        let metadata = fs::metadata(path)?;
        Ok(file_info(path, &metadata))
    }

    fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()> {
        dir_builder(options).create(path)?;
        debug!(path = ?path, recursive = options.recursive, "Created directory");
        Ok(())
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn SyncFileHandle>> {
        let file = std_open_options(options).open(path)?;
        debug!(path = ?path, write = options.writable(), "Opened file");
        Ok(Box::new(StdFileHandle::new(
            file,
            path.to_path_buf(),
            handle_supports(options),
        )))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let child = entry.path();
            match fs::symlink_metadata(&child) {
                Ok(metadata) => entries.push(directory_info(&entry.file_name(), &metadata)),
                Err(err) => {
                    debug!(path = ?child, error = %err, "Skipping unreadable directory entry")
                }
            }
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        Ok(fs::read_link(path)?)
    }

    fn real_path(&self, path: &Path) -> Result<PathBuf> {
        Ok(fs::canonicalize(path)?)
    }

    fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()> {
        remove_path(path, options)?;
        debug!(path = ?path, recursive = options.recursive, "Removed path");
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)?;
        Ok(())
    }

    fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()> {
        create_symlink(target, path, options)?;
        debug!(target = ?target, path = ?path, "Created symlink");
        Ok(())
    }

    fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        set_times(path, atime, mtime)
    }

    fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()> {
        let mut file = std_write_options(options).open(path)?;
        file.write_all(data)?;
        file.flush()?;
        debug!(path = ?path, size = data.len(), append = options.append, "Wrote file");
        Ok(())
    }

    fn cwd(&self) -> Result<PathBuf> {
        Ok(std::env::current_dir()?)
    }

    fn uid(&self) -> Option<u32> {
        current_uid()
    }

    fn gid(&self) -> Option<u32> {
        current_gid()
    }
}

pub(crate) fn directory_info(name: &std::ffi::OsStr, metadata: &fs::Metadata) -> DirectoryInfo {
    let file_type = metadata.file_type();
    DirectoryInfo {
        name: name.to_string_lossy().into_owned(),
        is_file: file_type.is_file(),
        is_directory: file_type.is_dir(),
        is_symlink: file_type.is_symlink(),
    }
}

/// Capabilities a std or Tokio handle offers for the given access.
pub(crate) fn handle_supports(options: &OpenOptions) -> Supports {
    Supports::empty()
        .with_if(FsSupports::Read, options.read)
        .with_if(FsSupports::Write, options.writable())
        .with(FsSupports::Seek)
        .with_if(FsSupports::Truncate, options.writable())
        .with_if(FsSupports::Lock, cfg!(unix))
}

pub(crate) fn std_open_options(options: &OpenOptions) -> fs::OpenOptions {
    let mut open = fs::OpenOptions::new();
    open.read(options.read)
        .write(options.write)
        .append(options.append)
        .truncate(options.truncate)
        .create(options.create)
        .create_new(options.create_new);
    apply_mode(&mut open, options.mode);
    open
}

pub(crate) fn std_write_options(options: &WriteOptions) -> fs::OpenOptions {
    let mut open = fs::OpenOptions::new();
    open.write(true).create(options.create);
    if options.append {
        open.append(true);
    } else {
        open.truncate(true);
    }
    apply_mode(&mut open, options.mode);
    open
}

#[cfg(unix)]
fn apply_mode(open: &mut fs::OpenOptions, mode: Option<u32>) {
    use std::os::unix::fs::OpenOptionsExt;
    if let Some(mode) = mode {
        open.mode(mode);
    }
}

#[cfg(not(unix))]
fn apply_mode(_open: &mut fs::OpenOptions, _mode: Option<u32>) {}

pub(crate) fn dir_builder(options: &CreateDirectoryOptions) -> fs::DirBuilder {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(options.recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        if let Some(mode) = options.mode {
            builder.mode(mode);
        }
    }
    builder
}

pub(crate) fn remove_path(path: &Path, options: &RemoveOptions) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        if options.recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        }
    } else {
        match fs::remove_file(path) {
            // Directory symlinks on Windows are removed as directories.
            #[cfg(windows)]
            Err(_) if metadata.file_type().is_symlink() => fs::remove_dir(path),
            other => other,
        }
    }
}

pub(crate) fn create_symlink(
    target: &Path,
    path: &Path,
    options: &SymlinkOptions,
) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let _ = options;
        std::os::unix::fs::symlink(target, path)
    }

    #[cfg(windows)]
    {
        use bridge_traits::SymlinkType;

        let kind = match options.kind {
            Some(kind) => kind,
            None => {
                let resolved = match path.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target.to_path_buf(),
                };
                if fs::metadata(resolved).map(|m| m.is_dir()).unwrap_or(false) {
                    SymlinkType::Dir
                } else {
                    SymlinkType::File
                }
            }
        };
        match kind {
            SymlinkType::Dir => std::os::windows::fs::symlink_dir(target, path),
            SymlinkType::File => std::os::windows::fs::symlink_file(target, path),
        }
    }
}

pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Err(bridge_traits::FsError::unsupported("chmod"))
    }
}

pub(crate) fn set_owner(path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::chown(path, uid, gid)?;
        debug!(path = ?path, ?uid, ?gid, "Changed owner");
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = (path, uid, gid);
        Err(bridge_traits::FsError::unsupported("chown"))
    }
}

pub(crate) fn set_times(path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
    filetime::set_file_times(
        path,
        filetime::FileTime::from_system_time(atime),
        filetime::FileTime::from_system_time(mtime),
    )?;
    Ok(())
}

#[cfg(unix)]
pub(crate) fn current_uid() -> Option<u32> {
    let uid = nix::unistd::getuid().as_raw();
    (uid != u32::MAX).then_some(uid)
}

#[cfg(unix)]
pub(crate) fn current_gid() -> Option<u32> {
    let gid = nix::unistd::getgid().as_raw();
    (gid != u32::MAX).then_some(gid)
}

#[cfg(not(unix))]
pub(crate) fn current_uid() -> Option<u32> {
    None
}

#[cfg(not(unix))]
pub(crate) fn current_gid() -> Option<u32> {
    None
}
