//! Native primary runtime.
//!
//! Combines the std and Tokio tables and adds native temp file creation, so
//! it can be installed as the primary runtime and serve every operation
//! without loader probing. Its async table runs on the ambient Tokio runtime
//! and runs in place when polled outside one.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bridge_traits::{
    error::Result, AsyncBackend, AsyncFileHandle, Backend, CreateDirectoryOptions,
    DirectoryInfo, FileInfo, MakeTempOptions, OpenOptions, ReadOptions, RemoveOptions,
    SymlinkOptions, SyncBackend, SyncFileHandle, WriteOptions, WriteStream,
};
use bytes::Bytes;
use tracing::debug;

use crate::std_backend::StdBackend;
use crate::tokio_backend::TokioBackend;

const RANDOM_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime {
    sync: StdBackend,
    async_: TokioBackend,
}

impl NativeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn temp_parent(options: &MakeTempOptions) -> PathBuf {
        let root = std::env::temp_dir();
        match &options.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root,
        }
    }

    fn temp_builder(options: &MakeTempOptions) -> tempfile::Builder<'_, '_> {
        let mut builder = tempfile::Builder::new();
        builder
            .prefix(options.prefix.as_deref().unwrap_or(""))
            .suffix(options.suffix.as_deref().unwrap_or(""))
            .rand_bytes(RANDOM_LEN);
        builder
    }
}

impl Backend for NativeRuntime {
    fn name(&self) -> &'static str {
        "native"
    }
}

impl SyncBackend for NativeRuntime {
    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        self.sync.chmod(path, mode)
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        self.sync.chown(path, uid, gid)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.sync.copy_file(from, to)
    }

    fn link(&self, existing: &Path, new: &Path) -> Result<()> {
        self.sync.link(existing, new)
    }

    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        self.sync.lstat(path)
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        self.sync.stat(path)
    }

    fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()> {
        self.sync.make_dir(path, options)
    }

    fn make_temp_dir(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        let parent = Self::temp_parent(options);
        let dir = Self::temp_builder(options).tempdir_in(&parent)?;
        let path = dir.keep();
        debug!(path = ?path, "Created temp directory");
        Ok(path)
    }

    fn make_temp_file(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        let parent = Self::temp_parent(options);
        let file = Self::temp_builder(options).tempfile_in(&parent)?;
        let (_, path) = file.keep().map_err(|err| err.error)?;
        debug!(path = ?path, "Created temp file");
        Ok(path)
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn SyncFileHandle>> {
        self.sync.open(path, options)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>> {
        self.sync.read_dir(path)
    }

    fn read_file(&self, path: &Path) -> Result<Bytes> {
        self.sync.read_file(path)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.sync.read_link(path)
    }

    fn real_path(&self, path: &Path) -> Result<PathBuf> {
        self.sync.real_path(path)
    }

    fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()> {
        self.sync.remove(path, options)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.sync.rename(from, to)
    }

    fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()> {
        self.sync.symlink(target, path, options)
    }

    fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        self.sync.utime(path, atime, mtime)
    }

    fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()> {
        self.sync.write_file(path, data, options)
    }

    fn cwd(&self) -> Result<PathBuf> {
        self.sync.cwd()
    }

    fn uid(&self) -> Option<u32> {
        self.sync.uid()
    }

    fn gid(&self) -> Option<u32> {
        self.sync.gid()
    }
}

#[async_trait]
impl AsyncBackend for NativeRuntime {
    async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        self.async_.chmod(path, mode).await
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        self.async_.chown(path, uid, gid).await
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.async_.copy_file(from, to).await
    }

    async fn link(&self, existing: &Path, new: &Path) -> Result<()> {
        self.async_.link(existing, new).await
    }

    async fn lstat(&self, path: &Path) -> Result<FileInfo> {
        self.async_.lstat(path).await
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        self.async_.stat(path).await
    }

    async fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()> {
        self.async_.make_dir(path, options).await
    }

    async fn make_temp_dir(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if !core_async::runtime::has_ambient_runtime() {
            return SyncBackend::make_temp_dir(self, options);
        }
        let (runtime, options) = (*self, options.clone());
        core_async::task::spawn_blocking(move || SyncBackend::make_temp_dir(&runtime, &options))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?
    }

    async fn make_temp_file(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if !core_async::runtime::has_ambient_runtime() {
            return SyncBackend::make_temp_file(self, options);
        }
        let (runtime, options) = (*self, options.clone());
        core_async::task::spawn_blocking(move || SyncBackend::make_temp_file(&runtime, &options))
            .await
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?
    }

    async fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn AsyncFileHandle>> {
        self.async_.open(path, options).await
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>> {
        self.async_.read_dir(path).await
    }

    async fn read_file(&self, path: &Path, options: &ReadOptions) -> Result<Bytes> {
        self.async_.read_file(path, options).await
    }

    async fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.async_.read_link(path).await
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf> {
        self.async_.real_path(path).await
    }

    async fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()> {
        self.async_.remove(path, options).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.async_.rename(from, to).await
    }

    async fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()> {
        self.async_.symlink(target, path, options).await
    }

    async fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        self.async_.utime(path, atime, mtime).await
    }

    async fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()> {
        self.async_.write_file(path, data, options).await
    }

    async fn open_write_stream(&self, path: &Path, options: &WriteOptions) -> Result<WriteStream> {
        self.async_.open_write_stream(path, options).await
    }
}
