//! Operation dispatcher.
//!
//! [`Fs`] is the public entry point. Every operation is resolved the same
//! way: a primary runtime wins outright; otherwise the operation's binding
//! is looked up, and on first use the registry is probed and the answer is
//! stored for the lifetime of the context. Sync and async bindings are
//! independent.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use bridge_traits::{
    signal, AsyncBackend, CreateDirectoryOptions, DirectoryInfo, FileInfo, Op,
    OpenOptions, ReadOptions, RemoveOptions, SymlinkOptions, SyncBackend, WriteOptions,
};
use bytes::Bytes;
use core_async::io::AsyncWriteExt;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::config::FsConfig;
use crate::error::{FsError, Result};
use crate::file::{AsyncFsFile, FsFile};
use crate::registry::CapabilityRegistry;

/// One write-once slot per operation.
struct Bindings<T: ?Sized> {
    slots: [OnceLock<Arc<T>>; Op::COUNT],
}

impl<T: ?Sized> Bindings<T> {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    fn get(&self, op: Op) -> Option<&Arc<T>> {
        self.slots[op.index()].get()
    }

    /// Stores `backend` unless another caller got there first; either way
    /// returns the stored value.
    fn bind(&self, op: Op, backend: Arc<T>) -> &Arc<T> {
        self.slots[op.index()].get_or_init(|| backend)
    }
}

/// Filesystem context.
pub struct Fs {
    registry: CapabilityRegistry,
    sync_bindings: Bindings<dyn SyncBackend>,
    async_bindings: Bindings<dyn AsyncBackend>,
    pub(crate) temp_name_length: usize,
    pub(crate) temp_root: Option<PathBuf>,
}

static GLOBAL_FS: OnceLock<Fs> = OnceLock::new();

/// Process-wide context built with [`Fs::detect`] on first use.
pub fn fs() -> &'static Fs {
    GLOBAL_FS.get_or_init(Fs::detect)
}

impl Fs {
    pub fn new(config: FsConfig) -> Self {
        Self {
            registry: CapabilityRegistry::from_config(&config),
            sync_bindings: Bindings::new(),
            async_bindings: Bindings::new(),
            temp_name_length: config.temp_name_length,
            temp_root: config.temp_root,
        }
    }

    /// Context with the installed primary runtime (if any) and the default
    /// loaders.
    pub fn detect() -> Self {
        Self::new(FsConfig::default())
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn is_windows(&self) -> bool {
        self.registry.is_windows_platform()
    }

    /// Name of the backend currently bound for sync `op`, if bound.
    pub fn bound_sync_backend(&self, op: Op) -> Option<&'static str> {
        self.sync_bindings.get(op).map(|b| b.name())
    }

    /// Name of the backend currently bound for async `op`, if bound.
    pub fn bound_async_backend(&self, op: Op) -> Option<&'static str> {
        self.async_bindings.get(op).map(|b| b.name())
    }

    pub(crate) fn sync_backend(&self, op: Op) -> Result<&dyn SyncBackend> {
        if let Some(primary) = self.registry.primary() {
            return Ok(primary.sync.as_ref());
        }
        if let Some(bound) = self.sync_bindings.get(op) {
            return Ok(bound.as_ref());
        }
        match self.registry.resolve_sync(op) {
            Some(backend) => {
                let bound = self.sync_bindings.bind(op, backend);
                debug!(op = %op, backend = bound.name(), "Bound sync operation");
                Ok(bound.as_ref())
            }
            None => {
                warn!(op = %op, "No sync backend provides operation");
                Err(FsError::NoBackend)
            }
        }
    }

    pub(crate) fn async_backend(&self, op: Op) -> Result<&dyn AsyncBackend> {
        if let Some(primary) = self.registry.primary() {
            return Ok(primary.async_.as_ref());
        }
        if let Some(bound) = self.async_bindings.get(op) {
            return Ok(bound.as_ref());
        }
        match self.registry.resolve_async(op) {
            Some(backend) => {
                let bound = self.async_bindings.bind(op, backend);
                debug!(op = %op, backend = bound.name(), "Bound async operation");
                Ok(bound.as_ref())
            }
            None => {
                warn!(op = %op, "No async backend provides operation");
                Err(FsError::NoBackend)
            }
        }
    }

    pub(crate) fn primary_sync(&self) -> Option<&dyn SyncBackend> {
        self.registry.primary().map(|p| p.sync.as_ref())
    }

    pub(crate) fn primary_async(&self) -> Option<&dyn AsyncBackend> {
        self.registry.primary().map(|p| p.async_.as_ref())
    }

    pub async fn chmod(&self, path: impl AsRef<Path>, mode: u32) -> Result<()> {
        self.async_backend(Op::Chmod)?
            .chmod(path.as_ref(), mode)
            .await
    }

    pub fn chmod_sync(&self, path: impl AsRef<Path>, mode: u32) -> Result<()> {
        self.sync_backend(Op::Chmod)?.chmod(path.as_ref(), mode)
    }

    pub async fn chown(
        &self,
        path: impl AsRef<Path>,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<()> {
        self.async_backend(Op::Chown)?
            .chown(path.as_ref(), uid, gid)
            .await
    }

    pub fn chown_sync(
        &self,
        path: impl AsRef<Path>,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<()> {
        self.sync_backend(Op::Chown)?.chown(path.as_ref(), uid, gid)
    }

    pub async fn copy_file(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        self.async_backend(Op::CopyFile)?
            .copy_file(from.as_ref(), to.as_ref())
            .await
    }

    pub fn copy_file_sync(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        self.sync_backend(Op::CopyFile)?
            .copy_file(from.as_ref(), to.as_ref())
    }

    pub async fn link(&self, existing: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<()> {
        self.async_backend(Op::Link)?
            .link(existing.as_ref(), new.as_ref())
            .await
    }

    pub fn link_sync(&self, existing: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<()> {
        self.sync_backend(Op::Link)?
            .link(existing.as_ref(), new.as_ref())
    }

    pub async fn lstat(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        self.async_backend(Op::Lstat)?.lstat(path.as_ref()).await
    }

    pub fn lstat_sync(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        self.sync_backend(Op::Lstat)?.lstat(path.as_ref())
    }

    pub async fn stat(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        self.async_backend(Op::Stat)?.stat(path.as_ref()).await
    }

    pub fn stat_sync(&self, path: impl AsRef<Path>) -> Result<FileInfo> {
        self.sync_backend(Op::Stat)?.stat(path.as_ref())
    }

    pub async fn make_dir(
        &self,
        path: impl AsRef<Path>,
        options: &CreateDirectoryOptions,
    ) -> Result<()> {
        self.async_backend(Op::MakeDir)?
            .make_dir(path.as_ref(), options)
            .await
    }

    pub fn make_dir_sync(
        &self,
        path: impl AsRef<Path>,
        options: &CreateDirectoryOptions,
    ) -> Result<()> {
        self.sync_backend(Op::MakeDir)?
            .make_dir(path.as_ref(), options)
    }

    pub async fn open(&self, path: impl AsRef<Path>, options: &OpenOptions) -> Result<AsyncFsFile> {
        let path = path.as_ref();
        let handle = self.async_backend(Op::Open)?.open(path, options).await?;
        Ok(AsyncFsFile::new(path.to_path_buf(), handle))
    }

    pub fn open_sync(&self, path: impl AsRef<Path>, options: &OpenOptions) -> Result<FsFile> {
        let path = path.as_ref();
        let handle = self.sync_backend(Op::Open)?.open(path, options)?;
        Ok(FsFile::new(path.to_path_buf(), handle))
    }

    /// Opens `path`, runs `f`, and closes the handle whatever `f` returns.
    pub fn with_file_sync<T>(
        &self,
        path: impl AsRef<Path>,
        options: &OpenOptions,
        f: impl FnOnce(&mut FsFile) -> Result<T>,
    ) -> Result<T> {
        let mut file = self.open_sync(path, options)?;
        let result = f(&mut file);
        let closed = file.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub async fn read_dir(&self, path: impl AsRef<Path>) -> Result<Vec<DirectoryInfo>> {
        self.async_backend(Op::ReadDir)?
            .read_dir(path.as_ref())
            .await
    }

    pub fn read_dir_sync(&self, path: impl AsRef<Path>) -> Result<Vec<DirectoryInfo>> {
        self.sync_backend(Op::ReadDir)?.read_dir(path.as_ref())
    }

    pub async fn read_file(&self, path: impl AsRef<Path>, options: &ReadOptions) -> Result<Bytes> {
        signal::check(options.signal.as_ref())?;
        self.async_backend(Op::ReadFile)?
            .read_file(path.as_ref(), options)
            .await
    }

    pub fn read_file_sync(&self, path: impl AsRef<Path>, options: &ReadOptions) -> Result<Bytes> {
        signal::check(options.signal.as_ref())?;
        self.sync_backend(Op::ReadFile)?.read_file(path.as_ref())
    }

    pub async fn read_link(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.async_backend(Op::ReadLink)?
            .read_link(path.as_ref())
            .await
    }

    pub fn read_link_sync(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.sync_backend(Op::ReadLink)?.read_link(path.as_ref())
    }

    /// Reads `path` as UTF-8. Invalid data fails with `InvalidData`.
    pub async fn read_text_file(
        &self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<String> {
        signal::check(options.signal.as_ref())?;
        self.async_backend(Op::ReadTextFile)?
            .read_text_file(path.as_ref(), options)
            .await
    }

    pub fn read_text_file_sync(
        &self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<String> {
        signal::check(options.signal.as_ref())?;
        self.sync_backend(Op::ReadTextFile)?
            .read_text_file(path.as_ref())
    }

    pub async fn real_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.async_backend(Op::RealPath)?
            .real_path(path.as_ref())
            .await
    }

    pub fn real_path_sync(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.sync_backend(Op::RealPath)?.real_path(path.as_ref())
    }

    /// Removes a file, link or directory. Non-empty directories need
    /// `recursive`.
    pub async fn remove(&self, path: impl AsRef<Path>, options: &RemoveOptions) -> Result<()> {
        self.async_backend(Op::Remove)?
            .remove(path.as_ref(), options)
            .await
    }

    pub fn remove_sync(&self, path: impl AsRef<Path>, options: &RemoveOptions) -> Result<()> {
        self.sync_backend(Op::Remove)?
            .remove(path.as_ref(), options)
    }

    pub async fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        self.async_backend(Op::Rename)?
            .rename(from.as_ref(), to.as_ref())
            .await
    }

    pub fn rename_sync(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
        self.sync_backend(Op::Rename)?
            .rename(from.as_ref(), to.as_ref())
    }

    pub async fn symlink(
        &self,
        target: impl AsRef<Path>,
        path: impl AsRef<Path>,
        options: &SymlinkOptions,
    ) -> Result<()> {
        self.async_backend(Op::Symlink)?
            .symlink(target.as_ref(), path.as_ref(), options)
            .await
    }

    pub fn symlink_sync(
        &self,
        target: impl AsRef<Path>,
        path: impl AsRef<Path>,
        options: &SymlinkOptions,
    ) -> Result<()> {
        self.sync_backend(Op::Symlink)?
            .symlink(target.as_ref(), path.as_ref(), options)
    }

    pub async fn utime(
        &self,
        path: impl AsRef<Path>,
        atime: SystemTime,
        mtime: SystemTime,
    ) -> Result<()> {
        self.async_backend(Op::Utime)?
            .utime(path.as_ref(), atime, mtime)
            .await
    }

    pub fn utime_sync(
        &self,
        path: impl AsRef<Path>,
        atime: SystemTime,
        mtime: SystemTime,
    ) -> Result<()> {
        self.sync_backend(Op::Utime)?
            .utime(path.as_ref(), atime, mtime)
    }

    pub async fn write_file(
        &self,
        path: impl AsRef<Path>,
        data: impl AsRef<[u8]>,
        options: &WriteOptions,
    ) -> Result<()> {
        signal::check(options.signal.as_ref())?;
        self.async_backend(Op::WriteFile)?
            .write_file(path.as_ref(), data.as_ref(), options)
            .await
    }

    pub fn write_file_sync(
        &self,
        path: impl AsRef<Path>,
        data: impl AsRef<[u8]>,
        options: &WriteOptions,
    ) -> Result<()> {
        signal::check(options.signal.as_ref())?;
        self.sync_backend(Op::WriteFile)?
            .write_file(path.as_ref(), data.as_ref(), options)
    }

    /// Pipes `chunks` into the file. The writer is shut down on every exit
    /// path; a stream error is reported ahead of a shutdown error.
    pub async fn write_file_stream<S>(
        &self,
        path: impl AsRef<Path>,
        chunks: S,
        options: &WriteOptions,
    ) -> Result<()>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        signal::check(options.signal.as_ref())?;
        let path = path.as_ref();
        let mut writer = self
            .async_backend(Op::WriteStream)?
            .open_write_stream(path, options)
            .await?;

        let mut chunks = std::pin::pin!(chunks);
        let mut written = 0usize;
        let piped = async {
            while let Some(chunk) = chunks.next().await {
                signal::check(options.signal.as_ref())?;
                let chunk = chunk?;
                writer.write_all(&chunk).await?;
                written += chunk.len();
            }
            Ok::<(), FsError>(())
        }
        .await;
        let closed = writer.shutdown().await;

        piped?;
        closed?;
        debug!(path = ?path, size = written, "Wrote file stream");
        Ok(())
    }

    pub async fn write_text_file(
        &self,
        path: impl AsRef<Path>,
        data: &str,
        options: &WriteOptions,
    ) -> Result<()> {
        signal::check(options.signal.as_ref())?;
        self.async_backend(Op::WriteTextFile)?
            .write_text_file(path.as_ref(), data, options)
            .await
    }

    pub fn write_text_file_sync(
        &self,
        path: impl AsRef<Path>,
        data: &str,
        options: &WriteOptions,
    ) -> Result<()> {
        signal::check(options.signal.as_ref())?;
        self.sync_backend(Op::WriteTextFile)?
            .write_text_file(path.as_ref(), data, options)
    }

    pub fn cwd(&self) -> Result<PathBuf> {
        self.sync_backend(Op::Cwd)?.cwd()
    }

    /// Current user id, `None` off POSIX or when no backend is available.
    pub fn uid(&self) -> Option<u32> {
        self.sync_backend(Op::Uid).ok()?.uid()
    }

    /// Current group id, `None` off POSIX or when no backend is available.
    pub fn gid(&self) -> Option<u32> {
        self.sync_backend(Op::Gid).ok()?.gid()
    }
}

impl fmt::Debug for Fs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fs")
            .field("registry", &self.registry)
            .field("temp_name_length", &self.temp_name_length)
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}
