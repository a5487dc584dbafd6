//! Backend contract.
//!
//! A backend is a table of filesystem operations. Sync and async tables are
//! separate traits because a host may be able to offer one without the other
//! (for example, no async table when no executor is running). A type that
//! implements both is a [`Runtime`] and can be installed as the primary
//! runtime, which then handles every operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use core_async::io::AsyncWrite;

use crate::error::{FsError, Result};
use crate::handle::{AsyncFileHandle, SyncFileHandle};
use crate::options::{
    CreateDirectoryOptions, MakeTempOptions, OpenOptions, ReadOptions, RemoveOptions,
    SymlinkOptions, WriteOptions,
};
use crate::types::{DirectoryInfo, FileInfo};

/// Every operation the dispatcher binds independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Chmod,
    Chown,
    CopyFile,
    Cwd,
    Gid,
    Link,
    Lstat,
    MakeDir,
    MakeTempDir,
    MakeTempFile,
    Open,
    ReadDir,
    ReadFile,
    ReadLink,
    ReadTextFile,
    RealPath,
    Remove,
    Rename,
    Stat,
    Symlink,
    Uid,
    Utime,
    WriteFile,
    WriteStream,
    WriteTextFile,
}

impl Op {
    pub const ALL: [Op; 25] = [
        Op::Chmod,
        Op::Chown,
        Op::CopyFile,
        Op::Cwd,
        Op::Gid,
        Op::Link,
        Op::Lstat,
        Op::MakeDir,
        Op::MakeTempDir,
        Op::MakeTempFile,
        Op::Open,
        Op::ReadDir,
        Op::ReadFile,
        Op::ReadLink,
        Op::ReadTextFile,
        Op::RealPath,
        Op::Remove,
        Op::Rename,
        Op::Stat,
        Op::Symlink,
        Op::Uid,
        Op::Utime,
        Op::WriteFile,
        Op::WriteStream,
        Op::WriteTextFile,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index, usable for per-operation tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Chmod => "chmod",
            Op::Chown => "chown",
            Op::CopyFile => "copyFile",
            Op::Cwd => "cwd",
            Op::Gid => "gid",
            Op::Link => "link",
            Op::Lstat => "lstat",
            Op::MakeDir => "makeDir",
            Op::MakeTempDir => "makeTempDir",
            Op::MakeTempFile => "makeTempFile",
            Op::Open => "open",
            Op::ReadDir => "readDir",
            Op::ReadFile => "readFile",
            Op::ReadLink => "readLink",
            Op::ReadTextFile => "readTextFile",
            Op::RealPath => "realPath",
            Op::Remove => "remove",
            Op::Rename => "rename",
            Op::Stat => "stat",
            Op::Symlink => "symlink",
            Op::Uid => "uid",
            Op::Utime => "utime",
            Op::WriteFile => "writeFile",
            Op::WriteStream => "writeStream",
            Op::WriteTextFile => "writeTextFile",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity shared by sync and async tables.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this table can serve `op`. Resolution skips tables that
    /// answer `false`.
    fn provides(&self, _op: Op) -> bool {
        true
    }
}

/// Blocking operation table.
pub trait SyncBackend: Backend {
    fn chmod(&self, path: &Path, mode: u32) -> Result<()>;

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()>;

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    fn link(&self, existing: &Path, new: &Path) -> Result<()>;

    fn lstat(&self, path: &Path) -> Result<FileInfo>;

    fn stat(&self, path: &Path) -> Result<FileInfo>;

    fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()>;

    /// Native temp directory creation. Only primary runtimes implement it.
    fn make_temp_dir(&self, _options: &MakeTempOptions) -> Result<PathBuf> {
        Err(FsError::unsupported("makeTempDir"))
    }

    /// Native temp file creation. Only primary runtimes implement it.
    fn make_temp_file(&self, _options: &MakeTempOptions) -> Result<PathBuf> {
        Err(FsError::unsupported("makeTempFile"))
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn SyncFileHandle>>;

    fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>>;

    fn read_file(&self, path: &Path) -> Result<Bytes>;

    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    fn read_text_file(&self, path: &Path) -> Result<String> {
        let bytes = self.read_file(path)?;
        decode_utf8(bytes)
    }

    fn real_path(&self, path: &Path) -> Result<PathBuf>;

    fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()>;

    fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()>;

    fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()>;

    fn write_text_file(&self, path: &Path, data: &str, options: &WriteOptions) -> Result<()> {
        self.write_file(path, data.as_bytes(), options)
    }

    fn cwd(&self) -> Result<PathBuf>;

    /// `None` when the platform has no numeric user ids.
    fn uid(&self) -> Option<u32>;

    fn gid(&self) -> Option<u32>;
}

/// Write stream returned by [`AsyncBackend::open_write_stream`].
pub type WriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Non-blocking operation table.
#[async_trait]
pub trait AsyncBackend: Backend {
    async fn chmod(&self, path: &Path, mode: u32) -> Result<()>;

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()>;

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    async fn link(&self, existing: &Path, new: &Path) -> Result<()>;

    async fn lstat(&self, path: &Path) -> Result<FileInfo>;

    async fn stat(&self, path: &Path) -> Result<FileInfo>;

    async fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()>;

    async fn make_temp_dir(&self, _options: &MakeTempOptions) -> Result<PathBuf> {
        Err(FsError::unsupported("makeTempDir"))
    }

    async fn make_temp_file(&self, _options: &MakeTempOptions) -> Result<PathBuf> {
        Err(FsError::unsupported("makeTempFile"))
    }

    async fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn AsyncFileHandle>>;

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>>;

    /// Backends that can interrupt an in-flight read honor `options.signal`.
    async fn read_file(&self, path: &Path, options: &ReadOptions) -> Result<Bytes>;

    async fn read_link(&self, path: &Path) -> Result<PathBuf>;

    async fn read_text_file(&self, path: &Path, options: &ReadOptions) -> Result<String> {
        let bytes = self.read_file(path, options).await?;
        decode_utf8(bytes)
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf>;

    async fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    async fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()>;

    async fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()>;

    async fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()>;

    async fn write_text_file(&self, path: &Path, data: &str, options: &WriteOptions) -> Result<()> {
        self.write_file(path, data.as_bytes(), options).await
    }

    /// Opens a writer honoring `append`, `create` and `mode`. The caller is
    /// responsible for shutting it down.
    async fn open_write_stream(&self, path: &Path, options: &WriteOptions) -> Result<WriteStream>;
}

/// A backend with both tables, eligible to be the primary runtime.
pub trait Runtime: SyncBackend + AsyncBackend {
    fn as_sync(self: Arc<Self>) -> Arc<dyn SyncBackend>;

    fn as_async(self: Arc<Self>) -> Arc<dyn AsyncBackend>;
}

impl<T> Runtime for T
where
    T: SyncBackend + AsyncBackend + 'static,
{
    fn as_sync(self: Arc<Self>) -> Arc<dyn SyncBackend> {
        self
    }

    fn as_async(self: Arc<Self>) -> Arc<dyn AsyncBackend> {
        self
    }
}

/// Produces backend tables on demand.
///
/// Failing to load is data (`None`), never an error. Loaders are consulted
/// in priority order by the capability registry.
pub trait BackendLoader: Send + Sync {
    fn name(&self) -> &'static str;

    fn load_sync(&self) -> Option<Arc<dyn SyncBackend>>;

    fn load_async(&self) -> Option<Arc<dyn AsyncBackend>>;
}

/// Strict UTF-8 decoding shared by the text operations.
pub fn decode_utf8(bytes: Bytes) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err).into())
}
