//! Async backend using `tokio::fs`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bridge_traits::{
    error::{FsError, Result},
    AsyncBackend, AsyncFileHandle, Backend, CreateDirectoryOptions, DirectoryInfo, FileInfo,
    OpenOptions, ReadOptions, RemoveOptions, SymlinkOptions, WriteOptions, WriteStream,
};
use bytes::Bytes;
use core_async::{fs, io::AsyncWriteExt, runtime, task};
use tracing::debug;

use crate::handle::TokioFileHandle;
use crate::inline::InlineBackend;
use crate::metadata::file_info;
use crate::std_backend::{
    create_symlink, directory_info, handle_supports, remove_path, set_mode, set_owner, set_times,
    std_open_options, std_write_options,
};

/// Async operation table on the ambient Tokio runtime.
///
/// Calls without an async form in `tokio::fs` (ownership, timestamps,
/// symlink creation) run on the blocking pool. A call polled outside any
/// Tokio runtime runs in place through [`InlineBackend`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBackend {
    fallback: InlineBackend,
}

impl TokioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-place table when no Tokio runtime is driving the caller.
    fn detached(&self) -> Option<&InlineBackend> {
        if runtime::has_ambient_runtime() {
            None
        } else {
            debug!("No ambient Tokio runtime; running in place");
            Some(&self.fallback)
        }
    }

    async fn open_for_write(path: &Path, options: &WriteOptions) -> Result<fs::File> {
        let open = fs::OpenOptions::from(std_write_options(options));
        Ok(open.open(path).await?)
    }
}

impl Backend for TokioBackend {
    fn name(&self) -> &'static str {
        "tokio"
    }
}

#[async_trait]
impl AsyncBackend for TokioBackend {
    async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.chmod(path, mode).await;
        }
        let path = path.to_path_buf();
        task::spawn_blocking(move || set_mode(&path, mode))
            .await
            .map_err(join_error)?
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.chown(path, uid, gid).await;
        }
        let path = path.to_path_buf();
        task::spawn_blocking(move || set_owner(&path, uid, gid))
            .await
            .map_err(join_error)?
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.copy_file(from, to).await;
        }
        let copied = fs::copy(from, to).await?;
        debug!(from = ?from, to = ?to, size = copied, "Copied file");
        Ok(())
    }

    async fn link(&self, existing: &Path, new: &Path) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.link(existing, new).await;
        }
        fs::hard_link(existing, new).await?;
        Ok(())
    }

    async fn lstat(&self, path: &Path) -> Result<FileInfo> {
        if let Some(inline) = self.detached() {
            return inline.lstat(path).await;
        }
        let metadata = fs::symlink_metadata(path).await?;
        Ok(file_info(path, &metadata))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        if let Some(inline) = self.detached() {
            return inline.stat(path).await;
        }
        let metadata = fs::metadata(path).await?;
        Ok(file_info(path, &metadata))
    }

    async fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.make_dir(path, options).await;
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(options.recursive);
        #[cfg(unix)]
        {
            if let Some(mode) = options.mode {
                builder.mode(mode);
            }
        }
        builder.create(path).await?;
        debug!(path = ?path, recursive = options.recursive, "Created directory");
        Ok(())
    }

    async fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn AsyncFileHandle>> {
        if let Some(inline) = self.detached() {
            return inline.open(path, options).await;
        }
        let file = fs::OpenOptions::from(std_open_options(options))
            .open(path)
            .await?;
        debug!(path = ?path, write = options.writable(), "Opened file");
        Ok(Box::new(TokioFileHandle::new(
            file,
            path.to_path_buf(),
            handle_supports(options),
        )))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>> {
        if let Some(inline) = self.detached() {
            return inline.read_dir(path).await;
        }
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let child = entry.path();
            match fs::symlink_metadata(&child).await {
                Ok(metadata) => entries.push(directory_info(&entry.file_name(), &metadata)),
                Err(err) => {
                    debug!(path = ?child, error = %err, "Skipping unreadable directory entry")
                }
            }
        }
        Ok(entries)
    }

    async fn read_file(&self, path: &Path, options: &ReadOptions) -> Result<Bytes> {
        if let Some(inline) = self.detached() {
            return inline.read_file(path, options).await;
        }
        let data = match &options.signal {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.aborted() => return Err(FsError::Aborted),
                    data = fs::read(path) => data?,
                }
            }
            None => fs::read(path).await?,
        };
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn read_link(&self, path: &Path) -> Result<PathBuf> {
        if let Some(inline) = self.detached() {
            return inline.read_link(path).await;
        }
        Ok(fs::read_link(path).await?)
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf> {
        if let Some(inline) = self.detached() {
            return inline.real_path(path).await;
        }
        Ok(fs::canonicalize(path).await?)
    }

    async fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.remove(path, options).await;
        }
        let owned = path.to_path_buf();
        let options = *options;
        task::run_blocking(move || remove_path(&owned, &options)).await?;
        debug!(path = ?path, recursive = options.recursive, "Removed path");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.rename(from, to).await;
        }
        fs::rename(from, to).await?;
        Ok(())
    }

    async fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.symlink(target, path, options).await;
        }
        let (target, path, options) = (target.to_path_buf(), path.to_path_buf(), *options);
        task::run_blocking(move || create_symlink(&target, &path, &options)).await?;
        Ok(())
    }

    async fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.utime(path, atime, mtime).await;
        }
        let path = path.to_path_buf();
        task::spawn_blocking(move || set_times(&path, atime, mtime))
            .await
            .map_err(join_error)?
    }

    async fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()> {
        if let Some(inline) = self.detached() {
            return inline.write_file(path, data, options).await;
        }
        let write = async {
            let mut file = Self::open_for_write(path, options).await?;
            file.write_all(data).await?;
            file.flush().await?;
            Ok::<_, FsError>(())
        };

        match &options.signal {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.aborted() => return Err(FsError::Aborted),
                    result = write => result?,
                }
            }
            None => write.await?,
        }
        debug!(path = ?path, size = data.len(), append = options.append, "Wrote file");
        Ok(())
    }

    async fn open_write_stream(&self, path: &Path, options: &WriteOptions) -> Result<WriteStream> {
        if let Some(inline) = self.detached() {
            return inline.open_write_stream(path, options).await;
        }
        let file = Self::open_for_write(path, options).await?;
        Ok(Box::new(file))
    }
}

fn join_error(err: task::JoinError) -> FsError {
    FsError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}
