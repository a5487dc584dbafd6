//! File handles for the std and Tokio backends.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use bridge_traits::{
    error::{FsError, Result},
    AsyncFileHandle, FileInfo, SeekMode, Supports, SyncFileHandle,
};
use core_async::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::metadata::file_info;

fn seek_from(offset: i64, whence: SeekMode) -> std::io::Result<SeekFrom> {
    Ok(match whence {
        SeekMode::Start => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "cannot seek to a negative offset",
            )
        })?),
        SeekMode::Current => SeekFrom::Current(offset),
        SeekMode::End => SeekFrom::End(offset),
    })
}

/// Advisory lock held on a duplicate descriptor. `flock` locks belong to the
/// open file description, so the duplicate locks the handle's file too.
#[cfg(unix)]
type FileLock = nix::fcntl::Flock<File>;

#[cfg(unix)]
fn lock_file(file: File, exclusive: bool) -> std::io::Result<FileLock> {
    use nix::fcntl::{Flock, FlockArg};

    let arg = if exclusive {
        FlockArg::LockExclusive
    } else {
        FlockArg::LockShared
    };
    Flock::lock(file, arg).map_err(|(_, errno)| errno.into())
}

#[cfg(unix)]
fn unlock_file(lock: FileLock) -> std::io::Result<()> {
    lock.unlock().map(drop).map_err(|(_, errno)| errno.into())
}

/// Blocking handle over `std::fs::File`.
pub struct StdFileHandle {
    file: File,
    path: PathBuf,
    supports: Supports,
    #[cfg(unix)]
    lock: Option<FileLock>,
}

impl StdFileHandle {
    pub fn new(file: File, path: PathBuf, supports: Supports) -> Self {
        Self {
            file,
            path,
            supports,
            #[cfg(unix)]
            lock: None,
        }
    }
}

impl SyncFileHandle for StdFileHandle {
    fn supports(&self) -> Supports {
        self.supports
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let n = self.file.read(buf)?;
        Ok((n > 0 || buf.is_empty()).then_some(n))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.file.write(data)?)
    }

    fn seek(&mut self, offset: i64, whence: SeekMode) -> Result<u64> {
        Ok(self.file.seek(seek_from(offset, whence)?)?)
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    #[cfg(unix)]
    fn lock(&mut self, exclusive: bool) -> Result<()> {
        if let Some(held) = self.lock.take() {
            unlock_file(held)?;
        }
        self.lock = Some(lock_file(self.file.try_clone()?, exclusive)?);
        debug!(path = ?self.path, exclusive, "Locked file");
        Ok(())
    }

    #[cfg(unix)]
    fn unlock(&mut self) -> Result<()> {
        if let Some(held) = self.lock.take() {
            unlock_file(held)?;
        }
        Ok(())
    }

    fn stat(&mut self) -> Result<FileInfo> {
        let metadata = self.file.metadata()?;
        Ok(file_info(&self.path, &metadata))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.file.flush()?;
        debug!(path = ?self.path, "Closed file");
        Ok(())
    }
}

/// Async handle over `tokio::fs::File`.
pub struct TokioFileHandle {
    file: core_async::fs::File,
    path: PathBuf,
    supports: Supports,
    #[cfg(unix)]
    lock: Option<FileLock>,
}

impl TokioFileHandle {
    pub fn new(file: core_async::fs::File, path: PathBuf, supports: Supports) -> Self {
        Self {
            file,
            path,
            supports,
            #[cfg(unix)]
            lock: None,
        }
    }

    /// `tokio::fs::File` defers to the blocking pool, which only exists
    /// inside a runtime.
    fn runtime_check(&self) -> Result<()> {
        if core_async::runtime::has_ambient_runtime() {
            Ok(())
        } else {
            Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} used outside a Tokio runtime", self.path.display()),
            )))
        }
    }

    /// Releases the held lock on the blocking pool.
    #[cfg(unix)]
    async fn release_lock(&mut self) -> Result<()> {
        if let Some(held) = self.lock.take() {
            core_async::task::run_blocking(move || unlock_file(held)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncFileHandle for TokioFileHandle {
    fn supports(&self) -> Supports {
        self.supports
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.runtime_check()?;
        let n = self.file.read(buf).await?;
        Ok((n > 0 || buf.is_empty()).then_some(n))
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.runtime_check()?;
        Ok(self.file.write(data).await?)
    }

    async fn seek(&mut self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.runtime_check()?;
        Ok(self.file.seek(seek_from(offset, whence)?).await?)
    }

    async fn truncate(&mut self, len: u64) -> Result<()> {
        self.runtime_check()?;
        self.file.set_len(len).await?;
        Ok(())
    }

    #[cfg(unix)]
    async fn lock(&mut self, exclusive: bool) -> Result<()> {
        self.runtime_check()?;
        self.release_lock().await?;
        let dup = self.file.try_clone().await?.into_std().await;
        let held = core_async::task::run_blocking(move || lock_file(dup, exclusive)).await?;
        self.lock = Some(held);
        debug!(path = ?self.path, exclusive, "Locked file");
        Ok(())
    }

    #[cfg(unix)]
    async fn unlock(&mut self) -> Result<()> {
        self.runtime_check()?;
        self.release_lock().await
    }

    async fn stat(&mut self) -> Result<FileInfo> {
        self.runtime_check()?;
        let metadata = self.file.metadata().await?;
        Ok(file_info(&self.path, &metadata))
    }

    async fn flush(&mut self) -> Result<()> {
        self.runtime_check()?;
        self.file.flush().await?;
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.runtime_check()?;
        self.file.flush().await?;
        debug!(path = ?self.path, "Closed file");
        Ok(())
    }
}
