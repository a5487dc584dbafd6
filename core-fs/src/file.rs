//! Open-file wrappers.
//!
//! [`FsFile`] and [`AsyncFsFile`] own a backend handle and enforce two rules
//! the backends don't have to: a closed handle rejects every call with
//! [`FsError::Closed`], and a capability the handle did not report is
//! rejected with [`FsError::Unsupported`] before the backend is touched.

use std::path::{Path, PathBuf};

use bridge_traits::{AsyncFileHandle, FileInfo, FsSupports, SeekMode, Supports, SyncFileHandle};
use tracing::debug;

use crate::error::{FsError, Result};

fn require(supports: Supports, cap: FsSupports) -> Result<()> {
    if supports.contains(cap) {
        Ok(())
    } else {
        Err(FsError::unsupported(cap.name()))
    }
}

/// Blocking open file.
pub struct FsFile {
    path: PathBuf,
    supports: Supports,
    handle: Option<Box<dyn SyncFileHandle>>,
}

impl FsFile {
    pub(crate) fn new(path: PathBuf, handle: Box<dyn SyncFileHandle>) -> Self {
        Self {
            path,
            supports: handle.supports(),
            handle: Some(handle),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capabilities fixed when the file was opened.
    pub fn supports(&self) -> Supports {
        self.supports
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    fn handle(&mut self) -> Result<&mut Box<dyn SyncFileHandle>> {
        self.handle.as_mut().ok_or(FsError::Closed)
    }

    fn checked(&mut self, cap: FsSupports) -> Result<&mut Box<dyn SyncFileHandle>> {
        let supports = self.supports;
        let handle = self.handle()?;
        require(supports, cap)?;
        Ok(handle)
    }

    /// Reads into `buf`; `Ok(None)` at end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.checked(FsSupports::Read)?.read(buf)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.checked(FsSupports::Write)?.write(data)
    }

    /// Writes all of `data`, looping over short writes.
    pub fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let written = self.write(data)?;
            if written == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            data = &data[written..];
        }
        Ok(())
    }

    /// Reads the remainder of the file.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        while let Some(n) = self.read(&mut buf)? {
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out)
    }

    pub fn seek(&mut self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.checked(FsSupports::Seek)?.seek(offset, whence)
    }

    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.checked(FsSupports::Truncate)?.truncate(len)
    }

    pub fn lock(&mut self, exclusive: bool) -> Result<()> {
        self.checked(FsSupports::Lock)?.lock(exclusive)
    }

    pub fn unlock(&mut self) -> Result<()> {
        self.checked(FsSupports::Lock)?.unlock()
    }

    pub fn stat(&mut self) -> Result<FileInfo> {
        self.handle()?.stat()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.handle()?.flush()
    }

    /// Releases the handle. A second call fails with [`FsError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(FsError::Closed)?;
        handle.close()
    }
}

impl Drop for FsFile {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(path = ?self.path, "Releasing unclosed file handle");
            if let Err(e) = handle.close() {
                debug!(path = ?self.path, error = %e, "Failed to release file handle");
            }
        }
    }
}

impl std::fmt::Debug for FsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsFile")
            .field("path", &self.path)
            .field("supports", &self.supports)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Non-blocking open file. Same rules as [`FsFile`].
///
/// Dropping without [`close`](Self::close) releases the native handle
/// synchronously; an async backend's own close step is skipped in that case.
pub struct AsyncFsFile {
    path: PathBuf,
    supports: Supports,
    handle: Option<Box<dyn AsyncFileHandle>>,
}

impl AsyncFsFile {
    pub(crate) fn new(path: PathBuf, handle: Box<dyn AsyncFileHandle>) -> Self {
        Self {
            path,
            supports: handle.supports(),
            handle: Some(handle),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn supports(&self) -> Supports {
        self.supports
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    fn handle(&mut self) -> Result<&mut Box<dyn AsyncFileHandle>> {
        self.handle.as_mut().ok_or(FsError::Closed)
    }

    fn checked(&mut self, cap: FsSupports) -> Result<&mut Box<dyn AsyncFileHandle>> {
        let supports = self.supports;
        let handle = self.handle()?;
        require(supports, cap)?;
        Ok(handle)
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.checked(FsSupports::Read)?.read(buf).await
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.checked(FsSupports::Write)?.write(data).await
    }

    pub async fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let written = self.write(data).await?;
            if written == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            data = &data[written..];
        }
        Ok(())
    }

    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        while let Some(n) = self.read(&mut buf).await? {
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out)
    }

    pub async fn seek(&mut self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.checked(FsSupports::Seek)?.seek(offset, whence).await
    }

    pub async fn truncate(&mut self, len: u64) -> Result<()> {
        self.checked(FsSupports::Truncate)?.truncate(len).await
    }

    pub async fn lock(&mut self, exclusive: bool) -> Result<()> {
        self.checked(FsSupports::Lock)?.lock(exclusive).await
    }

    pub async fn unlock(&mut self) -> Result<()> {
        self.checked(FsSupports::Lock)?.unlock().await
    }

    pub async fn stat(&mut self) -> Result<FileInfo> {
        self.handle()?.stat().await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.handle()?.flush().await
    }

    pub async fn close(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(FsError::Closed)?;
        handle.close().await
    }
}

impl Drop for AsyncFsFile {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            debug!(path = ?self.path, "Dropped unclosed async file handle");
        }
    }
}

impl std::fmt::Debug for AsyncFsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFsFile")
            .field("path", &self.path)
            .field("supports", &self.supports)
            .field("closed", &self.is_closed())
            .finish()
    }
}
