//! Open-file handles produced by backends.
//!
//! A handle reports the capabilities it actually offers through
//! [`supports`](SyncFileHandle::supports). Optional operations default to
//! [`FsError::Unsupported`] so a backend only writes what it can do.

use async_trait::async_trait;

use crate::error::{FsError, Result};
use crate::types::{FileInfo, SeekMode, Supports};

pub trait SyncFileHandle: Send {
    fn supports(&self) -> Supports;

    /// Reads into `buf`. `None` signals end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    fn write(&mut self, data: &[u8]) -> Result<usize>;

    fn seek(&mut self, _offset: i64, _whence: SeekMode) -> Result<u64> {
        Err(FsError::unsupported("seek"))
    }

    fn truncate(&mut self, _len: u64) -> Result<()> {
        Err(FsError::unsupported("truncate"))
    }

    fn lock(&mut self, _exclusive: bool) -> Result<()> {
        Err(FsError::unsupported("lock"))
    }

    fn unlock(&mut self) -> Result<()> {
        Err(FsError::unsupported("unlock"))
    }

    fn stat(&mut self) -> Result<FileInfo>;

    fn flush(&mut self) -> Result<()>;

    /// Releases the native handle.
    fn close(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait AsyncFileHandle: Send {
    fn supports(&self) -> Supports;

    async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    async fn seek(&mut self, _offset: i64, _whence: SeekMode) -> Result<u64> {
        Err(FsError::unsupported("seek"))
    }

    async fn truncate(&mut self, _len: u64) -> Result<()> {
        Err(FsError::unsupported("truncate"))
    }

    async fn lock(&mut self, _exclusive: bool) -> Result<()> {
        Err(FsError::unsupported("lock"))
    }

    async fn unlock(&mut self) -> Result<()> {
        Err(FsError::unsupported("unlock"))
    }

    async fn stat(&mut self) -> Result<FileInfo>;

    async fn flush(&mut self) -> Result<()>;

    async fn close(self: Box<Self>) -> Result<()>;
}
