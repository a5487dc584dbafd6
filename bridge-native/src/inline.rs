//! Async table that runs std calls in place.
//!
//! Used where no async executor is guaranteed to be driving the caller. The
//! futures it returns complete on first poll, so any executor (or a plain
//! `block_on`) can drive them.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::SystemTime;

use async_trait::async_trait;
use bridge_traits::{
    error::Result, AsyncBackend, AsyncFileHandle, Backend, CreateDirectoryOptions,
    DirectoryInfo, FileInfo, OpenOptions, ReadOptions, RemoveOptions, SeekMode, Supports,
    SymlinkOptions, SyncBackend, SyncFileHandle, WriteOptions, WriteStream,
};
use bytes::Bytes;
use core_async::io::AsyncWrite;

use crate::std_backend::{std_write_options, StdBackend};

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineBackend {
    inner: StdBackend,
}

impl InlineBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for InlineBackend {
    fn name(&self) -> &'static str {
        "inline"
    }
}

#[async_trait]
impl AsyncBackend for InlineBackend {
    async fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        self.inner.chmod(path, mode)
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        self.inner.chown(path, uid, gid)
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy_file(from, to)
    }

    async fn link(&self, existing: &Path, new: &Path) -> Result<()> {
        self.inner.link(existing, new)
    }

    async fn lstat(&self, path: &Path) -> Result<FileInfo> {
        self.inner.lstat(path)
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        self.inner.stat(path)
    }

    async fn make_dir(&self, path: &Path, options: &CreateDirectoryOptions) -> Result<()> {
        self.inner.make_dir(path, options)
    }

    async fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn AsyncFileHandle>> {
        let handle = self.inner.open(path, options)?;
        Ok(Box::new(InlineFileHandle { inner: handle }))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryInfo>> {
        self.inner.read_dir(path)
    }

    async fn read_file(&self, path: &Path, _options: &ReadOptions) -> Result<Bytes> {
        self.inner.read_file(path)
    }

    async fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.inner.read_link(path)
    }

    async fn real_path(&self, path: &Path) -> Result<PathBuf> {
        self.inner.real_path(path)
    }

    async fn remove(&self, path: &Path, options: &RemoveOptions) -> Result<()> {
        self.inner.remove(path, options)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.rename(from, to)
    }

    async fn symlink(&self, target: &Path, path: &Path, options: &SymlinkOptions) -> Result<()> {
        self.inner.symlink(target, path, options)
    }

    async fn utime(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
        self.inner.utime(path, atime, mtime)
    }

    async fn write_file(&self, path: &Path, data: &[u8], options: &WriteOptions) -> Result<()> {
        self.inner.write_file(path, data, options)
    }

    async fn open_write_stream(&self, path: &Path, options: &WriteOptions) -> Result<WriteStream> {
        let file = std_write_options(options).open(path)?;
        Ok(Box::new(InlineWriter { file }))
    }
}

struct InlineFileHandle {
    inner: Box<dyn SyncFileHandle>,
}

#[async_trait]
impl AsyncFileHandle for InlineFileHandle {
    fn supports(&self) -> Supports {
        self.inner.supports()
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.inner.read(buf)
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.inner.write(data)
    }

    async fn seek(&mut self, offset: i64, whence: SeekMode) -> Result<u64> {
        self.inner.seek(offset, whence)
    }

    async fn truncate(&mut self, len: u64) -> Result<()> {
        self.inner.truncate(len)
    }

    async fn lock(&mut self, exclusive: bool) -> Result<()> {
        self.inner.lock(exclusive)
    }

    async fn unlock(&mut self) -> Result<()> {
        self.inner.unlock()
    }

    async fn stat(&mut self) -> Result<FileInfo> {
        self.inner.stat()
    }

    async fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.inner.close()
    }
}

/// `AsyncWrite` over a blocking file; every poll completes immediately.
struct InlineWriter {
    file: std::fs::File,
}

impl AsyncWrite for InlineWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(self.file.write(buf))
    }

    fn poll_flush(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(self.file.flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.poll_flush(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::io::AsyncWriteExt;

    #[test]
    fn test_inline_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inline.txt");
        let backend = InlineBackend::new();

        core_async::runtime::block_on(async {
            backend
                .write_text_file(&path, "inline", &WriteOptions::default())
                .await
                .unwrap();
            let text = backend
                .read_text_file(&path, &ReadOptions::default())
                .await
                .unwrap();
            assert_eq!(text, "inline");

            let mut writer = backend
                .open_write_stream(&path, &WriteOptions::append())
                .await
                .unwrap();
            writer.write_all(b"!").await.unwrap();
            writer.shutdown().await.unwrap();
        });

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "inline!");
    }
}
