//! Async I/O traits.
//!
//! Write streams handed out by the async backends are
//! `AsyncWrite + Send + Unpin` trait objects.

pub use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
