//! # Filesystem Bridge Traits
//!
//! The contract between the polyfs dispatcher and the filesystem backends a
//! host can provide.
//!
//! ## Overview
//!
//! A backend is an operation table ([`SyncBackend`] or [`AsyncBackend`]).
//! Tables are produced by a [`BackendLoader`], and the dispatcher in
//! `core-fs` binds each operation to the first table able to serve it. A
//! type implementing both tables is a [`Runtime`] and may be installed as the
//! primary runtime, which bypasses loader probing entirely.
//!
//! | Backend | Crate | Tables |
//! |---------|-------|--------|
//! | std     | `bridge-native` | sync |
//! | tokio   | `bridge-native` | async (needs an ambient runtime) |
//! | inline  | `bridge-native` | async over std |
//! | native  | `bridge-native` | primary runtime |
//!
//! ## Error Handling
//!
//! All operations return [`FsError`]. Native failures pass through as
//! [`FsError::Io`] with their OS error code intact. Use
//! [`FsError::is_not_found`] / [`FsError::is_already_exists`] instead of
//! matching variants, since primary runtimes may report the same condition
//! through their own variant.
//!
//! ## Thread Safety
//!
//! Backends and loaders are `Send + Sync` and shared behind `Arc`. File
//! handles are `Send` and exclusively owned.

pub mod backend;
pub mod error;
pub mod handle;
pub mod options;
pub mod signal;
pub mod types;

pub use backend::{AsyncBackend, Backend, BackendLoader, Op, Runtime, SyncBackend, WriteStream};
pub use error::{FsError, Result};
pub use handle::{AsyncFileHandle, SyncFileHandle};
pub use options::{
    CreateDirectoryOptions, ExistsOptions, MakeTempOptions, OpenOptions, ReadOptions,
    RemoveOptions, SymlinkOptions, WriteOptions,
};
pub use signal::{AbortController, AbortSignal};
pub use types::{
    DirectoryInfo, FileInfo, FsSupports, SeekMode, Supports, SymlinkType, WalkEntry,
};
