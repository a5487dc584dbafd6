//! # Core Filesystem Module
//!
//! One filesystem API over whatever backends the host provides:
//! - Capability registry and per-operation dispatch
//! - Open-file handles with capability checks
//! - Lazy directory walks and glob expansion
//! - Compound operations (ensure, empty, copy, move, temp)
//!
//! ## Overview
//!
//! Everything hangs off an [`Fs`] context. Each operation, sync or async, is
//! bound to a backend on first use and keeps that binding for the life of
//! the context. A primary runtime, when installed, serves every operation
//! directly. When nothing can serve an operation the call fails with
//! [`FsError::NoBackend`].
//!
//! ```ignore
//! use core_fs::{fs, ReadOptions};
//!
//! let text = fs().read_text_file_sync("Cargo.toml", &ReadOptions::default())?;
//! ```

pub mod config;
pub mod copy;
pub mod dispatch;
pub mod ensure;
pub mod error;
pub mod file;
pub mod glob;
pub mod logging;
pub mod query;
pub mod registry;
pub mod temp;
pub mod walk;

pub use config::{FsConfig, FsConfigBuilder};
pub use copy::{CopyOptions, MoveOptions};
pub use dispatch::{fs, Fs};
pub use error::{is_already_exists_error, is_not_found_error, ConfigError, FsError, Result};
pub use file::{AsyncFsFile, FsFile};
pub use glob::ExpandGlobOptions;
pub use registry::{install_primary_runtime, installed_primary_runtime, CapabilityRegistry};
pub use walk::{Pattern, WalkIter, WalkOptions};

pub use bridge_traits::{
    AbortController, AbortSignal, CreateDirectoryOptions, DirectoryInfo, ExistsOptions, FileInfo,
    FsSupports, MakeTempOptions, Op, OpenOptions, ReadOptions, RemoveOptions, SeekMode,
    SymlinkOptions, SymlinkType, Supports, WalkEntry, WriteOptions,
};
