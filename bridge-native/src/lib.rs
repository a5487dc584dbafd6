//! Native Bridge Implementations
//!
//! Filesystem backends for desktop and server targets.
//!
//! ## Backends
//!
//! - `StdBackend` - Blocking table over `std::fs`
//! - `TokioBackend` - Async table over `tokio::fs`
//! - `InlineBackend` - Async table running std calls in place
//! - `NativeRuntime` - Primary runtime combining std and Tokio, with native
//!   temp file creation
//!
//! ## Loaders
//!
//! `BuiltinLoader` and `LegacyLoader`, tried in that order by
//! [`default_loaders`].
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::NativeRuntime;
//! use std::sync::Arc;
//!
//! core_fs::install_primary_runtime(Arc::new(NativeRuntime::new()));
//! ```

pub mod handle;
pub mod inline;
pub mod loader;
pub mod metadata;
pub mod runtime;
pub mod std_backend;
pub mod tokio_backend;

pub use handle::{StdFileHandle, TokioFileHandle};
pub use inline::InlineBackend;
pub use loader::{default_loaders, BuiltinLoader, LegacyLoader};
pub use metadata::file_info;
pub use runtime::NativeRuntime;
pub use std_backend::StdBackend;
pub use tokio_backend::TokioBackend;
