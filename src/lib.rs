//! Workspace entry crate.
//!
//! Re-exports the dispatcher from `core-fs` together with the backend contract
//! from `bridge-traits`, so host applications can depend on `polyfs` alone.
//! The `native` feature (on by default) also exposes the std/Tokio backends.
//!
//! ```ignore
//! let fs = polyfs::fs();
//! fs.write_text_file_sync("hello.txt", "hi", &Default::default())?;
//! ```

pub use core_fs::*;

pub use bridge_traits as traits;

#[cfg(feature = "native")]
pub use bridge_native as native;
