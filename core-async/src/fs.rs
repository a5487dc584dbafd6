//! Async filesystem helpers re-exported from the underlying runtime.
//!
//! The names match Tokio's `fs` module so backends read like ordinary Tokio
//! code without naming Tokio directly.

pub use tokio::fs::{
    canonicalize, copy, create_dir_all, hard_link, metadata, read, read_dir, read_link,
    remove_dir_all, rename, symlink_metadata, DirBuilder, File, OpenOptions,
};
