//! Runtime-agnostic async layer for polyfs.
//!
//! Backends and the dispatcher reach the executor only through this crate, so
//! the choice of Tokio stays in one place. The surface is deliberately small:
//!
//! - `fs`: async filesystem calls
//! - `io`: async read/write traits
//! - `runtime`: blocking entry points and ambient runtime detection
//! - `sync`: cancellation tokens
//! - `task`: blocking-pool offload
//!
//! # Examples
//!
//! ```rust
//! use core_async::{runtime, task};
//!
//! let answer = runtime::block_on(async {
//!     task::spawn_blocking(|| 40 + 2).await.unwrap()
//! });
//! assert_eq!(answer, 42);
//! ```

pub mod fs;
pub mod io;
pub mod runtime;
pub mod sync;
pub mod task;

pub use task::spawn_blocking;
