//! Cancellation.
//!
//! `CancellationToken` backs the abort signals threaded through filesystem
//! calls.
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let child = token.child_token();
//! token.cancel();
//! assert!(child.is_cancelled());
//! ```

pub use tokio_util::sync::CancellationToken;
