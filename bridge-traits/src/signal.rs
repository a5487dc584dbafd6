//! Cooperative cancellation for filesystem calls.
//!
//! An [`AbortController`] owns the cancellation; the [`AbortSignal`] it hands
//! out is cheap to clone and is what option records carry.

use core_async::sync::CancellationToken;

use crate::error::{FsError, Result};

#[derive(Debug, Clone, Default)]
pub struct AbortController {
    token: CancellationToken,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    pub fn abort(&self) {
        self.token.cancel();
    }
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// A signal that is already aborted.
    pub fn aborted_signal() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn throw_if_aborted(&self) -> Result<()> {
        if self.is_aborted() {
            Err(FsError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Resolves once the signal is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

/// Fails with [`FsError::Aborted`] when `signal` is present and aborted.
pub fn check(signal: Option<&AbortSignal>) -> Result<()> {
    match signal {
        Some(signal) => signal.throw_if_aborted(),
        None => Ok(()),
    }
}
