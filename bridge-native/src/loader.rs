//! Loaders for the native backends.
//!
//! Mirrors the two ways a host can offer filesystem access: the builtin
//! loader hands out the Tokio table only when an executor is already
//! running; the legacy loader always succeeds, with async calls run inline.

use std::sync::Arc;

use bridge_traits::{AsyncBackend, BackendLoader, SyncBackend};
use tracing::debug;

use crate::inline::InlineBackend;
use crate::std_backend::StdBackend;
use crate::tokio_backend::TokioBackend;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLoader;

impl BackendLoader for BuiltinLoader {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn load_sync(&self) -> Option<Arc<dyn SyncBackend>> {
        Some(Arc::new(StdBackend::new()))
    }

    fn load_async(&self) -> Option<Arc<dyn AsyncBackend>> {
        if core_async::runtime::has_ambient_runtime() {
            Some(Arc::new(TokioBackend::new()))
        } else {
            debug!("No ambient Tokio runtime; builtin async table unavailable");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyLoader;

impl BackendLoader for LegacyLoader {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn load_sync(&self) -> Option<Arc<dyn SyncBackend>> {
        Some(Arc::new(StdBackend::new()))
    }

    fn load_async(&self) -> Option<Arc<dyn AsyncBackend>> {
        Some(Arc::new(InlineBackend::new()))
    }
}

/// Loaders in the order the registry should try them.
pub fn default_loaders() -> Vec<Arc<dyn BackendLoader>> {
    vec![Arc::new(BuiltinLoader), Arc::new(LegacyLoader)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::Backend;

    #[test]
    fn test_builtin_async_requires_runtime() {
        assert!(BuiltinLoader.load_async().is_none());
        assert_eq!(BuiltinLoader.load_sync().unwrap().name(), "std");
    }

    #[tokio::test]
    async fn test_builtin_async_inside_runtime() {
        assert_eq!(BuiltinLoader.load_async().unwrap().name(), "tokio");
    }

    #[test]
    fn test_legacy_always_loads() {
        assert_eq!(LegacyLoader.load_async().unwrap().name(), "inline");
        let names: Vec<_> = default_loaders().iter().map(|l| l.name()).collect();
        assert_eq!(names, ["builtin", "legacy"]);
    }
}
