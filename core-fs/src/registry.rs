//! Runtime capability registry.
//!
//! Answers two questions for the dispatcher: is a primary runtime present,
//! and which loaded table can serve a given operation. Nothing here is
//! cached except the platform check; per-operation memoization lives in
//! [`Fs`](crate::Fs).

use std::fmt;
use std::sync::{Arc, OnceLock};

use bridge_traits::{AsyncBackend, BackendLoader, Op, Runtime, SyncBackend};
use tracing::debug;

use crate::config::FsConfig;

static PRIMARY_RUNTIME: OnceLock<Arc<dyn Runtime>> = OnceLock::new();

/// Install the process-wide primary runtime.
///
/// Only the first call takes effect; later calls return `false`. Contexts
/// created afterwards with default configuration pick it up.
pub fn install_primary_runtime(runtime: Arc<dyn Runtime>) -> bool {
    let name = runtime.as_ref().name();
    let installed = PRIMARY_RUNTIME.set(runtime).is_ok();
    if installed {
        debug!(runtime = name, "Installed primary runtime");
    }
    installed
}

pub fn installed_primary_runtime() -> Option<Arc<dyn Runtime>> {
    PRIMARY_RUNTIME.get().cloned()
}

/// Both tables of a primary runtime, split once at construction.
#[derive(Clone)]
pub(crate) struct PrimaryRuntime {
    pub(crate) name: &'static str,
    pub(crate) sync: Arc<dyn SyncBackend>,
    pub(crate) async_: Arc<dyn AsyncBackend>,
}

impl PrimaryRuntime {
    fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            name: runtime.as_ref().name(),
            sync: runtime.clone().as_sync(),
            async_: runtime.as_async(),
        }
    }
}

pub struct CapabilityRegistry {
    primary: Option<PrimaryRuntime>,
    loaders: Vec<Arc<dyn BackendLoader>>,
    platform: String,
    windows: OnceLock<bool>,
}

impl CapabilityRegistry {
    pub fn new(
        primary: Option<Arc<dyn Runtime>>,
        loaders: Vec<Arc<dyn BackendLoader>>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            primary: primary.map(PrimaryRuntime::new),
            loaders,
            platform: platform.into(),
            windows: OnceLock::new(),
        }
    }

    pub fn from_config(config: &FsConfig) -> Self {
        Self::new(
            config.primary.clone(),
            config.loaders.clone(),
            config.platform.clone(),
        )
    }

    pub fn is_primary_runtime_available(&self) -> bool {
        self.primary.is_some()
    }

    pub fn primary_runtime_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|p| p.name)
    }

    pub(crate) fn primary(&self) -> Option<&PrimaryRuntime> {
        self.primary.as_ref()
    }

    /// Derived once from the configured platform string.
    pub fn is_windows_platform(&self) -> bool {
        *self.windows.get_or_init(|| is_windows(&self.platform))
    }

    pub fn loader_names(&self) -> Vec<&'static str> {
        self.loaders.iter().map(|l| l.name()).collect()
    }

    /// First sync table any loader produces.
    pub fn load_sync_backend(&self) -> Option<Arc<dyn SyncBackend>> {
        self.loaders.iter().find_map(|loader| loader.load_sync())
    }

    /// First async table any loader produces.
    pub fn load_async_backend(&self) -> Option<Arc<dyn AsyncBackend>> {
        self.loaders.iter().find_map(|loader| loader.load_async())
    }

    /// First loaded sync table that provides `op`. Loaders after the match
    /// are not consulted.
    pub fn resolve_sync(&self, op: Op) -> Option<Arc<dyn SyncBackend>> {
        self.loaders
            .iter()
            .filter_map(|loader| loader.load_sync())
            .find(|backend| backend.provides(op))
    }

    pub fn resolve_async(&self, op: Op) -> Option<Arc<dyn AsyncBackend>> {
        self.loaders
            .iter()
            .filter_map(|loader| loader.load_async())
            .find(|backend| backend.provides(op))
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("primary", &self.primary_runtime_name())
            .field("loaders", &self.loader_names())
            .field("platform", &self.platform)
            .finish()
    }
}

fn is_windows(platform: &str) -> bool {
    platform.eq_ignore_ascii_case("windows") || platform.contains("Windows")
}
