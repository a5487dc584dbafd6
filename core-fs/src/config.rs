//! # Filesystem Configuration
//!
//! Builder for [`FsConfig`], the settings an [`Fs`](crate::Fs) context is
//! created from. Validation is fail-fast: `build()` rejects settings the
//! dispatcher could not honor.
//!
//! ## Defaults
//!
//! - primary runtime: the one installed with
//!   [`install_primary_runtime`](crate::install_primary_runtime), if any
//! - loaders: `builtin` then `legacy` (with the `native` feature)
//! - platform: `std::env::consts::OS`
//! - temp name length: 12 random characters
//!
//! ## Usage
//!
//! ```ignore
//! use core_fs::{Fs, FsConfig};
//!
//! let config = FsConfig::builder()
//!     .detect_primary_runtime(false)
//!     .temp_name_length(16)
//!     .build()?;
//! let fs = Fs::new(config);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bridge_traits::{BackendLoader, Runtime};

use crate::error::ConfigError;
use crate::registry::installed_primary_runtime;

pub const DEFAULT_TEMP_NAME_LENGTH: usize = 12;
pub const MAX_TEMP_NAME_LENGTH: usize = 64;

#[derive(Clone)]
pub struct FsConfig {
    /// Runtime that serves every operation when present.
    pub primary: Option<Arc<dyn Runtime>>,
    /// Loaders in priority order.
    pub loaders: Vec<Arc<dyn BackendLoader>>,
    /// Platform string used for Windows detection.
    pub platform: String,
    /// Length of the random part of fallback temp names.
    pub temp_name_length: usize,
    /// Overrides the `TEMP`/`TMPDIR` lookup for fallback temp creation.
    pub temp_root: Option<PathBuf>,
}

impl FsConfig {
    pub fn builder() -> FsConfigBuilder {
        FsConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Platform string cannot be empty".to_string(),
            ));
        }

        if self.temp_name_length == 0 || self.temp_name_length > MAX_TEMP_NAME_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "Temp name length must be between 1 and {MAX_TEMP_NAME_LENGTH}, got {}",
                self.temp_name_length
            )));
        }

        if let Some(root) = &self.temp_root {
            if !root.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "Temp root must be an absolute path: {}",
                    root.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            primary: installed_primary_runtime(),
            loaders: default_loaders(),
            platform: std::env::consts::OS.to_string(),
            temp_name_length: DEFAULT_TEMP_NAME_LENGTH,
            temp_root: None,
        }
    }
}

impl fmt::Debug for FsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaders: Vec<_> = self.loaders.iter().map(|l| l.name()).collect();
        f.debug_struct("FsConfig")
            .field("primary", &self.primary.as_ref().map(|p| p.as_ref().name()))
            .field("loaders", &loaders)
            .field("platform", &self.platform)
            .field("temp_name_length", &self.temp_name_length)
            .field("temp_root", &self.temp_root)
            .finish()
    }
}

#[cfg(feature = "native")]
fn default_loaders() -> Vec<Arc<dyn BackendLoader>> {
    bridge_native::default_loaders()
}

#[cfg(not(feature = "native"))]
fn default_loaders() -> Vec<Arc<dyn BackendLoader>> {
    Vec::new()
}

pub struct FsConfigBuilder {
    primary: Option<Arc<dyn Runtime>>,
    detect_primary: bool,
    loaders: Option<Vec<Arc<dyn BackendLoader>>>,
    platform: Option<String>,
    temp_name_length: usize,
    temp_root: Option<PathBuf>,
}

impl Default for FsConfigBuilder {
    fn default() -> Self {
        Self {
            primary: None,
            detect_primary: true,
            loaders: None,
            platform: None,
            temp_name_length: DEFAULT_TEMP_NAME_LENGTH,
            temp_root: None,
        }
    }
}

impl FsConfigBuilder {
    /// Inject a primary runtime, bypassing loader probing.
    pub fn primary_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.primary = Some(runtime);
        self
    }

    /// Whether to pick up the process-wide primary runtime when none is
    /// injected. Defaults to `true`.
    pub fn detect_primary_runtime(mut self, detect: bool) -> Self {
        self.detect_primary = detect;
        self
    }

    /// Append a loader after any already configured.
    pub fn loader(mut self, loader: Arc<dyn BackendLoader>) -> Self {
        self.loaders.get_or_insert_with(Vec::new).push(loader);
        self
    }

    /// Replace the loader list. An empty list leaves only the primary
    /// runtime, if any.
    pub fn loaders(mut self, loaders: Vec<Arc<dyn BackendLoader>>) -> Self {
        self.loaders = Some(loaders);
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn temp_name_length(mut self, length: usize) -> Self {
        self.temp_name_length = length;
        self
    }

    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn build(self) -> Result<FsConfig, ConfigError> {
        let primary = match self.primary {
            Some(runtime) => Some(runtime),
            None if self.detect_primary => installed_primary_runtime(),
            None => None,
        };

        let config = FsConfig {
            primary,
            loaders: self.loaders.unwrap_or_else(default_loaders),
            platform: self
                .platform
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
            temp_name_length: self.temp_name_length,
            temp_root: self.temp_root,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FsConfig::builder()
            .detect_primary_runtime(false)
            .build()
            .unwrap();
        assert!(config.primary.is_none());
        assert_eq!(config.temp_name_length, DEFAULT_TEMP_NAME_LENGTH);
        assert_eq!(config.platform, std::env::consts::OS);

        #[cfg(feature = "native")]
        {
            let names: Vec<_> = config.loaders.iter().map(|l| l.name()).collect();
            assert_eq!(names, ["builtin", "legacy"]);
        }
    }

    #[test]
    fn test_empty_loader_list_is_kept() {
        let config = FsConfig::builder()
            .detect_primary_runtime(false)
            .loaders(Vec::new())
            .build()
            .unwrap();
        assert!(config.loaders.is_empty());
    }

    #[test]
    fn test_rejects_zero_temp_length() {
        let err = FsConfig::builder().temp_name_length(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_oversized_temp_length() {
        assert!(FsConfig::builder()
            .temp_name_length(MAX_TEMP_NAME_LENGTH + 1)
            .build()
            .is_err());
    }

    #[test]
    fn test_rejects_relative_temp_root() {
        let err = FsConfig::builder()
            .temp_root("relative/tmp")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_rejects_blank_platform() {
        assert!(FsConfig::builder().platform("  ").build().is_err());
    }

    #[test]
    fn test_debug_lists_loader_names() {
        let config = FsConfig::builder()
            .detect_primary_runtime(false)
            .loaders(Vec::new())
            .platform("linux")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("platform: \"linux\""));
        assert!(rendered.contains("loaders: []"));
    }
}
