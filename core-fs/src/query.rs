//! Existence and kind checks. These answer `false` rather than failing on a
//! missing path.

use std::path::Path;

use bridge_traits::{ExistsOptions, FileInfo, OpenOptions};

use crate::dispatch::Fs;
use crate::error::{invalid_input, Result};

fn validate(options: &ExistsOptions) -> Result<()> {
    if options.is_directory && options.is_file {
        return Err(invalid_input(
            "ExistsOptions.is_directory and ExistsOptions.is_file must not both be set",
        ));
    }
    Ok(())
}

/// Whether `info` has the kind `options` asks for.
fn kind_matches(info: &FileInfo, options: &ExistsOptions) -> bool {
    (!options.is_directory || info.is_directory) && (!options.is_file || info.is_file)
}

/// Folds a readability probe into the answer. Permission failures mean
/// "not readable"; anything else propagates.
fn readable(probe: Result<()>) -> Result<bool> {
    match probe {
        Ok(()) => Ok(true),
        Err(err) if err.is_permission_denied() || err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

impl Fs {
    /// Whether `path` exists and satisfies `options`. Setting both
    /// `is_directory` and `is_file` is an `InvalidInput` error.
    pub async fn exists(&self, path: impl AsRef<Path>, options: &ExistsOptions) -> Result<bool> {
        validate(options)?;
        let path = path.as_ref();
        let info = match self.stat(path).await {
            Ok(info) => info,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        if !kind_matches(&info, options) {
            return Ok(false);
        }
        if !options.is_readable {
            return Ok(true);
        }

        let probe = if info.is_directory {
            self.read_dir(path).await.map(drop)
        } else {
            match self.open(path, &OpenOptions::default()).await {
                Ok(mut file) => file.close().await,
                Err(err) => Err(err),
            }
        };
        readable(probe)
    }

    pub fn exists_sync(&self, path: impl AsRef<Path>, options: &ExistsOptions) -> Result<bool> {
        validate(options)?;
        let path = path.as_ref();
        let info = match self.stat_sync(path) {
            Ok(info) => info,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        if !kind_matches(&info, options) {
            return Ok(false);
        }
        if !options.is_readable {
            return Ok(true);
        }

        let probe = if info.is_directory {
            self.read_dir_sync(path).map(drop)
        } else {
            self.open_sync(path, &OpenOptions::default())
                .and_then(|mut file| file.close())
        };
        readable(probe)
    }

    /// `true` only for an existing directory; errors count as `false`.
    pub async fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.stat(path).await.map_or(false, |info| info.is_directory)
    }

    pub fn is_dir_sync(&self, path: impl AsRef<Path>) -> bool {
        self.stat_sync(path).map_or(false, |info| info.is_directory)
    }

    /// `true` only for an existing regular file; errors count as `false`.
    pub async fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.stat(path).await.map_or(false, |info| info.is_file)
    }

    pub fn is_file_sync(&self, path: impl AsRef<Path>) -> bool {
        self.stat_sync(path).map_or(false, |info| info.is_file)
    }
}
