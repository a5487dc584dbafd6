//! Temporary files and directories.
//!
//! A primary runtime creates them natively. Otherwise a name is generated
//! here and the dispatched `make_dir` / `open` do the work.

use std::io;
use std::path::PathBuf;

use bridge_traits::{CreateDirectoryOptions, MakeTempOptions, OpenOptions};
use tracing::debug;

use crate::dispatch::Fs;
use crate::error::Result;

const TEMP_NAME_CHARS: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TEMP_DIR_MODE: u32 = 0o700;
const TEMP_FILE_MODE: u32 = 0o644;

/// `length` random characters from `[a-z0-9]`.
fn random_name(length: usize) -> Result<String> {
    let mut bytes = vec![0u8; length];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(bytes
        .iter()
        .map(|b| TEMP_NAME_CHARS[usize::from(*b) % TEMP_NAME_CHARS.len()] as char)
        .collect())
}

/// `prefix + random + suffix`, joined literally.
fn temp_name(options: &MakeTempOptions, length: usize) -> Result<String> {
    let prefix = options.prefix.as_deref().unwrap_or_default();
    let suffix = options.suffix.as_deref().unwrap_or_default();
    Ok(format!("{prefix}{}{suffix}", random_name(length)?))
}

impl Fs {
    /// Root for temp entries: the configured override, else `TEMP` on
    /// Windows or `TMPDIR` elsewhere, else `c:\Temp` or `/tmp`.
    pub fn temp_root(&self) -> PathBuf {
        if let Some(root) = &self.temp_root {
            return root.clone();
        }
        let (var, fallback) = if self.is_windows() {
            ("TEMP", "c:\\Temp")
        } else {
            ("TMPDIR", "/tmp")
        };
        std::env::var_os(var)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback))
    }

    fn temp_path(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        let parent = match &options.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.temp_root().join(dir),
            None => self.temp_root(),
        };
        Ok(parent.join(temp_name(options, self.temp_name_length)?))
    }

    /// Creates a new temporary directory (mode `0o700`) and returns its path.
    pub async fn make_temp_dir(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if let Some(primary) = self.primary_async() {
            return primary.make_temp_dir(options).await;
        }
        let path = self.temp_path(options)?;
        let mode = CreateDirectoryOptions::recursive().with_mode(TEMP_DIR_MODE);
        self.make_dir(&path, &mode).await?;
        debug!(path = ?path, "Created temp directory");
        Ok(path)
    }

    pub fn make_temp_dir_sync(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if let Some(primary) = self.primary_sync() {
            return primary.make_temp_dir(options);
        }
        let path = self.temp_path(options)?;
        let mode = CreateDirectoryOptions::recursive().with_mode(TEMP_DIR_MODE);
        self.make_dir_sync(&path, &mode)?;
        debug!(path = ?path, "Created temp directory");
        Ok(path)
    }

    /// Creates a new empty temporary file (mode `0o644`) and returns its
    /// path. The parent directory is created when missing.
    pub async fn make_temp_file(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if let Some(primary) = self.primary_async() {
            return primary.make_temp_file(options).await;
        }
        let path = self.temp_path(options)?;
        if let Some(parent) = path.parent() {
            self.make_dir(parent, &CreateDirectoryOptions::recursive())
                .await?;
        }
        let mut file = self.open(&path, &temp_file_options()).await?;
        file.close().await?;
        debug!(path = ?path, "Created temp file");
        Ok(path)
    }

    pub fn make_temp_file_sync(&self, options: &MakeTempOptions) -> Result<PathBuf> {
        if let Some(primary) = self.primary_sync() {
            return primary.make_temp_file(options);
        }
        let path = self.temp_path(options)?;
        if let Some(parent) = path.parent() {
            self.make_dir_sync(parent, &CreateDirectoryOptions::recursive())?;
        }
        self.open_sync(&path, &temp_file_options())?.close()?;
        debug!(path = ?path, "Created temp file");
        Ok(path)
    }
}

fn temp_file_options() -> OpenOptions {
    OpenOptions {
        read: false,
        write: true,
        ..OpenOptions::default()
    }
    .with_create_new(true)
    .with_mode(TEMP_FILE_MODE)
}
