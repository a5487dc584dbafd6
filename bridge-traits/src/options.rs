//! Option records accepted by filesystem operations.

use std::path::PathBuf;

use crate::signal::AbortSignal;
use crate::types::SymlinkType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    pub recursive: bool,
}

impl RemoveOptions {
    pub fn recursive() -> Self {
        Self { recursive: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateDirectoryOptions {
    pub recursive: bool,
    pub mode: Option<u32>,
}

impl CreateDirectoryOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExistsOptions {
    pub is_readable: bool,
    pub is_directory: bool,
    pub is_file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeTempOptions {
    /// Parent directory. Relative values are resolved under the temp root.
    pub dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl MakeTempOptions {
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub append: bool,
    /// Create the file when missing. Defaults to `true`.
    pub create: bool,
    pub signal: Option<AbortSignal>,
    pub mode: Option<u32>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
            signal: None,
            mode: None,
        }
    }
}

impl WriteOptions {
    pub fn append() -> Self {
        Self {
            append: true,
            ..Self::default()
        }
    }

    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub signal: Option<AbortSignal>,
}

impl ReadOptions {
    pub fn with_signal(signal: AbortSignal) -> Self {
        Self {
            signal: Some(signal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
    pub mode: Option<u32>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            truncate: false,
            create: false,
            create_new: false,
            mode: None,
        }
    }
}

impl OpenOptions {
    /// Read-write access, creating the file when missing.
    pub fn read_write() -> Self {
        Self {
            write: true,
            create: true,
            ..Self::default()
        }
    }

    pub fn write_only() -> Self {
        Self {
            read: false,
            write: true,
            create: true,
            truncate: true,
            ..Self::default()
        }
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Whether the handle will be writable.
    pub fn writable(&self) -> bool {
        self.write || self.append
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymlinkOptions {
    /// Only consulted on Windows. `None` detects the kind from the target.
    pub kind: Option<SymlinkType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_options_default_creates() {
        let options = WriteOptions::default();
        assert!(options.create);
        assert!(!options.append);
        assert!(options.signal.is_none());
    }

    #[test]
    fn test_open_options_default_is_read_only() {
        let options = OpenOptions::default();
        assert!(options.read);
        assert!(!options.writable());
        assert!(OpenOptions::default().with_append(true).writable());
    }

    #[test]
    fn test_make_temp_builder() {
        let options = MakeTempOptions::default()
            .with_dir("nested")
            .with_prefix("pre-")
            .with_suffix(".txt");
        assert_eq!(options.dir, Some(PathBuf::from("nested")));
        assert_eq!(options.prefix.as_deref(), Some("pre-"));
        assert_eq!(options.suffix.as_deref(), Some(".txt"));
    }
}
