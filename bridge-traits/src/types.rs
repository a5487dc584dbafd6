//! Value types shared by every backend.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata describing a filesystem entry.
///
/// The POSIX-only fields are `None` on platforms that do not report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: Option<PathBuf>,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub mtime: Option<DateTime<Utc>>,
    pub atime: Option<DateTime<Utc>>,
    pub birthtime: Option<DateTime<Utc>>,
    pub dev: Option<u64>,
    pub ino: Option<u64>,
    pub mode: Option<u32>,
    pub nlink: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub rdev: Option<u64>,
    pub blksize: Option<u64>,
    pub blocks: Option<u64>,
    pub is_block_device: Option<bool>,
    pub is_char_device: Option<bool>,
    pub is_fifo: Option<bool>,
    pub is_socket: Option<bool>,
}

impl FileInfo {
    /// Short kind tag used in type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        if self.is_file {
            "file"
        } else if self.is_directory {
            "dir"
        } else if self.is_symlink {
            "symlink"
        } else {
            "undefined"
        }
    }
}

/// One child of a directory, classified without following links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryInfo {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// An entry produced by a directory walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

impl WalkEntry {
    pub fn from_info(path: impl Into<PathBuf>, info: &FileInfo) -> Self {
        let path = path.into();
        Self {
            name: entry_name(&path),
            path,
            is_file: info.is_file,
            is_directory: info.is_directory,
            is_symlink: info.is_symlink,
        }
    }
}

/// Final component of `path`, or the whole path when it has none (`/`, `.`).
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    Start,
    Current,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymlinkType {
    File,
    Dir,
}

/// A capability an open handle may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsSupports {
    Read,
    Write,
    Lock,
    Seek,
    Truncate,
}

impl FsSupports {
    const fn bit(self) -> u8 {
        match self {
            FsSupports::Read => 1,
            FsSupports::Write => 1 << 1,
            FsSupports::Lock => 1 << 2,
            FsSupports::Seek => 1 << 3,
            FsSupports::Truncate => 1 << 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FsSupports::Read => "read",
            FsSupports::Write => "write",
            FsSupports::Lock => "lock",
            FsSupports::Seek => "seek",
            FsSupports::Truncate => "truncate",
        }
    }
}

/// Set of [`FsSupports`] fixed when a handle is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Supports(u8);

impl Supports {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, cap: FsSupports) -> Self {
        self.0 |= cap.bit();
        self
    }

    pub fn with_if(self, cap: FsSupports, enabled: bool) -> Self {
        if enabled {
            self.with(cap)
        } else {
            self
        }
    }

    pub fn contains(&self, cap: FsSupports) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn intersect(self, other: Supports) -> Self {
        Self(self.0 & other.0)
    }
}

impl FromIterator<FsSupports> for Supports {
    fn from_iter<I: IntoIterator<Item = FsSupports>>(iter: I) -> Self {
        iter.into_iter().fold(Supports::empty(), Supports::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_name() {
        let mut info = FileInfo::default();
        assert_eq!(info.kind_name(), "undefined");
        info.is_directory = true;
        assert_eq!(info.kind_name(), "dir");
        info.is_directory = false;
        info.is_symlink = true;
        assert_eq!(info.kind_name(), "symlink");
    }

    #[test]
    fn test_supports_set() {
        let caps: Supports = [FsSupports::Read, FsSupports::Seek].into_iter().collect();
        assert!(caps.contains(FsSupports::Read));
        assert!(caps.contains(FsSupports::Seek));
        assert!(!caps.contains(FsSupports::Write));

        let narrowed = caps.intersect(Supports::empty().with(FsSupports::Seek));
        assert!(!narrowed.contains(FsSupports::Read));
        assert!(narrowed.contains(FsSupports::Seek));
    }

    #[test]
    fn test_entry_name_of_root() {
        assert_eq!(entry_name(Path::new("/")), "/");
        assert_eq!(entry_name(Path::new("a/b.txt")), "b.txt");
    }

    #[test]
    fn test_file_info_serializes() {
        let info = FileInfo {
            name: "a".into(),
            is_file: true,
            size: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["is_file"], true);
        assert_eq!(json["size"], 3);
    }
}
