//! Conversion from `std::fs::Metadata` into [`FileInfo`].

use std::io;
use std::path::Path;
use std::time::SystemTime;

use bridge_traits::types::entry_name;
use bridge_traits::FileInfo;
use chrono::{DateTime, Utc};

pub fn file_info(path: &Path, metadata: &std::fs::Metadata) -> FileInfo {
    let file_type = metadata.file_type();

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut info = FileInfo {
        name: entry_name(path),
        path: Some(path.to_path_buf()),
        is_file: file_type.is_file(),
        is_directory: file_type.is_dir(),
        is_symlink: file_type.is_symlink(),
        size: metadata.len(),
        mtime: timestamp(metadata.modified()),
        atime: timestamp(metadata.accessed()),
        birthtime: timestamp(metadata.created()),
        ..FileInfo::default()
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::{FileTypeExt, MetadataExt};

        info.dev = Some(metadata.dev());
        info.ino = Some(metadata.ino());
        info.mode = Some(metadata.mode());
        info.nlink = Some(metadata.nlink());
        info.uid = Some(metadata.uid());
        info.gid = Some(metadata.gid());
        info.rdev = Some(metadata.rdev());
        info.blksize = Some(metadata.blksize());
        info.blocks = Some(metadata.blocks());
        info.is_block_device = Some(file_type.is_block_device());
        info.is_char_device = Some(file_type.is_char_device());
        info.is_fifo = Some(file_type.is_fifo());
        info.is_socket = Some(file_type.is_socket());
    }

    info
}

fn timestamp(time: io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_info_for_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"hello").unwrap();

        let info = file_info(&path, &std::fs::metadata(&path).unwrap());
        assert_eq!(info.name, "data.txt");
        assert!(info.is_file);
        assert!(!info.is_directory);
        assert_eq!(info.size, 5);
        assert!(info.mtime.is_some());

        #[cfg(unix)]
        {
            assert!(info.mode.is_some());
            assert_eq!(info.is_fifo, Some(false));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_file_info_for_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let info = file_info(&link, &std::fs::symlink_metadata(&link).unwrap());
        assert!(info.is_symlink);
        assert!(!info.is_directory);
        assert_eq!(info.kind_name(), "symlink");
    }
}
