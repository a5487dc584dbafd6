//! Ensure, empty, copy and move.

use std::time::{Duration, SystemTime};

use core_fs::{CopyOptions, FsError, MoveOptions};

mod common;

use common::{fixture_root, native_fs, touch};

#[test]
fn test_ensure_dir_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a/b/c");
    let fs = native_fs();

    fs.ensure_dir_sync(&target).unwrap();
    fs.ensure_dir_sync(&target).unwrap();
    assert!(target.is_dir());

    touch(dir.path().join("file"));
    let err = fs.ensure_dir_sync(dir.path().join("file")).unwrap_err();
    assert!(matches!(
        err,
        FsError::TypeMismatch {
            expected: "dir",
            actual: "file"
        }
    ));
}

#[test]
fn test_ensure_file_keeps_content() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("deep/er/file.txt");
    let fs = native_fs();

    fs.ensure_file_sync(&target).unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"");

    std::fs::write(&target, "content").unwrap();
    fs.ensure_file_sync(&target).unwrap();
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "content");

    let err = fs.ensure_file_sync(dir.path().join("deep")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Ensure path exists, expected 'file', got 'dir'"
    );
}

#[tokio::test]
async fn test_ensure_async() {
    let dir = tempfile::tempdir().unwrap();
    let fs = native_fs();
    let file = dir.path().join("x/y/z.txt");

    fs.ensure_file(&file).await.unwrap();
    fs.ensure_file(&file).await.unwrap();
    fs.ensure_dir(dir.path().join("x/y")).await.unwrap();
    assert!(file.is_file());

    let err = fs.ensure_dir(&file).await.unwrap_err();
    assert!(matches!(err, FsError::TypeMismatch { expected: "dir", .. }));
}

#[test]
fn test_ensure_link() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    std::fs::write(&src, "shared").unwrap();
    let fs = native_fs();

    let dest = dir.path().join("links/hard.txt");
    fs.ensure_link_sync(&src, &dest).unwrap();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "shared");
}

#[cfg(unix)]
#[test]
fn test_ensure_symlink_reports_existing_dest() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.txt");
    std::fs::write(&target, "t").unwrap();
    let link = dir.path().join("nested/link");
    let fs = native_fs();

    fs.ensure_symlink_sync(&target, &link).unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), target);

    let err = fs.ensure_symlink_sync(&target, &link).unwrap_err();
    assert!(err.is_already_exists());

    let other = dir.path().join("other.txt");
    std::fs::write(&other, "o").unwrap();
    let err = fs.ensure_symlink_sync(&target, &other).unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(std::fs::read_to_string(&other).unwrap(), "o");
}

#[cfg(unix)]
#[tokio::test]
async fn test_ensure_symlink_async_reports_existing_dest() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.txt");
    std::fs::write(&target, "t").unwrap();
    let link = dir.path().join("a/b/link");
    let fs = native_fs();

    fs.ensure_symlink(&target, &link).await.unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), target);

    let err = fs.ensure_symlink(&target, &link).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn test_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("full");
    touch(target.join("a.txt"));
    touch(target.join("sub/b.txt"));
    let fs = native_fs();

    fs.empty_dir_sync(&target).unwrap();
    assert!(target.is_dir());
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);

    let missing = dir.path().join("missing/child");
    fs.empty_dir_sync(&missing).unwrap();
    assert!(missing.is_dir());
}

#[tokio::test]
async fn test_empty_dir_async() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("full");
    touch(target.join("a.txt"));
    touch(target.join("sub/deeper/b.txt"));

    native_fs().empty_dir(&target).await.unwrap();
    assert!(target.is_dir());
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
}

#[test]
fn test_copy_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    std::fs::create_dir_all(root.join("src/nested")).unwrap();
    std::fs::write(root.join("src/top.txt"), "top").unwrap();
    std::fs::write(root.join("src/nested/inner.txt"), "inner").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink("top.txt", root.join("src/alias")).unwrap();
    let fs = native_fs();

    fs.copy_sync(root.join("src"), root.join("dest"), CopyOptions::default())
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(root.join("dest/nested/inner.txt")).unwrap(),
        "inner"
    );
    assert_eq!(std::fs::read_to_string(root.join("dest/top.txt")).unwrap(), "top");
    #[cfg(unix)]
    assert_eq!(
        std::fs::read_link(root.join("dest/alias")).unwrap(),
        std::path::PathBuf::from("top.txt")
    );
}

#[test]
fn test_copy_guards() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    touch(root.join("tree/file.txt"));
    touch(root.join("other.txt"));
    let fs = native_fs();

    let err = fs
        .copy_sync(root.join("tree"), root.join("tree/../tree"), CopyOptions::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Source and destination cannot be the same.");

    let err = fs
        .copy_sync(root.join("tree"), root.join("tree/sub"), CopyOptions::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Cannot copy '{}' to a subdirectory of itself, '{}'.",
            root.join("tree").display(),
            root.join("tree/sub").display()
        )
    );

    let err = fs
        .copy_sync(root.join("tree/file.txt"), root.join("other.txt"), CopyOptions::default())
        .unwrap_err();
    assert!(err.is_already_exists());

    fs.copy_sync(
        root.join("tree/file.txt"),
        root.join("other.txt"),
        CopyOptions::default().with_overwrite(true),
    )
    .unwrap();

    let err = fs
        .copy_sync(
            root.join("tree"),
            root.join("other.txt"),
            CopyOptions::default().with_overwrite(true),
        )
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot overwrite non-directory"));
}

#[tokio::test]
async fn test_copy_preserves_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    std::fs::write(root.join("old.txt"), "old").unwrap();
    let fs = native_fs();

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_234_567_890);
    fs.utime(root.join("old.txt"), stamp, stamp).await.unwrap();

    fs.copy(
        root.join("old.txt"),
        root.join("kept.txt"),
        CopyOptions::default().with_preserve_timestamps(true),
    )
    .await
    .unwrap();
    fs.copy(root.join("old.txt"), root.join("fresh.txt"), CopyOptions::default())
        .await
        .unwrap();

    let kept = std::fs::metadata(root.join("kept.txt")).unwrap();
    assert_eq!(kept.modified().unwrap(), stamp);
    let fresh = std::fs::metadata(root.join("fresh.txt")).unwrap();
    assert_ne!(fresh.modified().unwrap(), stamp);
}

#[test]
fn test_move_rules() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    std::fs::write(root.join("a.txt"), "a").unwrap();
    std::fs::write(root.join("b.txt"), "b").unwrap();
    touch(root.join("tree/leaf"));
    let fs = native_fs();

    fs.move_path_sync(root.join("a.txt"), root.join("a.txt"), MoveOptions::default())
        .unwrap();
    assert!(root.join("a.txt").exists());

    let err = fs
        .move_path_sync(root.join("a.txt"), root.join("b.txt"), MoveOptions::default())
        .unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(std::fs::read_to_string(root.join("b.txt")).unwrap(), "b");

    fs.move_path_sync(
        root.join("a.txt"),
        root.join("b.txt"),
        MoveOptions::default().with_overwrite(true),
    )
    .unwrap();
    assert!(!root.join("a.txt").exists());
    assert_eq!(std::fs::read_to_string(root.join("b.txt")).unwrap(), "a");

    let err = fs
        .move_path_sync(root.join("tree"), root.join("tree/inside"), MoveOptions::default())
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot move"));
}

#[tokio::test]
async fn test_move_async() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    touch(root.join("tree/leaf"));
    let fs = native_fs();

    fs.move_path(root.join("tree"), root.join("moved"), MoveOptions::default())
        .await
        .unwrap();
    assert!(root.join("moved/leaf").is_file());
    assert!(!root.join("tree").exists());
}
