//! Single-operation behavior through the native loaders.

use std::io;

use bytes::Bytes;
use core_fs::{
    AbortController, AbortSignal, ExistsOptions, FsConfig, FsError, FsSupports, Fs,
    MakeTempOptions, OpenOptions, ReadOptions, RemoveOptions, SeekMode, WriteOptions,
};
use futures::stream;

mod common;

use common::{fixture_root, native_fs};

const TEXT: &str = "héllo wörld ✓\nsecond line";

#[test]
fn test_text_round_trip_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.txt");
    let fs = native_fs();

    fs.write_text_file_sync(&path, TEXT, &WriteOptions::default())
        .unwrap();
    assert_eq!(
        fs.read_text_file_sync(&path, &ReadOptions::default()).unwrap(),
        TEXT
    );
    assert_eq!(
        fs.read_file_sync(&path, &ReadOptions::default()).unwrap(),
        Bytes::from(TEXT)
    );
}

#[tokio::test]
async fn test_text_round_trip_async() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.txt");
    let fs = native_fs();

    fs.write_text_file(&path, TEXT, &WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(
        fs.read_text_file(&path, &ReadOptions::default()).await.unwrap(),
        TEXT
    );
}

#[test]
fn test_invalid_utf8_is_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin");
    std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    let err = native_fs()
        .read_text_file_sync(&path, &ReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, FsError::Io(ref e) if e.kind() == io::ErrorKind::InvalidData));
}

#[test]
fn test_append_and_create_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    let fs = native_fs();

    fs.write_text_file_sync(&path, "a", &WriteOptions::default())
        .unwrap();
    fs.write_text_file_sync(&path, "b", &WriteOptions::append())
        .unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab");

    let missing = dir.path().join("missing.txt");
    let err = fs
        .write_file_sync(&missing, b"x", &WriteOptions::default().with_create(false))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_aborted_signal_prevents_access() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.txt");
    let fs = native_fs();
    let signal = AbortSignal::aborted_signal();

    let err = fs
        .write_file_sync(&path, b"data", &WriteOptions::default().with_signal(signal.clone()))
        .unwrap_err();
    assert!(matches!(err, FsError::Aborted));
    assert!(!path.exists());

    let err = fs
        .read_file_sync(&path, &ReadOptions::with_signal(signal))
        .unwrap_err();
    assert!(matches!(err, FsError::Aborted));
}

#[tokio::test]
async fn test_aborted_signal_prevents_access_async() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.txt");
    let fs = native_fs();
    let controller = AbortController::new();
    controller.abort();

    let options = WriteOptions::default().with_signal(controller.signal());
    assert!(matches!(
        fs.write_text_file(&path, "x", &options).await,
        Err(FsError::Aborted)
    ));
    assert!(matches!(
        fs.read_text_file(&path, &ReadOptions::with_signal(controller.signal()))
            .await,
        Err(FsError::Aborted)
    ));
    assert!(!path.exists());
}

#[test]
fn test_remove_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("tree");
    std::fs::create_dir_all(tree.join("inner")).unwrap();
    std::fs::write(tree.join("inner/file"), "x").unwrap();
    let fs = native_fs();

    assert!(fs.remove_sync(&tree, &RemoveOptions::default()).is_err());
    assert!(tree.join("inner/file").exists());

    fs.remove_sync(&tree, &RemoveOptions::recursive()).unwrap();
    assert!(!tree.exists());

    let err = fs.remove_sync(&tree, &RemoveOptions::default()).unwrap_err();
    assert!(err.is_not_found());
    assert!(core_fs::is_not_found_error(&err));
}

#[tokio::test]
async fn test_remove_empty_dir_async() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();

    native_fs()
        .remove(&empty, &RemoveOptions::default())
        .await
        .unwrap();
    assert!(!empty.exists());
}

#[test]
fn test_rename_and_read_dir() {
    let dir = tempfile::tempdir().unwrap();
    let fs = native_fs();
    std::fs::write(dir.path().join("old.txt"), "x").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();

    fs.rename_sync(dir.path().join("old.txt"), dir.path().join("new.txt"))
        .unwrap();

    let mut entries = fs.read_dir_sync(dir.path()).unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["new.txt", "sub"]);
    assert!(entries[0].is_file);
    assert!(entries[1].is_directory);
}

#[test]
fn test_handle_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handle.bin");
    let fs = native_fs();

    let mut file = fs.open_sync(&path, &OpenOptions::read_write()).unwrap();
    assert!(file.supports().contains(FsSupports::Write));
    assert!(file.supports().contains(FsSupports::Seek));
    file.write_all(b"0123456789").unwrap();
    assert_eq!(file.seek(2, SeekMode::Start).unwrap(), 2);
    let mut buf = [0u8; 3];
    assert_eq!(file.read(&mut buf).unwrap(), Some(3));
    assert_eq!(&buf, b"234");
    file.truncate(4).unwrap();
    assert_eq!(file.stat().unwrap().size, 4);

    file.close().unwrap();
    assert!(matches!(file.close(), Err(FsError::Closed)));
    assert!(matches!(file.read(&mut buf), Err(FsError::Closed)));
}

#[test]
fn test_read_only_handle_rejects_truncate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.txt");
    std::fs::write(&path, "keep").unwrap();
    let fs = native_fs();

    let mut file = fs.open_sync(&path, &OpenOptions::default()).unwrap();
    assert!(!file.supports().contains(FsSupports::Truncate));
    let err = file.truncate(0).unwrap_err();
    assert_eq!(err.to_string(), "truncate is not implemented");
    assert!(matches!(file.write(b"x"), Err(FsError::Unsupported(_))));
    assert_eq!(file.read_to_end().unwrap(), b"keep");
    drop(file);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep");
}

#[test]
fn test_with_file_closes_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scoped.txt");
    std::fs::write(&path, "abc").unwrap();
    let fs = native_fs();

    let read = fs
        .with_file_sync(&path, &OpenOptions::default(), |file| file.read_to_end())
        .unwrap();
    assert_eq!(read, b"abc");

    let err = fs
        .with_file_sync(&path, &OpenOptions::default(), |file| {
            file.write(b"nope").map(drop)
        })
        .unwrap_err();
    assert!(matches!(err, FsError::Unsupported(_)));
}

#[cfg(unix)]
#[test]
fn test_exclusive_lock_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lock");
    let fs = native_fs();

    let mut file = fs.open_sync(&path, &OpenOptions::read_write()).unwrap();
    assert!(file.supports().contains(FsSupports::Lock));
    file.lock(true).unwrap();
    file.unlock().unwrap();
    file.close().unwrap();
}

#[tokio::test]
async fn test_async_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("async.bin");
    let fs = native_fs();

    let mut file = fs.open(&path, &OpenOptions::read_write()).await.unwrap();
    file.write_all(b"stream me").await.unwrap();
    file.flush().await.unwrap();
    file.seek(0, SeekMode::Start).await.unwrap();
    assert_eq!(file.read_to_end().await.unwrap(), b"stream me");
    file.close().await.unwrap();
    assert!(matches!(file.close().await, Err(FsError::Closed)));
}

#[tokio::test]
async fn test_write_file_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.txt");
    let fs = native_fs();

    let chunks = stream::iter(vec![
        Ok(Bytes::from_static(b"one ")),
        Ok(Bytes::from_static(b"two ")),
        Ok(Bytes::from_static(b"three")),
    ]);
    fs.write_file_stream(&path, chunks, &WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "one two three");
}

#[tokio::test]
async fn test_write_file_stream_error_still_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.txt");
    let fs = native_fs();

    let chunks = stream::iter(vec![
        Ok(Bytes::from_static(b"kept")),
        Err(io::Error::new(io::ErrorKind::Other, "source failed")),
        Ok(Bytes::from_static(b"never")),
    ]);
    let err = fs
        .write_file_stream(&path, chunks, &WriteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "source failed");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept");
}

fn temp_fs(root: &std::path::Path) -> Fs {
    Fs::new(
        FsConfig::builder()
            .detect_primary_runtime(false)
            .temp_root(root)
            .build()
            .unwrap(),
    )
}

fn assert_temp_name(name: &str, prefix: &str, suffix: &str, length: usize) {
    let random = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .unwrap_or_else(|| panic!("unexpected temp name {name}"));
    assert_eq!(random.len(), length);
    assert!(random
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn test_temp_dir_naming() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    let fs = temp_fs(&root);

    let options = MakeTempOptions::default()
        .with_prefix("pre")
        .with_suffix("suf");
    let path = fs.make_temp_dir_sync(&options).unwrap();
    assert_eq!(path.parent().unwrap(), root);
    assert!(path.is_dir());
    assert_temp_name(&path.file_name().unwrap().to_string_lossy(), "pre", "suf", 12);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    let other = fs.make_temp_dir_sync(&options).unwrap();
    assert_ne!(path, other);
}

#[test]
fn test_temp_file_under_relative_and_absolute_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    let fs = temp_fs(&root);

    let nested = fs
        .make_temp_file_sync(&MakeTempOptions::default().with_dir("nested/deeper"))
        .unwrap();
    assert_eq!(nested.parent().unwrap(), root.join("nested/deeper"));
    assert!(nested.is_file());
    assert_eq!(std::fs::metadata(&nested).unwrap().len(), 0);
    assert_temp_name(&nested.file_name().unwrap().to_string_lossy(), "", "", 12);

    let elsewhere = tempfile::tempdir().unwrap();
    let absolute = fs
        .make_temp_file_sync(&MakeTempOptions::default().with_dir(elsewhere.path()))
        .unwrap();
    assert_eq!(absolute.parent().unwrap(), elsewhere.path());
}

#[tokio::test]
async fn test_temp_async_honors_name_length() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixture_root(&dir);
    let fs = Fs::new(
        FsConfig::builder()
            .detect_primary_runtime(false)
            .temp_root(&root)
            .temp_name_length(20)
            .build()
            .unwrap(),
    );

    let path = fs
        .make_temp_file(&MakeTempOptions::default().with_suffix(".json"))
        .await
        .unwrap();
    assert_temp_name(&path.file_name().unwrap().to_string_lossy(), "", ".json", 20);
    assert!(path.is_file());

    let dir_path = fs.make_temp_dir(&MakeTempOptions::default()).await.unwrap();
    assert!(dir_path.is_dir());
}

#[test]
fn test_exists_options() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f.txt");
    std::fs::write(&file, "x").unwrap();
    let fs = native_fs();

    let as_file = ExistsOptions {
        is_file: true,
        ..ExistsOptions::default()
    };
    let as_dir = ExistsOptions {
        is_directory: true,
        ..ExistsOptions::default()
    };
    let readable = ExistsOptions {
        is_readable: true,
        ..ExistsOptions::default()
    };

    assert!(fs.exists_sync(&file, &ExistsOptions::default()).unwrap());
    assert!(fs.exists_sync(&file, &as_file).unwrap());
    assert!(!fs.exists_sync(&file, &as_dir).unwrap());
    assert!(fs.exists_sync(dir.path(), &as_dir).unwrap());
    assert!(fs.exists_sync(&file, &readable).unwrap());
    assert!(fs.exists_sync(dir.path(), &readable).unwrap());
    assert!(!fs
        .exists_sync(dir.path().join("nope"), &ExistsOptions::default())
        .unwrap());

    let both = ExistsOptions {
        is_file: true,
        is_directory: true,
        ..ExistsOptions::default()
    };
    let err = fs.exists_sync(&file, &both).unwrap_err();
    assert!(matches!(err, FsError::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
}

#[tokio::test]
async fn test_kind_checks_async() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f.txt");
    std::fs::write(&file, "x").unwrap();
    let fs = native_fs();

    assert!(fs.is_dir(dir.path()).await);
    assert!(!fs.is_dir(&file).await);
    assert!(fs.is_file(&file).await);
    assert!(!fs.is_file(dir.path().join("missing")).await);
    assert!(fs
        .exists(&file, &ExistsOptions { is_readable: true, ..ExistsOptions::default() })
        .await
        .unwrap());
}

#[test]
fn test_kind_checks_sync() {
    let dir = tempfile::tempdir().unwrap();
    let fs = native_fs();
    assert!(fs.is_dir_sync(dir.path()));
    assert!(!fs.is_file_sync(dir.path()));
    assert!(!fs.is_dir_sync(dir.path().join("missing")));
}

#[test]
fn test_process_identity() {
    let fs = native_fs();
    assert_eq!(fs.cwd().unwrap(), std::env::current_dir().unwrap());

    #[cfg(unix)]
    {
        assert!(fs.uid().is_some());
        assert!(fs.gid().is_some());
    }
    #[cfg(not(unix))]
    {
        assert_eq!(fs.uid(), None);
        assert_eq!(fs.gid(), None);
    }
}

#[cfg(unix)]
#[test]
fn test_chmod_and_utime() {
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, SystemTime};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.txt");
    std::fs::write(&path, "x").unwrap();
    let fs = native_fs();

    fs.chmod_sync(&path, 0o600).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    fs.utime_sync(&path, stamp, stamp).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(modified, stamp);
}
