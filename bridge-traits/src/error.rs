use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    /// Neither a primary runtime nor any loader could supply the operation.
    #[error("No suitable file system module found.")]
    NoBackend,

    /// Native not-found signal raised by a primary runtime.
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// Native already-exists signal raised by a primary runtime.
    #[error("{0}")]
    AlreadyExists(String),

    #[error("Ensure path exists, expected '{expected}', got '{actual}'")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0} is not implemented")]
    Unsupported(String),

    #[error("The operation was aborted")]
    Aborted,

    #[error("The file handle is already closed")]
    Closed,

    #[error("Error walking '{}': {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: Box<FsError>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    /// True for both the native not-found signal and `ErrorKind::NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            FsError::NotFound(_) => true,
            FsError::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// True for both the native already-exists signal and
    /// `ErrorKind::AlreadyExists`.
    pub fn is_already_exists(&self) -> bool {
        match self {
            FsError::AlreadyExists(_) => true,
            FsError::Io(err) => err.kind() == io::ErrorKind::AlreadyExists,
            _ => false,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FsError::Io(err) if err.kind() == io::ErrorKind::PermissionDenied)
    }

    pub fn unsupported(op: impl Into<String>) -> Self {
        FsError::Unsupported(op.into())
    }

    pub fn already_exists(path: impl AsRef<std::path::Path>) -> Self {
        FsError::AlreadyExists(format!("'{}' already exists.", path.as_ref().display()))
    }

    pub fn walk(root: impl Into<PathBuf>, source: FsError) -> Self {
        FsError::Walk {
            root: root.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
