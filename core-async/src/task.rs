//! Task spawning.
//!
//! `spawn_blocking` is what async backends use for calls Tokio has no native
//! async form for (advisory locks, timestamps, ownership).

pub use tokio::task::{spawn_blocking, JoinError};

/// Runs a blocking closure on the blocking pool and flattens the join error
/// into an `io::Error`.
pub async fn run_blocking<F, T>(f: F) -> std::io::Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) => Err(std::io::Error::new(std::io::ErrorKind::Other, err)),
    }
}
