//! Runtime utilities that abstract over the underlying async executor.

use std::io;

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// Fails when the runtime cannot be built, for example when the process is out
/// of file descriptors.
pub fn try_block_on<F>(future: F) -> io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Runs the provided future to completion using a lightweight runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created. Use [`try_block_on`] where that
/// must be reported instead.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    match try_block_on(future) {
        Ok(output) => output,
        Err(err) => panic!("core_async::runtime::block_on: failed to build Tokio runtime: {err}"),
    }
}

/// Returns `true` when the calling thread runs inside a Tokio runtime.
///
/// Backends that rely on the executor's blocking pool use this to decide
/// whether they can be offered at all.
pub fn has_ambient_runtime() -> bool {
    Handle::try_current().is_ok()
}
