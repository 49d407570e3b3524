//! Process-level setup for the binary: async runtime and panic reporting.
//!
//! `#[tokio::main]` drops its runtime on return, and dropping a runtime
//! waits for every blocking task. After a timeout the audit may still have
//! plugin calls running on the blocking pool, so the binary owns its runtime
//! and releases it with [`tokio::runtime::Runtime::shutdown_background`].

use std::future::Future;
use std::panic::{self, PanicHookInfo};

use dwaudit_core::Result;
use dwaudit_core::error::AuditError;
use dwaudit_core::runner::panic_message;
use tracing::debug;

/// Runs a future to completion on a fresh multi-threaded runtime.
///
/// The runtime is shut down without waiting for blocking tasks, so a
/// timed-out audit returns as soon as its report is assembled. Abandoned
/// plugin calls end with the process.
///
/// # Errors
/// Fails when the runtime cannot be started.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AuditError::Io {
            context: "Failed to start async runtime".to_string(),
            source: e,
        })?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// Routes panics on worker threads to `debug` logging.
///
/// Plugin panics are caught by the runner and reported as failed
/// invocations; the default hook would also print them to stderr. Panics on
/// the main thread still go to the previously installed hook.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let thread = std::thread::current();
        match thread.name() {
            Some("main") => previous(info),
            name => {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()))
                    .unwrap_or_default();
                debug!(
                    "Panic on thread '{}' at {}: {}",
                    name.unwrap_or("unnamed"),
                    location,
                    panic_message(info.payload())
                );
            }
        }
    }));
}
