//! Log macros for the library's own events.
//!
//! Built with `logging`, each macro forwards to the `tracing` macro of the
//! same level; built without it, each expands to nothing and the crate does
//! not depend on `tracing` at all. Installing a subscriber is left to the
//! application (the CLI does it in `subscriber`).
//!
//! Levels as used across the crate:
//!
//! | Level | Events |
//! |---|---|
//! | `error` | stored layout version differs, a clear cannot be staged, a bulk object has no serialized form |
//! | `warn` | a commit was refused and the save reports `false` |
//! | `info` | a namespace was opened, `remove_all` was called |
//! | `debug` | one line per save, removal, bulk write or build, with namespace and key |
//! | `trace` | batch confirmations, absent-key reads, version checks, clear progress |
//!
//! Fields are structured: `namespace`, `key`, `kind`, `ops`, `error`.

/// Batch confirmations, absent keys, clear progress.
#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

/// One event per facade operation.
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Namespace opened or cleared.
#[cfg(feature = "logging")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// A refused commit, reported to the caller as `false`.
#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// A failure returned to the caller as an error.
#[cfg(feature = "logging")]
macro_rules! log_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use log_debug as debug;
#[allow(unused_imports)]
pub(crate) use log_error as error;
#[allow(unused_imports)]
pub(crate) use log_info as info;
#[allow(unused_imports)]
pub(crate) use log_trace as trace;
#[allow(unused_imports)]
pub(crate) use log_warn as warn;
