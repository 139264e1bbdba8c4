//! Logging gated by a per-module `ENABLE_LOGS` switch.
//!
//! A module opts in by declaring the switch and calling the macros through the
//! crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! crate::log_info!("reconciled {} sessions", count);
//! ```
//! Flipping the constant to `false` silences that module without touching
//! `RUST_LOG`.

/// Shared body of the level macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! gated_log {
    ($level:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::log!($level, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::gated_log!(log::Level::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::gated_log!(log::Level::Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::gated_log!(log::Level::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::gated_log!(log::Level::Error, $($arg)*) };
}
