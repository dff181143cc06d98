//! Verbose diagnostic logging.
//!
//! Armed either programmatically via `set_verbose(true)` or by setting the
//! `HUM_VERBOSE` environment variable; the `verbose!()` macro is a no-op
//! otherwise.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose logging.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Arm verbose logging from the `HUM_VERBOSE` environment variable.
pub fn init_verbose_from_env() {
    if std::env::var_os("HUM_VERBOSE").is_some_and(|v| !v.is_empty() && v != "0") {
        set_verbose(true);
    }
}

/// Check if verbose logging is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a formatted message to stderr if verbose mode is enabled.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!("[hum] {}", format!($($arg)*));
        }
    };
}
