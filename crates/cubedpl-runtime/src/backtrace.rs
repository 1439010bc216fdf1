use std::{backtrace::Backtrace, fmt, sync::Arc};

/// Backtrace attached to runtime errors.
///
/// Captured only when `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` enables it, empty otherwise.
#[derive(Clone, Default)]
pub struct BackTrace(Option<Arc<Backtrace>>);

impl BackTrace {
    /// Capture the backtrace of the calling thread.
    pub fn capture() -> Self {
        Self(Some(Arc::new(Backtrace::capture())))
    }
}

impl fmt::Display for BackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(trace) => fmt::Display::fmt(trace, f),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for BackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
