use cubedpl_runtime::server::{IoError, LaunchError, ServerError};
use cubedpl_scan::ScanError;
use thiserror::Error;

/// Errors raised when submitting a sort.
#[derive(Error, Clone)]
pub enum SortError {
    /// A buffer couldn't be reserved or accessed.
    #[error("Sort failed on a memory operation\nCaused by:\n  {0}")]
    Io(#[from] IoError),

    /// A kernel couldn't be launched.
    #[error("Sort failed to launch a kernel\nCaused by:\n  {0}")]
    Launch(#[from] LaunchError),

    /// The device failed while executing the submitted work.
    #[error("Sort failed on the device\nCaused by:\n  {0}")]
    Server(#[from] ServerError),

    /// The tile status couldn't be prepared.
    #[error("Sort failed to prepare the tiles\nCaused by:\n  {0}")]
    Scan(#[from] ScanError),

    /// A buffer holds fewer elements than the sorted length.
    #[error("The {buffer} buffer holds {capacity} elements, {len} are required")]
    BufferTooSmall {
        /// Which buffer is too small.
        buffer: &'static str,
        /// Number of elements required.
        len: usize,
        /// Number of elements of the buffer.
        capacity: usize,
    },

    /// Bucket counters are 32 bits wide.
    #[error("Can't sort {len} keys, the maximum is {max}")]
    InputTooLarge {
        /// Number of keys.
        len: usize,
        /// Maximum number of keys.
        max: usize,
    },
}

impl core::fmt::Debug for SortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}
