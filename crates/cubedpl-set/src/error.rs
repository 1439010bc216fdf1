use cubedpl_runtime::server::{IoError, LaunchError, ServerError};
use cubedpl_scan::ScanError;
use thiserror::Error;

/// Errors raised when submitting a set operation or a merge.
#[derive(Error, Clone)]
pub enum SetError {
    /// A buffer couldn't be reserved or accessed.
    #[error("Set operation failed on a memory operation\nCaused by:\n  {0}")]
    Io(#[from] IoError),

    /// A kernel couldn't be launched.
    #[error("Set operation failed to launch a kernel\nCaused by:\n  {0}")]
    Launch(#[from] LaunchError),

    /// The device failed while executing the submitted work.
    #[error("Set operation failed on the device\nCaused by:\n  {0}")]
    Server(#[from] ServerError),

    /// The partition offsets couldn't be scanned.
    #[error("Set operation failed to scan the partition sizes\nCaused by:\n  {0}")]
    Scan(#[from] ScanError),

    /// A buffer holds fewer elements than its given length.
    #[error("The {buffer} buffer holds {capacity} elements, {len} are required")]
    BufferTooSmall {
        /// Which buffer is too small.
        buffer: &'static str,
        /// Number of elements required.
        len: usize,
        /// Number of elements of the buffer.
        capacity: usize,
    },

    /// Merge coordinates are 32 bits wide.
    #[error("Can't combine {len} elements, the maximum is {max}")]
    InputTooLarge {
        /// Number of elements of both inputs.
        len: usize,
        /// Maximum number of elements.
        max: usize,
    },
}

impl core::fmt::Debug for SetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

pub(crate) fn check_capacity(
    buffer: &'static str,
    capacity: usize,
    len: usize,
) -> Result<(), SetError> {
    match capacity < len {
        true => Err(SetError::BufferTooSmall {
            buffer,
            len,
            capacity,
        }),
        false => Ok(()),
    }
}
