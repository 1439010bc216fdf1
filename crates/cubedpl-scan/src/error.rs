use cubedpl_runtime::server::{IoError, LaunchError, ServerError};
use thiserror::Error;

/// Errors raised when submitting a scan or a reduction.
#[derive(Error, Clone)]
pub enum ScanError {
    /// A buffer couldn't be reserved or accessed.
    #[error("Scan failed on a memory operation\nCaused by:\n  {0}")]
    Io(#[from] IoError),

    /// A kernel couldn't be launched.
    #[error("Scan failed to launch a kernel\nCaused by:\n  {0}")]
    Launch(#[from] LaunchError),

    /// The device failed while executing the submitted work.
    #[error("Scan failed on the device\nCaused by:\n  {0}")]
    Server(#[from] ServerError),

    /// A buffer holds fewer elements than the scanned length.
    #[error("The {buffer} buffer holds {capacity} elements, {len} are required")]
    BufferTooSmall {
        /// Which buffer is too small.
        buffer: &'static str,
        /// Number of elements required.
        len: usize,
        /// Number of elements of the buffer.
        capacity: usize,
    },

    /// The number of tiles doesn't fit in the 32-bit tile counter.
    #[error("Can't scan {len} elements, the maximum is {max}")]
    InputTooLarge {
        /// Length of the input.
        len: usize,
        /// Maximum supported length with the current tile size.
        max: usize,
    },
}

impl core::fmt::Debug for ScanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

/// Check that a buffer holds at least `len` elements.
pub(crate) fn check_capacity(
    buffer: &'static str,
    capacity: usize,
    len: usize,
) -> Result<(), ScanError> {
    if capacity < len {
        return Err(ScanError::BufferTooSmall {
            buffer,
            len,
            capacity,
        });
    }
    Ok(())
}

/// Number of tiles covering `len` elements, checked against the 32-bit tile counter.
pub fn tile_count(len: usize, tile_size: u32) -> Result<u32, ScanError> {
    let tiles = len.div_ceil(tile_size as usize);
    u32::try_from(tiles)
        .ok()
        .filter(|tiles| *tiles < u32::MAX)
        .ok_or(ScanError::InputTooLarge {
            len,
            max: (u32::MAX as usize - 1) * tile_size as usize,
        })
}
