use crate::{
    client::ComputeClient,
    element::CubeElement,
    server::{ComputeServer, Handle, IoError, ServerError},
};

/// How a device buffer mirroring a host slice is accessed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// The device only reads the buffer.
    Read,
    /// The device only writes the buffer.
    Write,
    /// The device reads and writes the buffer.
    ReadWrite,
}

impl AccessMode {
    /// Whether the device writes the buffer, requiring a copy back to the host.
    pub fn is_written(&self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

enum HostSlice<'a, T> {
    Shared(&'a [T]),
    Exclusive(&'a mut [T]),
}

/// A device buffer mirroring a host slice for the duration of an algorithm.
///
/// The host data is copied to the device for every access mode, including [AccessMode::Write],
/// unless the view is created with [HostBuffer::no_init]. Written buffers are copied back to the
/// host slice by [HostBuffer::finish].
///
/// Dropping the view without calling [HostBuffer::finish] discards what the device wrote: the
/// host slice keeps its previous content and device errors are not reported.
#[must_use = "device writes only reach the host slice through `finish`"]
pub struct HostBuffer<'a, S, T> {
    client: ComputeClient<S>,
    host: HostSlice<'a, T>,
    handle: Handle,
    mode: AccessMode,
}

impl<'a, S: ComputeServer, T: CubeElement> HostBuffer<'a, S, T> {
    /// Mirror a slice the device only reads.
    pub fn read_only(client: &ComputeClient<S>, host: &'a [T]) -> Result<Self, IoError> {
        let handle = client.create_from_slice(host)?;

        Ok(Self {
            client: client.clone(),
            host: HostSlice::Shared(host),
            handle,
            mode: AccessMode::Read,
        })
    }

    /// Mirror a slice, copying its content to the device.
    pub fn new(
        client: &ComputeClient<S>,
        host: &'a mut [T],
        mode: AccessMode,
    ) -> Result<Self, IoError> {
        let handle = client.create_from_slice(host)?;

        Ok(Self {
            client: client.clone(),
            host: HostSlice::Exclusive(host),
            handle,
            mode,
        })
    }

    /// Mirror a slice without copying its content: the device buffer starts uninitialized.
    pub fn no_init(
        client: &ComputeClient<S>,
        host: &'a mut [T],
        mode: AccessMode,
    ) -> Result<Self, IoError> {
        let handle = client.empty_array::<T>(host.len())?;

        Ok(Self {
            client: client.clone(),
            host: HostSlice::Exclusive(host),
            handle,
            mode,
        })
    }

    /// The device buffer.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Number of elements of the host slice.
    pub fn len(&self) -> usize {
        match &self.host {
            HostSlice::Shared(host) => host.len(),
            HostSlice::Exclusive(host) => host.len(),
        }
    }

    /// Whether the host slice is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The access mode of the device.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Wait for the device and copy written buffers back to the host slice.
    pub fn finish(self) -> Result<(), ServerError> {
        let HostSlice::Exclusive(host) = self.host else {
            return self.client.sync();
        };

        if !self.mode.is_written() {
            return self.client.sync();
        }

        let values = self.client.read_array::<T>(self.handle)?;
        let len = host.len();
        host.copy_from_slice(&values[..len]);

        Ok(())
    }
}
