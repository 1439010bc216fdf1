use crate::{
    ClientRegistry,
    client::ComputeClient,
    compute::CpuServer,
    config::GlobalConfig,
    server::ComputeServer,
};
use std::sync::Arc;

/// Family of devices the algorithms run on.
pub trait Runtime: Send + Sync + 'static + core::fmt::Debug {
    /// The server of a device.
    type Server: ComputeServer;
    /// Identifies a device of the runtime.
    type Device: Default
        + Clone
        + core::fmt::Debug
        + core::hash::Hash
        + Eq
        + Send
        + Sync
        + 'static;

    /// The client of `device`, started on first use.
    fn client(device: &Self::Device) -> ComputeClient<Self::Server>;

    /// Name of the runtime, used in logs.
    fn name() -> &'static str;
}

/// Emulated device, identified by its index.
#[derive(new, Default, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CpuDevice {
    /// Index of the device.
    pub index: usize,
}

/// Runtime executing kernels on emulated devices backed by CPU worker threads.
#[derive(Debug)]
pub struct CpuRuntime;

static CLIENTS: ClientRegistry<CpuDevice, CpuServer> = ClientRegistry::new();

impl CpuRuntime {
    /// Start the device with a specific configuration instead of the global one.
    ///
    /// # Panics
    ///
    /// If a client is already registered for the device or if the device can't be started.
    pub fn register(device: &CpuDevice, config: GlobalConfig) -> ComputeClient<CpuServer> {
        let client = create_client(device, Arc::new(config));
        CLIENTS.insert(device, client.clone());
        client
    }
}

fn create_client(device: &CpuDevice, config: Arc<GlobalConfig>) -> ComputeClient<CpuServer> {
    let server = CpuServer::new(device.index, config)
        .unwrap_or_else(|err| panic!("Can't start the device {device:?}: {err}"));
    ComputeClient::new(server)
}

impl Runtime for CpuRuntime {
    type Server = CpuServer;
    type Device = CpuDevice;

    fn client(device: &Self::Device) -> ComputeClient<Self::Server> {
        CLIENTS.get_or_start(device, || create_client(device, GlobalConfig::get()))
    }

    fn name() -> &'static str {
        "cpu"
    }
}
