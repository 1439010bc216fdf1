use crate::{client::ComputeClient, server::ComputeServer};
use core::{fmt::Debug, hash::Hash};
use hashbrown::{HashMap, hash_map::Entry};

/// Clients of the started devices, so every caller targeting a device shares its stream.
pub struct ClientRegistry<Device, Server: ComputeServer> {
    clients: spin::Mutex<Option<HashMap<Device, ComputeClient<Server>>>>,
}

impl<Device, Server> ClientRegistry<Device, Server>
where
    Device: Hash + Eq + Clone + Debug,
    Server: ComputeServer,
{
    /// An empty registry, usable in a static.
    pub const fn new() -> Self {
        Self {
            clients: spin::Mutex::new(None),
        }
    }

    /// The client of `device`, started with `start` on first use.
    pub fn get_or_start(
        &self,
        device: &Device,
        start: impl FnOnce() -> ComputeClient<Server>,
    ) -> ComputeClient<Server> {
        let mut guard = self.clients.lock();
        let clients = guard.get_or_insert_with(HashMap::new);

        clients.entry(device.clone()).or_insert_with(start).clone()
    }

    /// Register an already started client.
    ///
    /// # Panics
    ///
    /// If `device` already has a client.
    pub fn insert(&self, device: &Device, client: ComputeClient<Server>) {
        let mut guard = self.clients.lock();

        match guard.get_or_insert_with(HashMap::new).entry(device.clone()) {
            Entry::Occupied(_) => panic!("The device {device:?} is already started"),
            Entry::Vacant(slot) => {
                slot.insert(client);
            }
        }
    }
}

impl<Device, Server> Default for ClientRegistry<Device, Server>
where
    Device: Hash + Eq + Clone + Debug,
    Server: ComputeServer,
{
    fn default() -> Self {
        Self::new()
    }
}
