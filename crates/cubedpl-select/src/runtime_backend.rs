use crate::{Backend, Waitable};
use cubedpl_runtime::{
    client::ComputeClient,
    runtime::Runtime,
    server::{Event, ServerError},
};

/// Devices of a runtime, the resources being their compute clients.
///
/// Submitted functions enqueue work on the client they receive and usually return an [Event]
/// of the client, completed once the work is executed. Completion is reported to the policies
/// from the device stream.
#[derive(Debug)]
pub struct RuntimeBackend<R: Runtime> {
    clients: Vec<ComputeClient<R::Server>>,
}

impl<R: Runtime> RuntimeBackend<R> {
    /// The clients of the given devices.
    pub fn new(devices: &[R::Device]) -> Self {
        Self {
            clients: devices.iter().map(R::client).collect(),
        }
    }

    /// Use the given clients.
    pub fn from_clients(clients: Vec<ComputeClient<R::Server>>) -> Self {
        Self { clients }
    }
}

impl<R: Runtime> Backend for RuntimeBackend<R> {
    type Resource = ComputeClient<R::Server>;

    fn get_resources(&self) -> Vec<Self::Resource> {
        self.clients.clone()
    }

    fn on_complete(&self, resource: &Self::Resource, callback: Box<dyn FnOnce() + Send>) {
        resource.on_complete(callback);
    }
}

impl Waitable for Event {
    type Output = Result<(), ServerError>;

    fn wait(self) -> Self::Output {
        Event::wait(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DynamicLoadPolicy, FixedResourcePolicy, Policy, RoundRobinPolicy, Submit, SubmitAndWait,
    };
    use cubedpl_runtime::{
        runtime::{CpuDevice, CpuRuntime},
        utils,
    };
    use pretty_assertions::assert_eq;

    fn devices() -> Vec<CpuDevice> {
        vec![CpuDevice::new(20), CpuDevice::new(21)]
    }

    #[test]
    fn round_robin_over_devices() {
        let policy = RoundRobinPolicy::new(RuntimeBackend::<CpuRuntime>::new(&devices())).unwrap();
        let mut outputs = Vec::new();

        for value in 0..4u32 {
            let submission = policy.submit(|client| {
                let handle = client.empty_array::<u32>(64)?;
                utils::fill(client, &handle, 64, value)?;
                Ok::<_, cubedpl_runtime::server::LaunchError>((client.clone(), handle))
            });
            outputs.push(submission);
        }

        for (value, submission) in outputs.into_iter().enumerate() {
            let Ok((client, handle)) = submission.work() else {
                panic!("The submission failed");
            };
            let values = client.read_array::<u32>(handle.clone()).unwrap();
            assert_eq!(values, vec![value as u32; 64]);
        }
    }

    #[test]
    fn load_decreases_once_the_device_completes() {
        let backend = RuntimeBackend::<CpuRuntime>::new(&devices());
        let policy = DynamicLoadPolicy::new(backend).unwrap();

        let result = policy.submit_and_wait(|client| {
            let handle = client.empty_array::<u32>(1024).map_err(ServerError::from)?;
            utils::sequence(client, &handle, 1024).map_err(ServerError::from)?;
            Ok::<_, ServerError>(client.event())
        });
        assert!(matches!(result, Ok(Ok(()))));

        let submission = policy.submit(|client| client.event());
        for client in policy.get_resources() {
            client.sync().unwrap();
        }

        assert!(submission.is_complete());
        assert_eq!(policy.loads(), vec![0, 0]);
        assert!(submission.wait().is_ok());
    }

    #[test]
    fn fixed_resource_over_given_clients() {
        let clients = devices().iter().map(CpuRuntime::client).collect();
        let policy =
            FixedResourcePolicy::new(RuntimeBackend::<CpuRuntime>::from_clients(clients), 1)
                .unwrap();

        let mut output = None;
        let result = policy.submit_and_wait(|client| {
            let handle = client.empty_array::<u32>(8).map_err(ServerError::from)?;
            utils::fill(client, &handle, 8, 5u32).map_err(ServerError::from)?;
            output = Some((client.clone(), handle));
            Ok::<_, ServerError>(client.event())
        });
        assert!(matches!(result, Ok(Ok(()))));

        let (client, handle) = output.unwrap();
        assert_eq!(client.read_array::<u32>(handle).unwrap(), vec![5; 8]);
    }
}
