use crate::{
    cube::{CubeContext, CubeDim, LaunchAborted},
    kernel::{CubeKernel, KernelBindings},
    server::{Binding, ServerError},
};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// A kernel launch shared by the workers of a device.
///
/// Workers pull cube positions from a shared counter until the grid is exhausted, so a cube is
/// always executed from start to end by a single worker.
pub(crate) struct LaunchTask {
    pub kernel: Box<dyn CubeKernel>,
    pub bindings: KernelBindings,
    pub cube_count: u32,
    pub cube_dim: CubeDim,
    pub plane_dim: u32,
    pub spin_budget: u32,
    next_cube: AtomicU32,
    abort: AtomicBool,
    failure: spin::Mutex<Option<ServerError>>,
    // Keeps the memory reserved until the launch completed.
    _bindings: Vec<Binding>,
}

impl LaunchTask {
    pub fn new(
        kernel: Box<dyn CubeKernel>,
        bindings: KernelBindings,
        keep_alive: Vec<Binding>,
        cube_count: u32,
        plane_dim: u32,
        spin_budget: u32,
    ) -> Self {
        let cube_dim = kernel.cube_dim();

        Self {
            kernel,
            bindings,
            cube_count,
            cube_dim,
            plane_dim,
            spin_budget,
            next_cube: AtomicU32::new(0),
            abort: AtomicBool::new(false),
            failure: spin::Mutex::new(None),
            _bindings: keep_alive,
        }
    }

    /// Execute cubes until none is left.
    pub fn run(&self) {
        loop {
            if self.abort.load(Ordering::Relaxed) {
                return;
            }

            let cube_pos = self.next_cube.fetch_add(1, Ordering::Relaxed);
            if cube_pos >= self.cube_count {
                return;
            }

            let ctx = CubeContext::new(
                cube_pos,
                self.cube_count,
                self.cube_dim,
                self.plane_dim,
                self.spin_budget,
                &self.abort,
            );
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.kernel.execute(&ctx, &self.bindings)
            }));

            if let Err(payload) = result {
                self.abort.store(true, Ordering::Relaxed);

                if payload.is::<LaunchAborted>() {
                    return;
                }

                let reason = match payload.downcast::<String>() {
                    Ok(msg) => *msg,
                    Err(payload) => match payload.downcast::<&'static str>() {
                        Ok(msg) => msg.to_string(),
                        Err(_) => "unknown panic payload".to_string(),
                    },
                };

                let mut failure = self.failure.lock();
                if failure.is_none() {
                    *failure = Some(ServerError::KernelPanic {
                        kernel: self.kernel.name(),
                        cube: cube_pos,
                        reason,
                    });
                }
                return;
            }
        }
    }

    /// The error raised by the launch, if any.
    pub fn take_failure(&self) -> Option<ServerError> {
        self.failure.lock().take()
    }
}
