use super::Profiled;
use crate::{
    config::{Logger, launch::LaunchLogLevel},
    cube::CubeDim,
};
use core::time::Duration;

/// Logger owned by the stream of a device, recording kernel launches.
#[derive(Debug)]
pub struct ServerLogger {
    logger: Logger,
    level: LaunchLogLevel,
    profiled: Profiled,
}

impl Default for ServerLogger {
    fn default() -> Self {
        Self::new(Logger::new())
    }
}

impl ServerLogger {
    /// Create a server logger writing to the given logger.
    pub fn new(logger: Logger) -> Self {
        let level = logger.log_level_launch();

        Self {
            logger,
            level,
            profiled: Profiled::default(),
        }
    }

    /// The active launch log level.
    pub fn level(&self) -> LaunchLogLevel {
        self.level
    }

    /// Register an executed launch.
    pub fn register_launch(
        &mut self,
        name: &'static str,
        cubes: u32,
        cube_dim: CubeDim,
        duration: Duration,
    ) {
        match self.level {
            LaunchLogLevel::Disabled => {}
            LaunchLogLevel::Basic => self.profiled.update(name, cubes, duration),
            LaunchLogLevel::Full => {
                self.profiled.update(name, cubes, duration);
                self.logger.log_launch(&format_args!(
                    "| {duration:<12?} | {name} cubes={cubes} cube_dim=({}, {}, {})",
                    cube_dim.x, cube_dim.y, cube_dim.z
                ));
            }
        }
    }

    /// Show the profiling summary if activated and reset its state.
    pub fn profile_summary(&mut self) {
        if self.level == LaunchLogLevel::Disabled {
            return;
        }

        let profiled = core::mem::take(&mut self.profiled);
        if !profiled.is_empty() {
            self.logger.log_launch(&profiled);
        }
    }
}

impl Drop for ServerLogger {
    fn drop(&mut self) {
        self.profile_summary();
    }
}
