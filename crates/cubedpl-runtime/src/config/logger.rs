use super::{
    GlobalConfig,
    launch::{ForwardLevel, LaunchLogLevel, LaunchLoggerConfig},
};
use core::fmt::Display;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

/// Writes launch messages to the sinks of the launch logger configuration.
#[derive(Debug)]
pub struct Logger {
    sinks: Vec<Sink>,
    level: LaunchLogLevel,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Logger of the global configuration.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Logger of the given configuration. A log file that can't be opened is skipped with a
    /// warning.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let settings = &config.launch.logger;
        let sinks = match settings.level {
            LaunchLogLevel::Disabled => Vec::new(),
            _ => Sink::all(settings),
        };
        let level = match sinks.is_empty() {
            true => LaunchLogLevel::Disabled,
            false => settings.level,
        };

        Self { sinks, level }
    }

    /// Write `msg` to every sink.
    pub fn log_launch<S: Display>(&mut self, msg: &S) {
        if let [sink] = self.sinks.as_mut_slice() {
            sink.write(msg);
            return;
        }

        let msg = msg.to_string();
        self.sinks.iter_mut().for_each(|sink| sink.write(&msg));
    }

    /// The effective verbosity, disabled when no sink is enabled.
    pub fn log_level_launch(&self) -> LaunchLogLevel {
        self.level
    }
}

#[derive(Debug)]
enum Sink {
    File(BufWriter<File>),
    Stdout,
    Stderr,
    Forward(ForwardLevel),
}

impl Sink {
    fn all(settings: &LaunchLoggerConfig) -> Vec<Self> {
        let mut sinks = Vec::new();

        if let Some(path) = &settings.file {
            match open_log_file(path, settings.append) {
                Ok(file) => sinks.push(Sink::File(BufWriter::new(file))),
                Err(err) => log::warn!("Can't open log file {}: {err}", path.display()),
            }
        }
        if settings.stdout {
            sinks.push(Sink::Stdout);
        }
        if settings.stderr {
            sinks.push(Sink::Stderr);
        }
        if let Some(level) = settings.log {
            sinks.push(Sink::Forward(level));
        }

        sinks
    }

    fn write<S: Display + ?Sized>(&mut self, msg: &S) {
        match self {
            Sink::File(writer) => {
                if let Err(err) = writeln!(writer, "{msg}").and_then(|_| writer.flush()) {
                    log::warn!("Can't write to the log file: {err}");
                }
            }
            Sink::Stdout => println!("{msg}"),
            Sink::Stderr => eprintln!("{msg}"),
            Sink::Forward(ForwardLevel::Info) => log::info!("{msg}"),
            Sink::Forward(ForwardLevel::Debug) => log::debug!("{msg}"),
            Sink::Forward(ForwardLevel::Trace) => log::trace!("{msg}"),
        }
    }
}

fn open_log_file(path: &Path, append: bool) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::launch::LaunchConfig;

    fn config_with(logger: LaunchLoggerConfig) -> Arc<GlobalConfig> {
        Arc::new(GlobalConfig {
            launch: LaunchConfig { logger },
            ..Default::default()
        })
    }

    #[test]
    fn disabled_level_registers_no_sink() {
        let logger = Logger::from_config(config_with(LaunchLoggerConfig {
            stdout: true,
            ..Default::default()
        }));

        assert_eq!(logger.log_level_launch(), LaunchLogLevel::Disabled);
    }

    #[test]
    fn level_without_sink_is_disabled() {
        let logger = Logger::from_config(config_with(LaunchLoggerConfig {
            level: LaunchLogLevel::Full,
            ..Default::default()
        }));

        assert_eq!(logger.log_level_launch(), LaunchLogLevel::Disabled);
    }

    #[test]
    fn file_sink_receives_messages() {
        let path = std::env::temp_dir().join(format!(
            "cubedpl-logger-test-{}.log",
            std::process::id()
        ));
        let mut logger = Logger::from_config(config_with(LaunchLoggerConfig {
            file: Some(path.clone()),
            append: false,
            level: LaunchLogLevel::Full,
            ..Default::default()
        }));

        logger.log_launch(&"launch scan");
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "launch scan\n");
        std::fs::remove_file(path).unwrap();
    }
}
