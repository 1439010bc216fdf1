use std::path::PathBuf;

/// Configuration for launch logging.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LaunchConfig {
    /// Where and how much kernel launches are logged.
    #[serde(default)]
    pub logger: LaunchLoggerConfig,
}

/// Sinks and verbosity of the launch logger. Several sinks can be enabled together.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LaunchLoggerConfig {
    /// Log file, created with its parent directories when missing.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Append to the log file instead of truncating it.
    #[serde(default = "default_append")]
    pub append: bool,

    /// Print to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Print to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Forward to the `log` facade at this level.
    #[serde(default)]
    pub log: Option<ForwardLevel>,

    /// Verbosity of the launch logs.
    #[serde(default)]
    pub level: LaunchLogLevel,
}

impl Default for LaunchLoggerConfig {
    fn default() -> Self {
        Self {
            file: None,
            append: default_append(),
            stdout: false,
            stderr: false,
            log: None,
            level: LaunchLogLevel::Disabled,
        }
    }
}

fn default_append() -> bool {
    true
}

/// Level of the records forwarded to the `log` facade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardLevel {
    /// `log::info!`.
    #[default]
    Info,
    /// `log::debug!`.
    Debug,
    /// `log::trace!`.
    Trace,
}

/// Log levels for kernel launches.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchLogLevel {
    /// Launch logging is disabled.
    #[default]
    Disabled,

    /// Only a summary table is logged when the device stream stops.
    Basic,

    /// Every launch is logged with its name, cube count and duration.
    Full,
}
