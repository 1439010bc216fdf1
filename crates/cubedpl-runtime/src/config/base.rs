use super::{
    execution::ExecutionConfig,
    launch::{LaunchConfig, LaunchLogLevel},
    memory::MemoryConfig,
};
use std::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// File names searched for in the current directory and its parents.
const CONFIG_FILE_NAMES: [&str; 2] = ["cubedpl.toml", "CubeDPL.toml"];

/// Global configuration of the runtime: execution, memory and launch logging settings.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration of the emulated device.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Configuration of the memory pools.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Configuration of launch logging.
    #[serde(default)]
    pub launch: LaunchConfig,
}

/// Error while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file couldn't be read.
    #[error("Can't read the configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The file isn't valid toml for the configuration.
    #[error("The configuration file doesn't have the right format: {0}")]
    Format(#[from] toml::de::Error),
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not
    /// set.
    ///
    /// If no configuration is set, it attempts to load one from `cubedpl.toml` or `CubeDPL.toml`
    /// in the current directory or its parents, then applies the environment overrides. If no
    /// file is found, a default configuration is used.
    pub fn get() -> Arc<Self> {
        let mut state = GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(Self::from_current_dir().override_from_env());
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    pub fn set(config: Self) {
        let mut state = GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Save the current configuration to the provided file path.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }

    /// Overrides configuration fields based on environment variables.
    pub fn override_from_env(self) -> Self {
        self.override_from(|key| std::env::var(key).ok())
    }

    /// Overrides configuration fields from a variable lookup function.
    fn override_from<F: Fn(&str) -> Option<String>>(mut self, var: F) -> Self {
        if let Some(val) = var("CUBEDPL_DEBUG_LOG") {
            let logger = &mut self.launch.logger;
            logger.level = LaunchLogLevel::Full;

            match val.as_str() {
                "stdout" => logger.stdout = true,
                "stderr" => logger.stderr = true,
                "1" | "true" => logger.file = Some("/tmp/cubedpl.log".into()),
                "0" | "false" => logger.level = LaunchLogLevel::Disabled,
                "basic" => {
                    logger.level = LaunchLogLevel::Basic;
                    logger.stdout = true;
                }
                file_path => logger.file = Some(file_path.into()),
            }
        }

        if let Some(workers) = var("CUBEDPL_NUM_WORKERS").and_then(|v| v.parse().ok()) {
            self.execution.num_workers = Some(workers);
        }

        if let Some(plane_size) = var("CUBEDPL_PLANE_SIZE").and_then(|v| v.parse().ok()) {
            self.execution.plane_size = plane_size;
        }

        if let Some(max) = var("CUBEDPL_MAX_MEMORY").and_then(|v| v.parse().ok()) {
            self.memory.max_bytes = Some(max);
        }

        self
    }

    // Traverses up the directory tree until a valid configuration file is found or the root is
    // reached.
    fn from_current_dir() -> Self {
        let Ok(mut dir) = std::env::current_dir() else {
            return Self::default();
        };

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }

                match Self::from_file_path(&path) {
                    Ok(config) => return config,
                    Err(err) => log::warn!("Ignoring {}: {err}", path.display()),
                }
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    /// Loads configuration from a specified file path.
    pub fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses a configuration from toml content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
