/// Configuration of the device memory pool.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of bytes the device can reserve, unlimited when not set.
    #[serde(default)]
    pub max_bytes: Option<u64>,

    /// Smallest page allocated by the pool.
    #[serde(default = "min_page_size_default")]
    pub min_page_size: u64,

    /// Number of reservations after which free pages are returned to the system.
    #[serde(default = "dealloc_period_default")]
    pub dealloc_period: u64,
}

fn min_page_size_default() -> u64 {
    256
}

fn dealloc_period_default() -> u64 {
    1000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_bytes: None,
            min_page_size: min_page_size_default(),
            dealloc_period: dealloc_period_default(),
        }
    }
}
