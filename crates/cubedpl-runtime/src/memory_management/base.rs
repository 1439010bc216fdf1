/// Amount of memory in use by this allocator and statistics on how much memory is reserved and
/// wasted in total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// The number of allocations currently active.
    pub number_allocs: u64,
    /// The number of bytes that are currently actually in use.
    ///
    /// This doesn't include any padding or other memory that needs to be
    /// reserved, and is the minimum amount of memory that could possible
    /// be allocated.
    pub bytes_in_use: u64,
    /// The amount of bytes used for padding memory in currently active allocations.
    pub bytes_padding: u64,
    /// The total amount of memory reserved on the device.
    ///
    /// This will be at least as much as bytes_in_use but in practice will
    /// be higher, as allocations reserve memory for future allocations
    /// and for padding.
    pub bytes_reserved: u64,
}

impl MemoryUsage {
    /// Calculate the combined memory usage of two reports (summing them).
    pub fn combine(&self, other: MemoryUsage) -> MemoryUsage {
        MemoryUsage {
            number_allocs: self.number_allocs + other.number_allocs,
            bytes_in_use: self.bytes_in_use + other.bytes_in_use,
            bytes_padding: self.bytes_padding + other.bytes_padding,
            bytes_reserved: self.bytes_reserved + other.bytes_reserved,
        }
    }
}

fn bytes_format(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    format!("{value:.2} {}", UNITS[unit])
}

impl core::fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let usage_percentage = if self.bytes_reserved == 0 {
            0.0
        } else {
            (self.bytes_in_use as f32 / self.bytes_reserved as f32) * 100.0
        };
        let padding_percentage = if self.bytes_in_use == 0 {
            0.0
        } else {
            (self.bytes_padding as f32 / self.bytes_in_use as f32) * 100.0
        };
        writeln!(f, "Memory Usage Report:")?;
        writeln!(f, "  Number of allocations: {}", self.number_allocs)?;
        writeln!(f, "  Bytes in use: {}", bytes_format(self.bytes_in_use))?;
        writeln!(
            f,
            "  Bytes used for padding: {}",
            bytes_format(self.bytes_padding)
        )?;
        writeln!(
            f,
            "  Total bytes reserved: {}",
            bytes_format(self.bytes_reserved)
        )?;
        writeln!(f, "  Usage efficiency: {usage_percentage:.2}%")?;
        writeln!(f, "  Padding overhead: {padding_percentage:.2}%")
    }
}

/// Padding needed to round `size` up to a multiple of `alignment`.
pub fn calculate_padding(size: u64, alignment: u64) -> u64 {
    let remainder = size % alignment;
    if remainder != 0 {
        alignment - remainder
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_rounds_to_alignment() {
        assert_eq!(calculate_padding(0, 32), 0);
        assert_eq!(calculate_padding(33, 32), 31);
        assert_eq!(calculate_padding(64, 32), 0);
    }

    #[test]
    fn bytes_are_formatted_with_units() {
        assert_eq!(bytes_format(512), "512 B");
        assert_eq!(bytes_format(1_500), "1.50 KB");
        assert_eq!(bytes_format(2_000_000), "2.00 MB");
    }
}
