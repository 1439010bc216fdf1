use core::{fmt::Display, time::Duration};
use hashbrown::HashMap;

/// Accumulated launch statistics, keyed by kernel name.
#[derive(Debug, Default)]
pub struct Profiled {
    launches: HashMap<&'static str, ProfileItem>,
}

#[derive(Debug, Default, Clone)]
struct ProfileItem {
    total_duration: Duration,
    num_launches: usize,
    num_cubes: u64,
}

impl Profiled {
    /// If some launch was profiled.
    pub fn is_empty(&self) -> bool {
        self.launches.is_empty()
    }

    /// Number of launches registered for the kernel.
    pub fn num_launches(&self, name: &str) -> usize {
        self.launches
            .get(name)
            .map(|item| item.num_launches)
            .unwrap_or(0)
    }

    /// Register a launch.
    pub fn update(&mut self, name: &'static str, cubes: u32, duration: Duration) {
        let item = self.launches.entry(name).or_default();
        item.total_duration += duration;
        item.num_launches += 1;
        item.num_cubes += cubes as u64;
    }
}

impl Display for Profiled {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let headers = ["Name", "Duration", "Launches", "Cubes", "Ratio"];

        let total_duration: Duration = self.launches.values().map(|i| i.total_duration).sum();
        let total_launches: usize = self.launches.values().map(|i| i.num_launches).sum();
        let total_cubes: u64 = self.launches.values().map(|i| i.num_cubes).sum();

        let mut items: Vec<(&str, &ProfileItem)> =
            self.launches.iter().map(|(name, item)| (*name, item)).collect();
        items.sort_by(|(_, a), (_, b)| b.total_duration.cmp(&a.total_duration));

        let ratio = |duration: Duration| match total_duration.as_micros() {
            0 => "100 %".to_string(),
            total => format!("{} %", (100 * duration.as_micros()) / total),
        };

        let mut rows: Vec<[String; 5]> = items
            .into_iter()
            .map(|(name, item)| {
                [
                    name.to_string(),
                    format!("{:?}", item.total_duration),
                    item.num_launches.to_string(),
                    item.num_cubes.to_string(),
                    ratio(item.total_duration),
                ]
            })
            .collect();
        rows.push([
            "Total".to_string(),
            format!("{total_duration:?}"),
            total_launches.to_string(),
            total_cubes.to_string(),
            "100 %".to_string(),
        ]);

        let mut widths = headers.map(str::len);
        for row in rows.iter() {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = usize::max(*width, cell.len());
            }
        }

        let line_length = widths.iter().sum::<usize>() + 3 * widths.len() + 1;
        let write_row = |cells: &[&str], f: &mut core::fmt::Formatter<'_>| {
            write!(f, "|")?;
            for (cell, width) in cells.iter().zip(widths.iter()) {
                write!(f, " {cell:<width$} |")?;
            }
            writeln!(f)
        };

        writeln!(f, "{}", "-".repeat(line_length))?;
        write_row(&headers, f)?;
        writeln!(f, "{}", "-".repeat(line_length))?;
        let Some((total, rows)) = rows.split_last() else {
            return Ok(());
        };
        for row in rows {
            write_row(&row.each_ref().map(String::as_str), f)?;
        }
        writeln!(f, "{}", "-".repeat(line_length))?;
        write_row(&total.each_ref().map(String::as_str), f)?;
        writeln!(f, "{}", "-".repeat(line_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_kernels_by_duration() {
        let mut profiled = Profiled::default();
        profiled.update("scan", 4, Duration::from_millis(3));
        profiled.update("scan", 4, Duration::from_millis(3));
        profiled.update("histogram", 2, Duration::from_millis(10));

        let table = profiled.to_string();
        let histogram = table.find("histogram").unwrap();
        let scan = table.find("scan").unwrap();

        assert!(histogram < scan);
        assert_eq!(profiled.num_launches("scan"), 2);
        assert!(table.contains("| Total"));
    }
}
