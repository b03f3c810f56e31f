//! 运行结果.

use std::io::{self, Write};

use pet_indic::prelude::*;

const SEP: &str = "--------------------------------------------------------";

/// 全部标签的统计结果.
pub struct Report {
    units: ImageUnits,
    results: Vec<(u8, StatisticsResult)>,
}

impl Report {
    pub fn new(units: ImageUnits, results: Vec<(u8, StatisticsResult)>) -> Self {
        Self { units, results }
    }

    /// 将每个标签的结果表格写进 `w` 中.
    pub fn describe_into<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "Voxel units: {}", self.units.units().unwrap_or("-"))?;
        for (label, result) in &self.results {
            writeln!(w, "{SEP}")?;
            writeln!(w, "Label {label}:")?;
            if result.is_empty() {
                writeln!(w, "    (no statistics available)")?;
                continue;
            }
            write!(w, "{}", ResultsTable::from_statistics(result, &self.units).to_text())?;
        }
        writeln!(w, "{SEP}")?;
        w.flush()
    }
}
