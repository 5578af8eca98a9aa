//! Per-day statistics history
//!
//! One [`DayStatistics`] record is appended per simulated day. When the
//! epidemic dies out early the last record is the terminal state.

use crate::solver::PopulationCounts;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// CSV header of the statistics file
pub const STATISTICS_CSV_HEADER: &str = "Day,Susceptible,Infected,Recovered,Dead,R0";

/// Aggregate state at the end of one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayStatistics {
    /// Day number, starting at 1
    pub day: u32,
    /// Susceptible individuals
    pub susceptible: usize,
    /// Infected individuals
    pub infected: usize,
    /// Recovered individuals
    pub recovered: usize,
    /// Dead individuals
    pub dead: usize,
    /// Cumulative attack ratio (reported as R0)
    pub r0: f64,
}

impl DayStatistics {
    /// Build a record from population counts
    pub fn new(day: u32, counts: PopulationCounts, r0: f64) -> Self {
        Self {
            day,
            susceptible: counts.susceptible,
            infected: counts.infected,
            recovered: counts.recovered,
            dead: counts.dead,
            r0,
        }
    }

    /// Population counts of this record
    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            susceptible: self.susceptible,
            infected: self.infected,
            recovered: self.recovered,
            dead: self.dead,
        }
    }

    /// CSV line without trailing newline, R0 with four decimals
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.4}",
            self.day, self.susceptible, self.infected, self.recovered, self.dead, self.r0
        )
    }
}

/// Append-only list of day records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsHistory {
    days: Vec<DayStatistics>,
}

impl StatisticsHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record for `day`
    pub fn record_day(&mut self, day: u32, counts: PopulationCounts, r0: f64) -> DayStatistics {
        let record = DayStatistics::new(day, counts, r0);
        self.days.push(record);
        record
    }

    /// All records in day order
    pub fn history(&self) -> &[DayStatistics] {
        &self.days
    }

    /// Most recent record
    pub fn last(&self) -> Option<&DayStatistics> {
        self.days.last()
    }

    /// Number of recorded days
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True before the first record
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Write the history as CSV
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{STATISTICS_CSV_HEADER}")?;
        for record in &self.days {
            writeln!(writer, "{}", record.to_csv_row())?;
        }
        writer.flush()
    }
}
