//! Synthetic log files for trying out the analyzer

use crate::events::{Severity, Timestamp, TIMESTAMP_FORMAT};
use crate::reports::timestamp_suffix;
use chrono::{Duration, Local};
use log::info;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

const SEVERITY_WEIGHTS: [(Severity, u32); 3] = [
    (Severity::Info, 70),
    (Severity::Warning, 20),
    (Severity::Error, 10),
];

fn messages(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Info => &[
            "User login successful",
            "Database query completed",
            "Cache refreshed",
            "Request processed successfully",
            "Data backup completed",
        ],
        Severity::Warning => &[
            "High CPU usage detected",
            "Memory usage above 80%",
            "Disk usage above 90%",
            "Slow database response",
            "Cache miss rate increasing",
        ],
        Severity::Error => &[
            "Database connection failed",
            "API endpoint timeout",
            "Authentication failed",
            "Out of memory error",
            "File system error",
        ],
    }
}

/// Response time range in milliseconds for a severity
fn response_time_range(severity: Severity) -> Range<f64> {
    match severity {
        Severity::Info => 50.0..1000.0,
        Severity::Warning => 1000.0..5000.0,
        Severity::Error => 5000.0..15000.0,
    }
}

/// Writes randomly generated log files in the format the analyzer reads
pub struct LogGenerator {
    output_dir: PathBuf,
}

impl LogGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `count` entries spread over the last `days` days
    pub fn generate_recent(&self, count: usize, days: u32) -> std::io::Result<PathBuf> {
        let end = Local::now().naive_local();
        let start = end - Duration::days(i64::from(days));
        self.generate(count, start, end)
    }

    /// Write `count` entries with timestamps uniform in `[start, end]`
    pub fn generate(&self, count: usize, start: Timestamp, end: Timestamp) -> std::io::Result<PathBuf> {
        self.generate_with(
            &mut rand::thread_rng(),
            count,
            start,
            end,
            Local::now().naive_local(),
        )
    }

    /// Write entries drawn from `rng` to a file stamped with `generated_at`
    pub fn generate_with<R: Rng>(
        &self,
        rng: &mut R,
        count: usize,
        start: Timestamp,
        end: Timestamp,
        generated_at: Timestamp,
    ) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("generated_logs_{}.log", timestamp_suffix(generated_at)));

        let mut writer = BufWriter::new(File::create(&path)?);
        for _ in 0..count {
            writeln!(writer, "{}", Self::entry(rng, start, end))?;
        }
        writer.flush()?;

        info!("Generated {} log entries in {}", count, path.display());
        Ok(path)
    }

    /// One log line with a random timestamp, severity, message and response time
    fn entry<R: Rng>(rng: &mut R, start: Timestamp, end: Timestamp) -> String {
        let span = (end - start).num_seconds().max(0);
        let timestamp = start + Duration::seconds(rng.gen_range(0..=span));

        let severity = Self::severity(rng);
        let message = messages(severity).choose(rng).copied().unwrap_or_default();
        let response_time = rng.gen_range(response_time_range(severity));

        format!(
            "{} {} {} response_time={:.1}",
            timestamp.format(TIMESTAMP_FORMAT),
            severity,
            message,
            response_time
        )
    }

    fn severity<R: Rng>(rng: &mut R) -> Severity {
        // Weights are non-zero constants so construction cannot fail
        match WeightedIndex::new(SEVERITY_WEIGHTS.iter().map(|(_, weight)| *weight)) {
            Ok(dist) => SEVERITY_WEIGHTS[dist.sample(rng)].0,
            Err(_) => Severity::Info,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
