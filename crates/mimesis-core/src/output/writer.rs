//! JSON Writers

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use mimesis_events::StepMetrics;

/// Write any serializable value as pretty JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Append-only JSONL stream of step metrics
pub struct MetricsStream {
    writer: BufWriter<File>,
    lines: u64,
}

impl MetricsStream {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    pub fn write(&mut self, metrics: &StepMetrics) -> std::io::Result<()> {
        let json = serde_json::to_string(metrics)?;
        writeln!(self.writer, "{}", json)?;
        self.lines += 1;
        Ok(())
    }

    pub fn write_all(&mut self, series: &[StepMetrics]) -> std::io::Result<()> {
        for metrics in series {
            self.write(metrics)?;
        }
        Ok(())
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
