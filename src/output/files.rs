//! Filesystem-backed sinks
//!
//! Both sinks stamp file names with the current epoch milliseconds and
//! create their directory on first use.

use crate::output::traits::{OutputResult, ResultSink, TraceSink};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Current time as milliseconds since the Unix epoch
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Writes each failing page to `{dir}/trace_{epochMillis}.html`
#[derive(Debug, Clone)]
pub struct FileTraceSink {
    dir: PathBuf,
}

impl FileTraceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TraceSink for FileTraceSink {
    fn save_trace(&self, body: &str) -> OutputResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("trace_{}.html", epoch_millis()));
        tracing::info!("Saving file {}", path.display());
        fs::write(&path, body)?;
        Ok(path)
    }
}

/// Writes each collection as a JSON array to `{dir}/{name}_{epochMillis}.json`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ResultSink for JsonFileSink {
    fn persist<T: Serialize>(&self, records: &[T], name: &str) -> OutputResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}_{}.json", name, epoch_millis()));
        tracing::info!("Saving file {}", path.display());

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;

        Ok(path)
    }
}
