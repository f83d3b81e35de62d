//! Record persistence - service layer
//!
//! Only knows how to write one finished `JobRecord`; it does not care about
//! flow order or where the record came from. The harness holds a
//! `&mut dyn RecordSink` and never learns the storage format.

use crate::error::SinkError;
use crate::models::{JobRecord, CSV_HEADERS};
use serde_json::Value as JsonValue;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for finished records
pub trait RecordSink: Send {
    fn write(&mut self, record: &JobRecord) -> Result<(), SinkError>;

    /// Where records end up, for logs
    fn location(&self) -> String;
}

/// In-memory sink
impl RecordSink for Vec<JobRecord> {
    fn write(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Appending CSV writer
///
/// The header is written only when the file is new or empty, so a resumed
/// run keeps extending the same file.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();

        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SinkError::io(&display, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(CSV_HEADERS)?;
            writer.flush().map_err(|e| SinkError::io(&display, e))?;
        }

        Ok(Self { path, writer })
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        debug!("💾 csv <- {}", record.job_id);
        self.writer.write_record(record.csv_row())?;
        self.writer
            .flush()
            .map_err(|e| SinkError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// JSON array writer; the whole file is rewritten after every record
pub struct JsonSink {
    path: PathBuf,
    rows: Vec<JsonValue>,
}

impl JsonSink {
    /// Existing rows in `path` are kept and extended
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let rows = match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(SinkError::io(path.display().to_string(), e)),
        };
        Ok(Self { path, rows })
    }
}

impl RecordSink for JsonSink {
    fn write(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        debug!("💾 json <- {}", record.job_id);
        self.rows.push(serde_json::to_value(record)?);
        let content = serde_json::to_string_pretty(&self.rows)?;
        fs::write(&self.path, content)
            .map_err(|e| SinkError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Sink by file extension: `.json` → [`JsonSink`], anything else → [`CsvSink`]
pub fn open_sink(path: impl AsRef<Path>) -> Result<Box<dyn RecordSink>, SinkError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(Box::new(JsonSink::open(path)?))
    } else {
        Ok(Box::new(CsvSink::open(path)?))
    }
}

/// `naukri_jobs_<YYYYmmdd_HHMMSS>.csv`
pub fn default_output_file() -> String {
    format!(
        "naukri_jobs_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
