//! # Telemetry Module
//!
//! Handles weight-sample logging to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting emitted samples as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files
//!
//! Logging runs on the presentation side of the notification channel, never
//! on the session worker, so a slow disk cannot stall acquisition.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::board::sample::WeightSample;
use crate::config::TelemetryConfig;
use crate::error::Result;

/// Log file name prefix
const FILE_PREFIX: &str = "samples-";

/// Log file name extension
const FILE_EXT: &str = ".jsonl";

/// One JSONL record
#[derive(Debug, Serialize)]
pub struct SampleRecord {
    /// RFC 3339 timestamp
    pub ts: String,
    pub total_kg: f32,
    pub top_right_kg: f32,
    pub bottom_right_kg: f32,
    pub top_left_kg: f32,
    pub bottom_left_kg: f32,
    pub com_x: f32,
    pub com_y: f32,
}

impl SampleRecord {
    fn new(sample: &WeightSample) -> Self {
        let [tr, br, tl, bl] = sample.quadrants_kg;
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            total_kg: sample.total_kg,
            top_right_kg: tr,
            bottom_right_kg: br,
            top_left_kg: tl,
            bottom_left_kg: bl,
            com_x: sample.center_of_mass.0,
            com_y: sample.center_of_mass.1,
        }
    }
}

/// JSONL sample logger with file rotation
///
/// A disabled logger is a no-op and touches no files.
pub struct SampleLogger {
    enabled: bool,
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_seq: u32,
}

impl SampleLogger {
    /// Create a logger from configuration, creating the log directory if
    /// logging is enabled.
    ///
    /// # Errors
    ///
    /// Returns error if the log directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        if config.enabled {
            fs::create_dir_all(&config.log_dir)?;
        }
        Ok(Self {
            enabled: config.enabled,
            log_dir: PathBuf::from(&config.log_dir),
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            writer: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// Append one sample record, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be serialized or written.
    pub fn log(&mut self, sample: &WeightSample) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = SampleRecord::new(sample);
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // rotate() always leaves a writer behind
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Start a new log file and prune old ones past the retention limit.
    fn rotate(&mut self) -> Result<()> {
        self.writer = None;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let name = format!("{}{}-{:04}{}", FILE_PREFIX, stamp, self.file_seq, FILE_EXT);
        self.file_seq += 1;

        let path = self.log_dir.join(&name);
        debug!("Rotating sample log to {}", path.display());
        let file = File::create(&path)?;
        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;

        self.prune_old_files();
        Ok(())
    }

    /// Remove the oldest log files beyond `max_files_to_keep`.
    ///
    /// Failures here are warnings: a full retention directory must not stop
    /// sample logging.
    fn prune_old_files(&self) {
        let entries = match fs::read_dir(&self.log_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan log dir: {}", e);
                return;
            }
        };

        let mut logs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXT))
            })
            .collect();

        if logs.len() <= self.max_files_to_keep {
            return;
        }

        // Names embed timestamp + sequence, so lexicographic order is age order
        logs.sort();
        let excess = logs.len() - self.max_files_to_keep;
        for path in logs.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Could not prune {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_for(dir: &std::path::Path, max_records: usize, max_files: usize) -> TelemetryConfig {
        TelemetryConfig {
            enabled: true,
            log_dir: dir.to_string_lossy().to_string(),
            max_records_per_file: max_records,
            max_files_to_keep: max_files,
        }
    }

    fn sample() -> WeightSample {
        WeightSample::from_quadrants([10.0, 10.0, 20.0, 20.0], 0.2)
    }

    fn log_files(dir: &std::path::Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut config = config_for(dir.path(), 10, 2);
        config.enabled = false;

        let mut logger = SampleLogger::new(&config).unwrap();
        logger.log(&sample()).unwrap();

        assert!(log_files(dir.path()).is_empty());
    }

    #[test]
    fn test_records_are_valid_jsonl() {
        let dir = tempdir().unwrap();
        let mut logger = SampleLogger::new(&config_for(dir.path(), 10, 2)).unwrap();

        logger.log(&sample()).unwrap();
        logger.log(&sample()).unwrap();

        let files = log_files(dir.path());
        assert_eq!(files.len(), 1);

        let contents = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["total_kg"], 60.0);
        assert_eq!(parsed["top_left_kg"], 20.0);
        assert!(parsed["ts"].is_string());
        assert!(parsed["com_x"].as_f64().unwrap() < 0.0);
    }

    #[test]
    fn test_rotation_after_max_records() {
        let dir = tempdir().unwrap();
        let mut logger = SampleLogger::new(&config_for(dir.path(), 2, 10)).unwrap();

        for _ in 0..5 {
            logger.log(&sample()).unwrap();
        }

        // 2 + 2 + 1 records across three files
        let files = log_files(dir.path());
        assert_eq!(files.len(), 3);

        let last = fs::read_to_string(files.last().unwrap()).unwrap();
        assert_eq!(last.lines().count(), 1);
    }

    #[test]
    fn test_pruning_keeps_newest_files() {
        let dir = tempdir().unwrap();
        let mut logger = SampleLogger::new(&config_for(dir.path(), 1, 2)).unwrap();

        for _ in 0..5 {
            logger.log(&sample()).unwrap();
        }

        let files = log_files(dir.path());
        assert_eq!(files.len(), 2);

        // The surviving files are the two highest sequence numbers
        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names[0] < names[1]);
        assert!(names[1].contains("-0004"));
    }

    #[test]
    fn test_logger_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut logger = SampleLogger::new(&config_for(&nested, 10, 2)).unwrap();

        logger.log(&sample()).unwrap();
        assert_eq!(log_files(&nested).len(), 1);
    }
}
