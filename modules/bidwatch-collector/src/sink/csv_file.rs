use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use bidwatch_common::{PrimaryKey, SheetRow, SHEET_HEADER};

use crate::traits::NoticeSink;

/// Local CSV file with the same columns as the sheet.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_empty(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true)
    }

    fn appender(&self) -> Result<csv::Writer<std::fs::File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
    }
}

#[async_trait]
impl NoticeSink for CsvSink {
    async fn ensure_header(&self) -> Result<()> {
        if !self.is_empty() {
            return Ok(());
        }
        let mut writer = self.appender()?;
        writer.write_record(SHEET_HEADER)?;
        writer.flush()?;
        info!(path = %self.path.display(), "Wrote header row");
        Ok(())
    }

    async fn existing_keys(&self, lookback: usize) -> Result<HashSet<PrimaryKey>> {
        if self.is_empty() {
            return Ok(HashSet::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;

        let mut keys = Vec::new();
        for record in reader.records() {
            let record = record?;
            keys.push(record.get(0).unwrap_or_default().to_string());
        }

        let skip = keys.len().saturating_sub(lookback);
        Ok(keys
            .into_iter()
            .skip(skip)
            .filter(|key| !key.is_empty())
            .map(PrimaryKey::new)
            .collect())
    }

    async fn append_rows(&self, rows: &[SheetRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut writer = self.appender()?;
        for row in rows {
            writer.write_record(row.to_cells())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}
