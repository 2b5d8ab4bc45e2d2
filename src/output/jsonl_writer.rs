//! JSONL writer for analysis results - one file per table under `<base>/<year>/<partition>/`

use super::rows::RunKey;
use super::writer_backend::{ResultRecord, ResultWriterBackend, ResultWriterError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub struct JsonlResultWriter {
    base_path: PathBuf,
    writers: HashMap<(i32, &'static str, &'static str), BufWriter<std::fs::File>>,
}

impl JsonlResultWriter {
    pub fn new(base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        log::info!("📝 Writing JSONL results under: {}", base_path.display());

        Ok(Self {
            base_path,
            writers: HashMap::new(),
        })
    }

    /// Path of the file holding `table` rows for `key`
    pub fn file_path(&self, key: RunKey, table: &str) -> PathBuf {
        self.base_path
            .join(key.year.to_string())
            .join(key.partition.as_str())
            .join(format!("{}.jsonl", table))
    }

    fn writer_for(
        &mut self,
        key: RunKey,
        table: &'static str,
    ) -> std::io::Result<&mut BufWriter<std::fs::File>> {
        let slot = (key.year, key.partition.as_str(), table);
        if !self.writers.contains_key(&slot) {
            let path = self.file_path(key, table);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            log::debug!("📝 Opened {}", path.display());
            self.writers.insert(slot, BufWriter::new(file));
        }
        self.writers
            .get_mut(&slot)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Writer not found"))
    }

    pub fn write_record(&mut self, key: RunKey, record: &ResultRecord) -> Result<(), ResultWriterError> {
        let json = serde_json::to_string(record)?;
        let writer = self.writer_for(key, record.table())?;
        writeln!(writer, "{}", json)?;
        Ok(())
    }

    pub fn flush_all(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonlResultWriter {
    fn drop(&mut self) {
        let _ = self.flush_all();
    }
}

#[async_trait]
impl ResultWriterBackend for JsonlResultWriter {
    async fn write(&mut self, key: RunKey, record: &ResultRecord) -> Result<(), ResultWriterError> {
        self.write_record(key, record)
    }

    async fn flush(&mut self) -> Result<(), ResultWriterError> {
        self.flush_all()?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}
