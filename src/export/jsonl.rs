use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::DriveSample;
use crate::remote::UploadRecord;
use crate::storage::SampleStore;

/// `polaris_cellular_data_<yyyyMMdd_HHmmss>.jsonl`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("polaris_cellular_data_{}.jsonl", at.format("%Y%m%d_%H%M%S"))
}

/// Writes one compact JSON record per line
pub fn write_jsonl<W: Write>(samples: &[DriveSample], mut writer: W) -> Result<usize> {
    for sample in samples {
        serde_json::to_writer(&mut writer, &UploadRecord::from(sample))
            .context("Failed to serialize sample")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(samples.len())
}

/// Dumps the whole store into a new file under `dir` and returns its path
///
/// An empty store is an error and creates no file.
pub fn export_jsonl(store: &dyn SampleStore, dir: &Path) -> Result<PathBuf> {
    let samples = store.query_all().context("Failed to read samples")?;
    if samples.is_empty() {
        bail!("No data to export");
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(Local::now()));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let written = write_jsonl(&samples, BufWriter::new(file))?;
    info!("Exported {} samples to {}", written, path.display());
    Ok(path)
}
