use std::error::Error;
use std::fs;
use std::path::Path;

use ace_core::{SampleBasis, SampleMatrix};
use ace_expand::serde::from_yaml_str;
use ace_expand::AceConfig;
use clap::ValueEnum;
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;

/// Value encoding of a sample file.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Basis {
    /// Entries are -1 or +1.
    Spin,
    /// Entries are 0 or 1.
    Bit,
}

impl From<Basis> for SampleBasis {
    fn from(value: Basis) -> Self {
        match value {
            Basis::Spin => SampleBasis::Spin,
            Basis::Bit => SampleBasis::Bit,
        }
    }
}

/// Reads a header-less CSV with one sample per row.
pub fn read_samples(path: &Path, basis: Basis) -> Result<SampleMatrix, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows: Vec<Vec<i8>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| field.parse::<i8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("row {}: {err}", line + 1))?;
        rows.push(row);
    }
    Ok(SampleMatrix::from_rows(&rows, basis.into())?)
}

/// Writes samples as a header-less CSV in the requested basis.
pub fn write_samples(
    path: &Path,
    samples: &SampleMatrix,
    basis: Basis,
) -> Result<(), Box<dyn Error>> {
    ensure_parent(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    for row in samples.rows() {
        let record: Vec<String> = row
            .iter()
            .map(|&bit| match (basis, bit) {
                (Basis::Spin, 0) => "-1".to_string(),
                (Basis::Spin, _) => "1".to_string(),
                (Basis::Bit, bit) => bit.to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads the YAML config, or builds a default one, and applies overrides.
pub fn load_config(
    path: Option<&Path>,
    threshold: Option<f64>,
    fallback_threshold: Option<f64>,
) -> Result<AceConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => from_yaml_str::<AceConfig>(&fs::read_to_string(path)?)?,
        None => {
            let Some(threshold) = threshold.or(fallback_threshold) else {
                return Err("either --config or --threshold is required".into());
            };
            AceConfig::new(threshold)
        }
    };
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    Ok(config)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    ensure_parent(path)?;
    let json = ace_expand::serde::to_canonical_json_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
