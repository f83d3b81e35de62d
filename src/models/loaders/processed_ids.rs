use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Job ids already present in a prior output file (`.csv` or `.json`)
///
/// A missing file yields an empty set.
pub fn load_processed_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let ids = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_from_json(path)?,
        _ => load_from_csv(path)?,
    };

    info!("📋 Found {} already processed jobs", ids.len());
    Ok(ids)
}

fn load_from_csv(path: &Path) -> Result<HashSet<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open csv: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    // zero-byte output from an earlier run that never wrote a row
    if headers.is_empty() {
        return Ok(HashSet::new());
    }
    let Some(id_column) = headers.iter().position(|h| h == "job_id") else {
        anyhow::bail!("no job_id column in {}", path.display());
    };

    let mut ids = HashSet::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("bad csv row in {}", path.display()))?;
        if let Some(id) = row.get(id_column).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

fn load_from_json(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read json: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(HashSet::new());
    }
    let value: JsonValue = serde_json::from_str(&content)
        .with_context(|| format!("cannot parse json: {}", path.display()))?;

    let ids = value
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| match row.get("job_id")? {
                    JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
                    JsonValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(ids)
}
