//! CSV input. Column lookup is by header name so research exports with
//! extra columns load unchanged.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::error::BacktestError;
use crate::model::bar::{Bar, FactorBar};
use crate::model::tick::Tick;

const TIME_COLUMNS: &[&str] = &["timestamp", "tickid", "dealtime", "date_time", "date"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Unix seconds, or a `YYYY-MM-DD[ HH:MM:SS]` date string.
pub fn parse_timestamp(raw: &str) -> Result<i64, BacktestError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).expect("midnight").and_utc().timestamp());
    }
    Err(BacktestError::BadTimestamp(raw.to_string()))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    record
        .get(idx)
        .with_context(|| format!("row {} is missing column {}", line, idx))
}

fn parse_f64(raw: &str, line: usize) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("row {}: '{}' is not a number", line, raw))
}

pub fn load_ticks(path: &Path) -> Result<Vec<Tick>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open tick file {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let ts_idx = find_column(&headers, TIME_COLUMNS)
        .with_context(|| format!("{}: no timestamp column", path.display()))?;
    let price_idx = find_column(&headers, &["price", "close_s", "close"])
        .with_context(|| format!("{}: no price column", path.display()))?;

    let mut ticks = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 2;
        ticks.push(Tick {
            timestamp: parse_timestamp(field(&record, ts_idx, line)?)?,
            price: parse_f64(field(&record, price_idx, line)?, line)?,
        });
    }
    info!(path = %path.display(), rows = ticks.len(), "loaded ticks");
    Ok(ticks)
}

pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open bar file {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let ts_idx = find_column(&headers, TIME_COLUMNS)
        .with_context(|| format!("{}: no timestamp column", path.display()))?;
    let ohlc = ["open", "high", "low", "close"].map(|name| {
        find_column(&headers, &[name])
            .with_context(|| format!("{}: no '{}' column", path.display(), name))
    });
    let [open_idx, high_idx, low_idx, close_idx] = ohlc;
    let (open_idx, high_idx, low_idx, close_idx) = (open_idx?, high_idx?, low_idx?, close_idx?);

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 2;
        bars.push(Bar {
            timestamp: parse_timestamp(field(&record, ts_idx, line)?)?,
            open: parse_f64(field(&record, open_idx, line)?, line)?,
            high: parse_f64(field(&record, high_idx, line)?, line)?,
            low: parse_f64(field(&record, low_idx, line)?, line)?,
            close: parse_f64(field(&record, close_idx, line)?, line)?,
        });
    }
    info!(path = %path.display(), rows = bars.len(), "loaded bars");
    Ok(bars)
}

/// Bars plus one alpha-factor column selected by header name. Empty factor
/// cells become NaN and are skipped by the quantile fit.
pub fn load_factor_bars(path: &Path, factor_column: &str) -> Result<Vec<FactorBar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open factor file {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let ts_idx = find_column(&headers, TIME_COLUMNS)
        .with_context(|| format!("{}: no timestamp column", path.display()))?;
    let factor_idx = find_column(&headers, &[factor_column]).with_context(|| {
        format!("{}: no factor column '{}'", path.display(), factor_column)
    })?;
    let ohlc = ["open", "high", "low", "close"].map(|name| {
        find_column(&headers, &[name])
            .with_context(|| format!("{}: no '{}' column", path.display(), name))
    });
    let [open_idx, high_idx, low_idx, close_idx] = ohlc;
    let (open_idx, high_idx, low_idx, close_idx) = (open_idx?, high_idx?, low_idx?, close_idx?);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 2;
        let raw_factor = field(&record, factor_idx, line)?.trim();
        rows.push(FactorBar {
            timestamp: parse_timestamp(field(&record, ts_idx, line)?)?,
            open: parse_f64(field(&record, open_idx, line)?, line)?,
            high: parse_f64(field(&record, high_idx, line)?, line)?,
            low: parse_f64(field(&record, low_idx, line)?, line)?,
            close: parse_f64(field(&record, close_idx, line)?, line)?,
            factor: if raw_factor.is_empty() {
                f64::NAN
            } else {
                parse_f64(raw_factor, line)?
            },
        });
    }
    info!(
        path = %path.display(),
        factor = factor_column,
        rows = rows.len(),
        "loaded factor bars"
    );
    Ok(rows)
}
