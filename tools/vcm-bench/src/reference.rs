//! Reference dataset: circuit-simulator output of the full JART model, one
//! row per time point, columns `Vm, Im, Nd, time, rd, ld` in any order.
//!
//! The compact model is scored by recomputing I at each row's (Vm, Nd, rd, ld)
//! and comparing magnitudes.

use std::path::{Path, PathBuf};

use thiserror::Error;

use jart_vcm::{DeviceError, ModelConstants, Variability};

/// Relative tolerance for matching a row's (rd, ld) to a requested corner.
pub const MATCH_TOLERANCE: f64 = 1e-5;

const COLUMNS: [&str; 6] = ["Vm", "Im", "Nd", "time", "rd", "ld"];

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: missing column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path}:{line}: bad value `{value}` in column `{column}`")]
    BadValue {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRow {
    pub vm: f64,
    pub im: f64,
    pub nd: f64,
    pub time: f64,
    pub rd: f64,
    pub ld: f64,
}

pub fn load(path: &Path) -> Result<Vec<ReferenceRow>, ReferenceError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

/// Parse CSV text. Extra columns (e.g. a leading index) are ignored; blank
/// lines are skipped.
pub fn parse(text: &str, path: &Path) -> Result<Vec<ReferenceRow>, ReferenceError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let header: Vec<&str> = match lines.next() {
        Some((_, l)) => l.split(',').map(clean).collect(),
        None => Vec::new(),
    };
    let mut index = [0usize; 6];
    for (slot, &name) in index.iter_mut().zip(COLUMNS.iter()) {
        *slot = header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| ReferenceError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })?;
    }

    let mut rows = Vec::new();
    for (n, line) in lines {
        let fields: Vec<&str> = line.split(',').map(clean).collect();
        let mut v = [0.0; 6];
        for k in 0..6 {
            let raw = fields.get(index[k]).copied().unwrap_or("");
            v[k] = raw.parse().map_err(|_| ReferenceError::BadValue {
                path: path.to_path_buf(),
                line: n + 1,
                column: COLUMNS[k],
                value: raw.to_string(),
            })?;
        }
        rows.push(ReferenceRow {
            vm: v[0],
            im: v[1],
            nd: v[2],
            time: v[3],
            rd: v[4],
            ld: v[5],
        });
    }
    log::debug!("reference: {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn clean(field: &str) -> &str {
    field.trim().trim_matches('"')
}

fn close(a: f64, b: f64) -> bool {
    (1.0 - a / b).abs() < MATCH_TOLERANCE
}

/// Rows recorded for the (rd, ld) corner.
pub fn select(rows: &[ReferenceRow], rd: f64, ld: f64) -> Vec<ReferenceRow> {
    rows.iter()
        .filter(|r| close(r.rd, rd) && close(r.ld, ld))
        .copied()
        .collect()
}

/// Distinct (rd, ld) corners present, in order of first appearance.
pub fn corners_present(rows: &[ReferenceRow]) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::new();
    for r in rows {
        if !out.iter().any(|&(rd, ld)| close(r.rd, rd) && close(r.ld, ld)) {
            out.push((r.rd, r.ld));
        }
    }
    out
}

/// Relative error statistics of |I| over a set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Rows scored.
    pub rows: usize,
    /// Rows skipped: zero reference current or non-finite model current.
    pub skipped: usize,
    pub max_rel_error: f64,
    pub median_rel_error: f64,
    /// Row with the largest error.
    pub worst: Option<ReferenceRow>,
}

/// Score the model against reference rows. Every row's (rd, ld) must be a
/// valid variability pair.
pub fn compare(constants: &ModelConstants, rows: &[ReferenceRow]) -> Result<Comparison, DeviceError> {
    let mut errors = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    let mut worst: Option<(f64, ReferenceRow)> = None;

    for row in rows {
        let var = Variability::new(row.rd, row.ld)?;
        let model = jart_vcm::current::current(constants, row.vm, row.nd, &var);
        if row.im == 0.0 || !model.is_finite() {
            skipped += 1;
            continue;
        }
        let err = (model.abs() - row.im.abs()).abs() / row.im.abs();
        if worst.is_none_or(|(e, _)| err > e) {
            worst = Some((err, *row));
        }
        errors.push(err);
    }

    errors.sort_by(|a, b| a.total_cmp(b));
    let median_rel_error = match errors.len() {
        0 => f64::NAN,
        n if n % 2 == 1 => errors[n / 2],
        n => 0.5 * (errors[n / 2 - 1] + errors[n / 2]),
    };

    Ok(Comparison {
        rows: errors.len(),
        skipped,
        max_rel_error: errors.last().copied().unwrap_or(f64::NAN),
        median_rel_error,
        worst: worst.map(|(_, r)| r),
    })
}
