//! Per-group z-scores over metric columns
//!
//! Cleaned tables carry a `<METRIC>_Z_SCORE` column for every numeric
//! metric so the dashboard can compare counties within a year without
//! recomputing statistics. Scores use the sample standard deviation and
//! are rounded to 4 decimal places; a zero or undefined deviation yields
//! zero scores, matching the conventions of the index computation.

use crate::frame::{Cell, Frame};
use migra_common::Result;

/// Columns never scored
const NON_METRIC: [&str; 6] = ["COUNTY_FIPS", "YEAR", "POPULATION", "STATE", "COUNTY", "NAME"];

/// Append z-score columns for every numeric metric, computed within each
/// distinct value of `group_col` (usually `YEAR`, or `SCENARIO` for
/// projected tables).
pub fn add_z_scores(frame: &mut Frame, group_col: &str) -> Result<()> {
    let metric_cols: Vec<String> = frame
        .columns()
        .iter()
        .filter(|c| {
            !NON_METRIC.contains(&c.as_str())
                && c != &group_col
                && !c.ends_with("_Z_SCORE")
                && frame.is_numeric(c)
        })
        .cloned()
        .collect();

    let group_idx = frame.require_col(group_col)?;
    let groups = frame.unique(group_col)?;

    for metric in &metric_cols {
        let metric_idx = frame.require_col(metric)?;
        let z_idx = frame.add_column(format!("{}_Z_SCORE", metric), Cell::Null);

        for group in &groups {
            let member_rows: Vec<usize> = (0..frame.len())
                .filter(|&r| frame.get(r, group_idx).render() == *group)
                .collect();

            let values: Vec<f64> = member_rows
                .iter()
                .filter_map(|&r| frame.get(r, metric_idx).as_num())
                .collect();
            if values.is_empty() {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let std = if values.len() < 2 {
                0.0
            } else {
                (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (values.len() - 1) as f64)
                    .sqrt()
            };

            for &r in &member_rows {
                let cell = match frame.get(r, metric_idx).as_num() {
                    None => Cell::Null,
                    Some(_) if std == 0.0 => Cell::num(0.0),
                    Some(v) => Cell::num(round4((v - mean) / std)),
                };
                frame.set(r, z_idx, cell);
            }
        }
    }
    Ok(())
}

pub(crate) fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
