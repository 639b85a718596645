//! Ordinal rankings of the socioeconomic indices
//!
//! Each index column is ranked within its year, rank 1 being the best
//! county. Ties break on ascending county FIPS so every (index, year)
//! ranking is a strict total order and re-runs reproduce identical output.

use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::Result;
use std::collections::HashMap;
use tracing::info;

const INDEX_COLUMNS: [&str; 4] = [
    "socioeconomic_index_balanced",
    "socioeconomic_index_economy_focused",
    "socioeconomic_index_safety_focused",
    "socioeconomic_index_opportunity_focused",
];

pub fn rank_indices(paths: &DataPaths, indices: &Frame) -> Result<Frame> {
    let mut frame = indices.select(&[
        "COUNTY_FIPS",
        "YEAR",
        "STATE",
        "COUNTY",
        "NAME",
        "socioeconomic_index_balanced",
        "socioeconomic_index_economy_focused",
        "socioeconomic_index_safety_focused",
        "socioeconomic_index_opportunity_focused",
    ])?;

    for index_col in INDEX_COLUMNS {
        let rank_idx = frame.add_column(format!("{}_rank", index_col), Cell::Null);

        // rows of each year, ordered best-first
        let mut by_year: HashMap<String, Vec<usize>> = HashMap::new();
        for r in 0..frame.len() {
            let year = frame
                .col("YEAR")
                .map(|c| frame.get(r, c).render())
                .unwrap_or_default();
            by_year.entry(year).or_default().push(r);
        }
        for rows in by_year.values_mut() {
            rows.sort_by(|&a, &b| {
                let va = frame.num(a, index_col);
                let vb = frame.num(b, index_col);
                vb.partial_cmp(&va)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        let fa = frame.text(a, "COUNTY_FIPS").unwrap_or_default();
                        let fb = frame.text(b, "COUNTY_FIPS").unwrap_or_default();
                        fa.cmp(fb)
                    })
            });
            for (position, &r) in rows.iter().enumerate() {
                frame.set(r, rank_idx, Cell::num((position + 1) as f64));
            }
        }
    }

    frame.sort_by(&["COUNTY_FIPS", "YEAR"])?;
    let dest = paths.projected_file(Table::SocioeconomicRankings.name());
    frame.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::SocioeconomicRankings.name(),
        frame.len(),
        dest.display()
    );
    Ok(frame)
}
