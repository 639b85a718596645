//! Historical socioeconomic indices
//!
//! Joins the five observation tables, min-max normalizes every metric
//! within its year so counties are compared against contemporaries, and
//! averages the normalized metrics into five category scores. Each index
//! profile is a weighted sum of the category scores; "bad" metrics are
//! inverted before averaging so a higher index always reads as better.

use crate::cleaning::zscore::round4;
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::{Error, Result};
use tracing::info;

const KEY_COLUMNS: [&str; 6] = ["COUNTY_FIPS", "YEAR", "STATE", "COUNTY", "NAME", "POPULATION"];

/// Metrics where a larger value means a worse county
const INVERTED_METRICS: [&str; 4] = [
    "CRIMINAL_ACTIVITIES",
    "UNEMPLOYMENT_RATE",
    "LESS_THAN_HIGH_SCHOOL_UNEMPLOYED",
    "HOUSE_AFFORDABILITY",
];

const CRIME_METRICS: [&str; 1] = ["CRIMINAL_ACTIVITIES"];
const ECONOMIC_METRICS: [&str; 3] = [
    "MEDIAN_INCOME",
    "TOTAL_EMPLOYED_POPULATION",
    "UNEMPLOYMENT_RATE",
];
const EDUCATION_METRICS: [&str; 3] = [
    "BACHELORS_OR_HIGHER_TOTAL",
    "TOTAL_ENROLLED",
    "LESS_THAN_HIGH_SCHOOL_UNEMPLOYED",
];
const HOUSING_METRICS: [&str; 3] = [
    "MEDIAN_HOUSING_VALUE",
    "MEDIAN_GROSS_RENT",
    "HOUSE_AFFORDABILITY",
];
const JOB_OPENING_METRICS: [&str; 12] = [
    "JOB_OPENING_JAN",
    "JOB_OPENING_FEB",
    "JOB_OPENING_MAR",
    "JOB_OPENING_APR",
    "JOB_OPENING_MAY",
    "JOB_OPENING_JUN",
    "JOB_OPENING_JUL",
    "JOB_OPENING_AUG",
    "JOB_OPENING_SEP",
    "JOB_OPENING_OCT",
    "JOB_OPENING_NOV",
    "JOB_OPENING_DEC",
];

/// (category score column, member metrics)
const CATEGORIES: [(&str, &[&str]); 5] = [
    ("crime_score", &CRIME_METRICS),
    ("economic_score", &ECONOMIC_METRICS),
    ("education_score", &EDUCATION_METRICS),
    ("housing_score", &HOUSING_METRICS),
    ("job_openings_score", &JOB_OPENING_METRICS),
];

/// Weight profiles over (crime, economic, education, housing, job openings)
const INDEX_PROFILES: [(&str, [f64; 5]); 4] = [
    ("balanced", [0.2, 0.2, 0.2, 0.2, 0.2]),
    ("economy_focused", [0.1, 0.4, 0.2, 0.2, 0.1]),
    ("safety_focused", [0.4, 0.2, 0.1, 0.2, 0.1]),
    ("opportunity_focused", [0.1, 0.2, 0.3, 0.1, 0.3]),
];

fn read_metrics(paths: &DataPaths, table: Table, metrics: &[&str]) -> Result<Frame> {
    let path = paths.cleaned_file(table.name());
    let source = path.display().to_string();
    let frame = Frame::from_csv(&path)?;
    let mut columns: Vec<&str> = KEY_COLUMNS.to_vec();
    columns.extend(metrics.iter());
    let mut frame = frame.select(&columns)?;
    let mut numeric: Vec<&str> = vec!["YEAR", "POPULATION"];
    numeric.extend(metrics.iter());
    frame.coerce_numeric(&numeric, &source)?;
    Ok(frame)
}

/// All observation metrics joined on the six key columns. Only
/// county-years present in every table survive.
fn joined_metrics(paths: &DataPaths) -> Result<Frame> {
    let on: Vec<&str> = KEY_COLUMNS.to_vec();
    let frame = read_metrics(paths, Table::CleanedCrime, &CRIME_METRICS)?;
    let frame = frame.inner_join(
        &read_metrics(paths, Table::CleanedEconomic, &ECONOMIC_METRICS)?,
        &on,
    )?;
    let frame = frame.inner_join(
        &read_metrics(paths, Table::CleanedEducation, &EDUCATION_METRICS)?,
        &on,
    )?;
    let frame = frame.inner_join(
        &read_metrics(paths, Table::CleanedHousing, &HOUSING_METRICS)?,
        &on,
    )?;
    let frame = frame.inner_join(
        &read_metrics(paths, Table::CleanedJobOpenings, &JOB_OPENING_METRICS)?,
        &on,
    )?;
    if frame.is_empty() {
        return Err(Error::NotFound(
            "no county-years shared by all observation tables".into(),
        ));
    }
    Ok(frame)
}

/// Min-max position of a value, inverted for "bad" metrics.
/// A constant column normalizes to 0 for every county.
fn normalize(value: f64, min: f64, max: f64, inverted: bool) -> f64 {
    if max == min {
        return 0.0;
    }
    let scaled = (value - min) / (max - min);
    if inverted {
        1.0 - scaled
    } else {
        scaled
    }
}

/// Compute `socioeconomic_indices` and write it under projected data
pub fn compute_indices(paths: &DataPaths) -> Result<Frame> {
    let joined = joined_metrics(paths)?;

    let all_metrics: Vec<&str> = CATEGORIES
        .iter()
        .flat_map(|(_, metrics)| metrics.iter().copied())
        .collect();

    // per-year min-max bounds per metric
    let years = joined.unique("YEAR")?;
    let mut bounds: std::collections::HashMap<(String, &str), (f64, f64)> =
        std::collections::HashMap::new();
    for year in &years {
        let mut year_rows = joined.clone();
        year_rows.retain_rows(|f, r| {
            f.col("YEAR")
                .map(|c| f.get(r, c).render() == *year)
                .unwrap_or(false)
        });
        for metric in &all_metrics {
            if let Some(min_max) = year_rows.min_max(metric) {
                bounds.insert((year.clone(), metric), min_max);
            }
        }
    }

    let mut frame = joined.select(&KEY_COLUMNS)?;
    for (score_col, metrics) in CATEGORIES {
        let idx = frame.add_column(score_col, Cell::Null);
        for r in 0..frame.len() {
            let year = joined
                .col("YEAR")
                .map(|c| joined.get(r, c).render())
                .unwrap_or_default();
            let mut sum = 0.0;
            let mut count = 0usize;
            for metric in metrics {
                let (Some(value), Some(&(min, max))) = (
                    joined.num(r, metric),
                    bounds.get(&(year.clone(), *metric)),
                ) else {
                    continue;
                };
                sum += normalize(value, min, max, INVERTED_METRICS.contains(metric));
                count += 1;
            }
            if count > 0 {
                frame.set(r, idx, Cell::num(round4(sum / count as f64)));
            }
        }
    }

    for (profile, weights) in INDEX_PROFILES {
        let idx = frame.add_column(format!("socioeconomic_index_{}", profile), Cell::Null);
        for r in 0..frame.len() {
            let mut total = 0.0;
            let mut complete = true;
            for (w, (score_col, _)) in weights.iter().zip(CATEGORIES.iter()) {
                match frame.num(r, score_col) {
                    Some(score) => total += w * score,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                frame.set(r, idx, Cell::num(round4(total)));
            }
        }
    }

    frame.sort_by(&["COUNTY_FIPS", "YEAR"])?;
    let dest = paths.projected_file(Table::SocioeconomicIndices.name());
    frame.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::SocioeconomicIndices.name(),
        frame.len(),
        dest.display()
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_positional_and_invertible() {
        assert_eq!(normalize(5.0, 0.0, 10.0, false), 0.5);
        assert_eq!(normalize(5.0, 0.0, 10.0, true), 0.5);
        assert_eq!(normalize(10.0, 0.0, 10.0, false), 1.0);
        assert_eq!(normalize(10.0, 0.0, 10.0, true), 0.0);
        // constant columns carry no signal
        assert_eq!(normalize(7.0, 7.0, 7.0, false), 0.0);
    }

    #[test]
    fn profile_weights_sum_to_one() {
        for (profile, weights) in INDEX_PROFILES {
            let total: f64 = weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-12, "{}: {}", profile, total);
        }
    }

    /// Cleaned-table CSV with two county rows for 2023
    fn write_table(paths: &DataPaths, table: Table, metrics: &[&str], a: &[f64], b: &[f64]) {
        let mut header: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(metrics.iter().map(|m| m.to_string()));
        let mut body = String::new();
        for (fips, values) in [("01001", a), ("01003", b)] {
            body.push_str(&format!(
                "{},2023,01,{},\"Somewhere County, Alabama\",50000",
                fips,
                &fips[2..]
            ));
            for v in values {
                body.push_str(&format!(",{}", v));
            }
            body.push('\n');
        }
        std::fs::write(
            paths.cleaned_file(table.name()),
            format!("{}\n{}", header.join(","), body),
        )
        .unwrap();
    }

    #[test]
    fn dominant_county_gets_the_higher_index_on_every_profile() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();

        // 01001 is strictly better on every metric, inverted ones included
        write_table(&paths, Table::CleanedCrime, &CRIME_METRICS, &[100.0], &[900.0]);
        write_table(
            &paths,
            Table::CleanedEconomic,
            &ECONOMIC_METRICS,
            &[40_000.0, 30_000.0, 3.0],
            &[25_000.0, 20_000.0, 8.0],
        );
        write_table(
            &paths,
            Table::CleanedEducation,
            &EDUCATION_METRICS,
            &[12_000.0, 15_000.0, 200.0],
            &[3_000.0, 9_000.0, 700.0],
        );
        write_table(
            &paths,
            Table::CleanedHousing,
            &HOUSING_METRICS,
            &[250_000.0, 1_400.0, 0.25],
            &[150_000.0, 900.0, 0.40],
        );
        let jobs_a = [900.0; 12];
        let jobs_b = [300.0; 12];
        write_table(&paths, Table::CleanedJobOpenings, &JOB_OPENING_METRICS, &jobs_a, &jobs_b);

        let indices = compute_indices(&paths).unwrap();
        assert_eq!(indices.len(), 2);
        for (profile, _) in INDEX_PROFILES {
            let column = format!("socioeconomic_index_{}", profile);
            let better = indices.num(0, &column).unwrap();
            let worse = indices.num(1, &column).unwrap();
            assert!(better > worse, "{}: {} vs {}", column, better, worse);
        }
        // min-max positions bound every index to [0, 1]
        assert_eq!(indices.num(0, "socioeconomic_index_balanced"), Some(1.0));
        assert_eq!(indices.num(1, "socioeconomic_index_balanced"), Some(0.0));
    }

    #[test]
    fn category_members_match_the_weighting_model() {
        let categories: std::collections::HashMap<&str, &[&str]> =
            CATEGORIES.iter().copied().collect();
        assert_eq!(
            categories["education_score"],
            ["BACHELORS_OR_HIGHER_TOTAL", "TOTAL_ENROLLED", "LESS_THAN_HIGH_SCHOOL_UNEMPLOYED"]
        );
        assert_eq!(
            categories["housing_score"],
            ["MEDIAN_HOUSING_VALUE", "MEDIAN_GROSS_RENT", "HOUSE_AFFORDABILITY"]
        );
        assert_eq!(
            categories["economic_score"],
            ["MEDIAN_INCOME", "TOTAL_EMPLOYED_POPULATION", "UNEMPLOYMENT_RATE"]
        );
    }

    #[test]
    fn category_score_is_the_mean_of_its_members() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();

        // identical everywhere except education, so only that category
        // separates the two counties
        write_table(&paths, Table::CleanedCrime, &CRIME_METRICS, &[500.0], &[500.0]);
        write_table(
            &paths,
            Table::CleanedEconomic,
            &ECONOMIC_METRICS,
            &[30_000.0, 20_000.0, 5.0],
            &[30_000.0, 20_000.0, 5.0],
        );
        write_table(
            &paths,
            Table::CleanedEducation,
            &EDUCATION_METRICS,
            &[12_000.0, 15_000.0, 200.0],
            &[3_000.0, 9_000.0, 700.0],
        );
        write_table(
            &paths,
            Table::CleanedHousing,
            &HOUSING_METRICS,
            &[200_000.0, 1_000.0, 0.30],
            &[200_000.0, 1_000.0, 0.30],
        );
        write_table(
            &paths,
            Table::CleanedJobOpenings,
            &JOB_OPENING_METRICS,
            &[600.0; 12],
            &[600.0; 12],
        );

        let indices = compute_indices(&paths).unwrap();
        // constant categories normalize to 0; 01001 tops all three
        // education members (the unemployed count is inverted)
        assert_eq!(indices.num(0, "education_score"), Some(1.0));
        assert_eq!(indices.num(1, "education_score"), Some(0.0));
        assert_eq!(indices.num(0, "socioeconomic_index_balanced"), Some(0.2));
        assert_eq!(indices.num(1, "socioeconomic_index_balanced"), Some(0.0));
    }

    #[test]
    fn raising_one_metric_never_lowers_a_county_index() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_directories().unwrap();

        let seed = |income_b: f64| {
            write_table(&paths, Table::CleanedCrime, &CRIME_METRICS, &[100.0], &[900.0]);
            write_table(
                &paths,
                Table::CleanedEconomic,
                &ECONOMIC_METRICS,
                &[40_000.0, 30_000.0, 3.0],
                &[income_b, 20_000.0, 8.0],
            );
            write_table(
                &paths,
                Table::CleanedEducation,
                &EDUCATION_METRICS,
                &[12_000.0, 15_000.0, 200.0],
                &[3_000.0, 9_000.0, 700.0],
            );
            write_table(
                &paths,
                Table::CleanedHousing,
                &HOUSING_METRICS,
                &[250_000.0, 1_400.0, 0.25],
                &[150_000.0, 900.0, 0.40],
            );
            write_table(
                &paths,
                Table::CleanedJobOpenings,
                &JOB_OPENING_METRICS,
                &[900.0; 12],
                &[300.0; 12],
            );
        };

        seed(25_000.0);
        let before = compute_indices(&paths).unwrap();

        // 01003's median income now tops the year
        seed(55_000.0);
        let after = compute_indices(&paths).unwrap();

        for (profile, _) in INDEX_PROFILES {
            let column = format!("socioeconomic_index_{}", profile);
            let was = before.num(1, &column).unwrap();
            let now = after.num(1, &column).unwrap();
            assert!(now >= was, "{}: {} fell to {}", column, was, now);
        }
        assert!(
            after.num(1, "socioeconomic_index_economy_focused").unwrap()
                > before.num(1, "socioeconomic_index_economy_focused").unwrap()
        );
    }
}
