//! Scenario-projected indicators and composite indices
//!
//! Takes the 2023 observations as the base, scales the population-driven
//! counts by each scenario's projected population change, and holds 2023
//! capacity fixed (teachers, housing units, employed persons). The gap
//! between scaled demand and fixed capacity yields three strain metrics:
//! unemployment rate, student/teacher ratio, and available housing units.
//! Composite indices weight the per-scenario z-scores of those metrics.

use crate::cleaning::zscore::{add_z_scores, round2, round4};
use crate::frame::{Cell, Frame};
use crate::paths::DataPaths;
use migra_common::db::Table;
use migra_common::{Error, Result};
use std::collections::HashMap;
use tracing::info;

use super::forecast::SCENARIOS;

/// Weight profiles over (-z unemployment, -z student/teacher, +z housing)
const INDEX_PROFILES: [(&str, [f64; 3]); 4] = [
    ("balanced", [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]),
    ("employment_focused", [0.6, 0.2, 0.2]),
    ("education_focused", [0.2, 0.6, 0.2]),
    ("housing_focused", [0.2, 0.2, 0.6]),
];

const STRAIN_Z_COLUMNS: [&str; 3] = [
    "UNEMPLOYMENT_RATE_Z_SCORE",
    "STUDENT_TEACHER_RATIO_Z_SCORE",
    "AVAILABLE_HOUSING_UNITS_Z_SCORE",
];

/// Cleaned table rows for the base year, z-score columns dropped
fn base_year_rows(paths: &DataPaths, table: Table, keep: &[&str]) -> Result<Frame> {
    let path = paths.cleaned_file(table.name());
    let source = path.display().to_string();
    let mut frame = Frame::from_csv(&path)?;
    frame.coerce_numeric(&["YEAR"], &source)?;
    frame.retain_rows(|f, r| {
        f.num(r, "YEAR") == Some(crate::acquisition::datasets::BASE_YEAR as f64)
    });
    if frame.is_empty() {
        return Err(Error::NotFound(format!(
            "{} has no base-year rows",
            table.name()
        )));
    }
    let mut columns: Vec<&str> = vec!["COUNTY_FIPS"];
    columns.extend(keep.iter());
    let mut frame = frame.select(&columns)?;
    frame.coerce_numeric(
        &keep
            .iter()
            .copied()
            .filter(|c| !matches!(*c, "STATE" | "COUNTY" | "NAME"))
            .collect::<Vec<_>>(),
        &source,
    )?;
    Ok(frame)
}

/// Base-year indicators joined per county. School columns are zero-filled
/// for counties without school coverage; those counties are excluded from
/// the projected indices later.
fn base_indicators(paths: &DataPaths) -> Result<Frame> {
    let economic = base_year_rows(
        paths,
        Table::CleanedEconomic,
        &[
            "STATE",
            "COUNTY",
            "NAME",
            "POPULATION",
            "MEDIAN_INCOME",
            "TOTAL_EMPLOYED_POPULATION",
            "UNEMPLOYED_PERSONS",
            "TOTAL_LABOR_FORCE",
            "UNEMPLOYMENT_RATE",
        ],
    )?;
    let housing = base_year_rows(
        paths,
        Table::CleanedHousing,
        &[
            "TOTAL_HOUSING_UNITS",
            "OCCUPIED_HOUSING_UNITS",
            "MEDIAN_HOUSING_VALUE",
            "MEDIAN_GROSS_RENT",
            "HOUSE_AFFORDABILITY",
        ],
    )?;
    let crime = base_year_rows(paths, Table::CleanedCrime, &["CRIMINAL_ACTIVITIES"])?;
    let schools = base_year_rows(
        paths,
        Table::CleanedPublicSchool,
        &[
            "PUBLIC_SCHOOL_STUDENTS",
            "PUBLIC_SCHOOL_TEACHERS",
            "STUDENT_TEACHER_RATIO",
        ],
    )?;

    let mut frame = economic
        .inner_join(&housing, &["COUNTY_FIPS"])?
        .inner_join(&crime, &["COUNTY_FIPS"])?
        .left_join(&schools, &["COUNTY_FIPS"])?;

    for col in [
        "PUBLIC_SCHOOL_STUDENTS",
        "PUBLIC_SCHOOL_TEACHERS",
        "STUDENT_TEACHER_RATIO",
    ] {
        let idx = frame.require_col(col)?;
        for r in 0..frame.len() {
            if frame.get(r, idx).is_null() {
                frame.set(r, idx, Cell::num(0.0));
            }
        }
    }
    Ok(frame)
}

/// Percent population change per county and scenario, from the forecast
fn pct_changes(projections: &Frame) -> Result<HashMap<(String, &'static str), f64>> {
    let mut out = HashMap::new();
    for r in 0..projections.len() {
        let Some(fips) = projections.text(r, "COUNTY_FIPS") else {
            continue;
        };
        for scenario in SCENARIOS {
            let column = format!("PCT_CHANGE_{}", scenario.to_ascii_uppercase());
            if let Some(pct) = projections.num(r, &column) {
                out.insert((fips.to_string(), scenario), pct);
            }
        }
    }
    Ok(out)
}

/// One scenario's projected rows from the base indicators
fn scale_scenario(
    base: &Frame,
    scenario: &'static str,
    pct: &HashMap<(String, &'static str), f64>,
) -> Result<Frame> {
    let mut frame = base.clone();
    frame.add_column("SCENARIO", Cell::text(scenario));
    frame.add_column("PCT_CHANGE", Cell::Null);
    frame.add_column("AVAILABLE_HOUSING_UNITS", Cell::Null);
    frame.add_column("EMPLOYED_PERCENTAGE", Cell::Null);

    let mut keep = std::collections::HashSet::new();
    for r in 0..frame.len() {
        let fips = frame.text(r, "COUNTY_FIPS").unwrap_or_default().to_string();
        let Some(&pct_change) = pct.get(&(fips, scenario)) else {
            continue;
        };
        keep.insert(r);
        let factor = 1.0 + pct_change / 100.0;

        let set = |frame: &mut Frame, r: usize, col: &str, value: f64| -> Result<()> {
            let idx = frame.require_col(col)?;
            frame.set(r, idx, Cell::num(value));
            Ok(())
        };

        set(&mut frame, r, "PCT_CHANGE", pct_change)?;

        // demand scales with population
        let population = frame.num(r, "POPULATION").unwrap_or(0.0) * factor;
        set(&mut frame, r, "POPULATION", population.round())?;

        let students = frame.num(r, "PUBLIC_SCHOOL_STUDENTS").unwrap_or(0.0) * factor;
        set(&mut frame, r, "PUBLIC_SCHOOL_STUDENTS", students.round())?;
        let teachers = frame.num(r, "PUBLIC_SCHOOL_TEACHERS").unwrap_or(0.0);
        let ratio = if teachers > 0.0 {
            round2(students.round() / teachers)
        } else {
            0.0
        };
        set(&mut frame, r, "STUDENT_TEACHER_RATIO", ratio)?;

        let labor_force = (frame.num(r, "TOTAL_LABOR_FORCE").unwrap_or(0.0) * factor).round();
        set(&mut frame, r, "TOTAL_LABOR_FORCE", labor_force)?;
        let employed = frame.num(r, "TOTAL_EMPLOYED_POPULATION").unwrap_or(0.0);
        let unemployed = (labor_force - employed).max(0.0);
        set(&mut frame, r, "UNEMPLOYED_PERSONS", unemployed)?;
        let rate = if labor_force > 0.0 {
            round2(unemployed / labor_force * 100.0)
        } else {
            0.0
        };
        set(&mut frame, r, "UNEMPLOYMENT_RATE", rate)?;
        let employed_pct = if labor_force > 0.0 {
            round2(employed / labor_force * 100.0)
        } else {
            0.0
        };
        set(&mut frame, r, "EMPLOYED_PERCENTAGE", employed_pct)?;

        let occupied = (frame.num(r, "OCCUPIED_HOUSING_UNITS").unwrap_or(0.0) * factor).round();
        set(&mut frame, r, "OCCUPIED_HOUSING_UNITS", occupied)?;
        let total_units = frame.num(r, "TOTAL_HOUSING_UNITS").unwrap_or(0.0);
        set(&mut frame, r, "AVAILABLE_HOUSING_UNITS", total_units - occupied)?;

        // a missing base-year observation stays missing in the projection
        if let Some(crime) = frame.num(r, "CRIMINAL_ACTIVITIES") {
            set(&mut frame, r, "CRIMINAL_ACTIVITIES", (crime * factor).round())?;
        }
    }
    frame.retain_rows(|_, r| keep.contains(&r));
    Ok(frame)
}

/// Build `combined_2065_data` and `projected_socioeconomic_indices`
pub fn project_indicators(paths: &DataPaths, projections: &Frame) -> Result<(Frame, Frame)> {
    let base = base_indicators(paths)?;
    let pct = pct_changes(projections)?;

    let mut combined: Option<Frame> = None;
    for scenario in SCENARIOS {
        let frame = scale_scenario(&base, scenario, &pct)?;
        match &mut combined {
            Some(all) => all.append(frame)?,
            None => combined = Some(frame),
        }
    }
    let mut combined =
        combined.ok_or_else(|| Error::Internal("no scenarios projected".into()))?;

    add_z_scores(&mut combined, "SCENARIO")?;
    // only the strain metrics feed the projected indices
    combined.drop_columns_where(|c| {
        c.ends_with("_Z_SCORE") && !STRAIN_Z_COLUMNS.contains(&c)
    });
    combined.sort_by(&["SCENARIO", "COUNTY_FIPS"])?;

    let dest = paths.projected_file(Table::Combined2065.name());
    combined.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::Combined2065.name(),
        combined.len(),
        dest.display()
    );

    let indices = projected_indices(&combined)?;
    let dest = paths.projected_file(Table::ProjectedIndices.name());
    indices.write_csv(&dest)?;
    info!(
        "{}: {} rows written to {}",
        Table::ProjectedIndices.name(),
        indices.len(),
        dest.display()
    );
    Ok((combined, indices))
}

/// Weighted composites of the strain z-scores. Higher is better, so the
/// unemployment and student/teacher scores enter negated. Counties without
/// school coverage are excluded; their zero-filled ratios would otherwise
/// rank as spare capacity.
fn projected_indices(combined: &Frame) -> Result<Frame> {
    let mut frame = combined.select(&[
        "COUNTY_FIPS",
        "SCENARIO",
        "STATE",
        "COUNTY",
        "NAME",
        "POPULATION",
        "PCT_CHANGE",
        "PUBLIC_SCHOOL_STUDENTS",
        "UNEMPLOYMENT_RATE_Z_SCORE",
        "STUDENT_TEACHER_RATIO_Z_SCORE",
        "AVAILABLE_HOUSING_UNITS_Z_SCORE",
    ])?;
    frame.retain_rows(|f, r| f.num(r, "PUBLIC_SCHOOL_STUDENTS").unwrap_or(0.0) > 0.0);

    for (profile, weights) in INDEX_PROFILES {
        let idx = frame.add_column(format!("projected_index_{}", profile), Cell::Null);
        for r in 0..frame.len() {
            let (Some(z_unemployment), Some(z_ratio), Some(z_housing)) = (
                frame.num(r, "UNEMPLOYMENT_RATE_Z_SCORE"),
                frame.num(r, "STUDENT_TEACHER_RATIO_Z_SCORE"),
                frame.num(r, "AVAILABLE_HOUSING_UNITS_Z_SCORE"),
            ) else {
                continue;
            };
            let value = weights[0] * -z_unemployment
                + weights[1] * -z_ratio
                + weights[2] * z_housing;
            frame.set(r, idx, Cell::num(round4(value)));
        }
    }
    frame.sort_by(&["SCENARIO", "COUNTY_FIPS"])?;
    Ok(frame)
}
