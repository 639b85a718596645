//! Registry of database tables produced by the pipeline
//!
//! The dashboard validates user-supplied table names against this registry
//! before interpolating them into SQL, so every queryable table must be
//! listed here.

use std::fmt;

/// Tables written by the pipeline and read by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Canonical county reference (one row per county)
    County,
    CleanedPopulation,
    CleanedEconomic,
    CleanedEducation,
    CleanedHousing,
    CleanedCrime,
    CleanedJobOpenings,
    CleanedPublicSchool,
    /// Decennial + modern population history, one row per county
    TimeseriesPopulation,
    /// 2065 scenario population projections per county
    PopulationProjections,
    /// Scenario-projected indicator values
    Combined2065,
    /// Composite z-score indices for projected scenarios
    ProjectedIndices,
    /// Min-max weighted composite indices per county-year
    SocioeconomicIndices,
    /// Ordinal rankings per index per year
    SocioeconomicRankings,
}

impl Table {
    pub const ALL: [Table; 14] = [
        Table::County,
        Table::CleanedPopulation,
        Table::CleanedEconomic,
        Table::CleanedEducation,
        Table::CleanedHousing,
        Table::CleanedCrime,
        Table::CleanedJobOpenings,
        Table::CleanedPublicSchool,
        Table::TimeseriesPopulation,
        Table::PopulationProjections,
        Table::Combined2065,
        Table::ProjectedIndices,
        Table::SocioeconomicIndices,
        Table::SocioeconomicRankings,
    ];

    /// Database table name; also the stem of the CSV the table is loaded from
    pub fn name(&self) -> &'static str {
        match self {
            Table::County => "county",
            Table::CleanedPopulation => "cleaned_population_data",
            Table::CleanedEconomic => "cleaned_economic_data",
            Table::CleanedEducation => "cleaned_education_data",
            Table::CleanedHousing => "cleaned_housing_data",
            Table::CleanedCrime => "cleaned_crime_data",
            Table::CleanedJobOpenings => "cleaned_job_openings_data",
            Table::CleanedPublicSchool => "cleaned_public_school_data",
            Table::TimeseriesPopulation => "timeseries_population",
            Table::PopulationProjections => "county_population_projections",
            Table::Combined2065 => "combined_2065_data",
            Table::ProjectedIndices => "projected_socioeconomic_indices",
            Table::SocioeconomicIndices => "socioeconomic_indices",
            Table::SocioeconomicRankings => "socioeconomic_indices_rankings",
        }
    }

    /// Look up a table by its database name
    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Tables holding one row per (county_fips, year) observation
    pub fn is_cleaned_observation(&self) -> bool {
        matches!(
            self,
            Table::CleanedPopulation
                | Table::CleanedEconomic
                | Table::CleanedEducation
                | Table::CleanedHousing
                | Table::CleanedCrime
                | Table::CleanedJobOpenings
                | Table::CleanedPublicSchool
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.name()), Some(table));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(Table::from_name("sqlite_master"), None);
        assert_eq!(Table::from_name("county; DROP TABLE county"), None);
    }
}
