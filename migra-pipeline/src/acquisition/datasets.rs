//! Census dataset declarations
//!
//! Variable lists and vintage ranges for each ACS download. Housing splits
//! its variable list because the profile table renumbered columns in 2015.

/// Variables valid for an inclusive vintage range
#[derive(Debug, Clone, Copy)]
pub struct VintageVars {
    pub years: (u16, u16),
    pub vars: &'static [&'static str],
}

/// One ACS dataset to acquire, year by year
#[derive(Debug, Clone, Copy)]
pub struct AcsDataset {
    /// Short key, also used in log lines
    pub key: &'static str,
    /// API dataset path under the vintage, e.g. `acs/acs5`
    pub dataset: &'static str,
    /// Inclusive year range to download
    pub years: (u16, u16),
    /// Variable lists per vintage
    pub vintages: &'static [VintageVars],
    /// Subdirectory under `data/raw/`
    pub raw_subdir: &'static str,
    /// Output file prefix, `{prefix}_{year}.csv`
    pub file_prefix: &'static str,
}

impl AcsDataset {
    /// Variables for a specific year, None when the year has no vintage
    pub fn vars_for_year(&self, year: u16) -> Option<&'static [&'static str]> {
        self.vintages
            .iter()
            .find(|v| v.years.0 <= year && year <= v.years.1)
            .map(|v| v.vars)
    }
}

pub const POPULATION: AcsDataset = AcsDataset {
    key: "population",
    dataset: "acs/acs5",
    years: (2010, 2023),
    vintages: &[VintageVars {
        years: (2010, 2023),
        vars: &["B01003_001E"],
    }],
    raw_subdir: "population_data",
    file_prefix: "census_population_data",
};

pub const ECONOMIC: AcsDataset = AcsDataset {
    key: "economic",
    dataset: "acs/acs5",
    years: (2011, 2023),
    vintages: &[VintageVars {
        years: (2011, 2023),
        vars: &["B19301_001E", "B23025_004E", "B23025_005E", "B23025_003E"],
    }],
    raw_subdir: "economic_data",
    file_prefix: "census_economic_data",
};

pub const EDUCATION: AcsDataset = AcsDataset {
    key: "education",
    dataset: "acs/acs5",
    years: (2011, 2023),
    vintages: &[VintageVars {
        years: (2011, 2023),
        vars: &[
            "B23006_001E",
            "B23006_002E",
            "B23006_009E",
            "B23006_016E",
            "B23006_023E",
            "B14001_001E",
            "B14001_002E",
            "B14001_003E",
            "B14001_004E",
            "B14001_005E",
            "B14001_006E",
            "B14001_007E",
            "B14001_008E",
            "B14001_009E",
            "B23006_007E",
            "B23006_014E",
            "B23006_021E",
            "B23006_028E",
            "B01001_004E", // male 5-9
            "B01001_005E", // male 10-14
            "B01001_006E", // male 15-17
            "B01001_028E", // female 5-9
            "B01001_029E", // female 10-14
            "B01001_030E", // female 15-17
        ],
    }],
    raw_subdir: "education_data",
    file_prefix: "census_education_data",
};

pub const HOUSING: AcsDataset = AcsDataset {
    key: "housing",
    dataset: "acs/acs5/profile",
    years: (2010, 2023),
    vintages: &[
        VintageVars {
            years: (2010, 2014),
            vars: &["DP04_0001E", "DP04_0044E", "DP04_0088E", "DP04_0132E"],
        },
        VintageVars {
            years: (2015, 2023),
            vars: &["DP04_0001E", "DP04_0002E", "DP04_0089E", "DP04_0134E"],
        },
    ],
    raw_subdir: "housing_data",
    file_prefix: "census_housing_data",
};

/// County name reference, one vintage is enough
pub const COUNTIES: AcsDataset = AcsDataset {
    key: "counties",
    dataset: "acs/acs5",
    years: (2020, 2020),
    vintages: &[VintageVars {
        years: (2020, 2020),
        vars: &[],
    }],
    raw_subdir: "counties_data",
    file_prefix: "county_names",
};

pub const ACS_DATASETS: [AcsDataset; 5] = [POPULATION, ECONOMIC, EDUCATION, HOUSING, COUNTIES];

/// Latest observation year; the base year for scenario projections
pub const BASE_YEAR: u16 = 2023;

/// Data Commons statistical variable for combined state crime counts
pub const CRIME_STAT_VAR: &str = "Count_CriminalActivities_CombinedCrime";

pub const CRIME_YEARS: (u16, u16) = (2010, 2023);
pub const CRIME_RAW_SUBDIR: &str = "state_crime_data";

/// Manual drop locations
pub const JOB_OPENINGS_RAW_SUBDIR: &str = "monthly_job_openings_data";
pub const JOB_OPENINGS_PREFIX: &str = "state_job_opening_data";
pub const PUBLIC_SCHOOL_RAW_SUBDIR: &str = "public_school_data";
pub const PUBLIC_SCHOOL_PREFIX: &str = "public_school_data";
