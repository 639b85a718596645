//! migra-pipeline library - batch ETL over county socioeconomic data
//!
//! Stages run strictly downstream: acquisition → cleaning → analysis
//! (historical reconstruction, forecasting, indices, rankings) → database
//! load. Each stage reads files the previous stage left on disk and writes
//! its own outputs wholesale; a failed stage halts the run and leaves prior
//! outputs untouched for inspection.

pub mod acquisition;
pub mod analysis;
pub mod cleaning;
pub mod frame;
pub mod load;
pub mod paths;
