/// Calendar year that defines "present" on the BP scale (0 BP = 1950 CE).
pub const REFERENCE_EPOCH_CE: f64 = 1950.0;

/// Years between the b2k reference (2000 CE) and the BP reference.
pub const B2K_OFFSET_YEARS: f64 = 50.0;

/// Years per ka / kyr.
pub const YEARS_PER_KYR: f64 = 1000.0;

/// Resolution cutoffs (max sampling interval, in years).
pub const ANNUAL_MAX_INTERVAL: f64 = 1.0;
pub const DECADAL_MAX_INTERVAL: f64 = 10.0;

/// Label pattern used to recognise time/age variables that lack a standard tag.
pub const TIME_LABEL_PATTERN: &str = "year|age|yr|ka";

/// Name of the projected column that carries dataset names.
pub const DATASET_NAME_VAR: &str = "datasetName";

/// Name of the root dataset node variable.
pub const DATASET_VAR: &str = "dataset";
