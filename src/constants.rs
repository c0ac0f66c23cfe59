//! Application constants for the NWIS processor
//!
//! Service endpoints, RDB format markers, column names and the fixed query
//! payloads used when talking to the USGS water services.

// =============================================================================
// Service Endpoints
// =============================================================================

/// Base URL of the waterservices REST API (iv, dv, site)
pub const WATERSERVICES_URL: &str = "https://waterservices.usgs.gov/nwis/";

/// Base URL of the legacy waterdata pages (measurements)
pub const WATERDATA_URL: &str = "https://nwis.waterdata.usgs.gov/nwis/";

/// Water-quality sample retrieval endpoint
pub const QWDATA_URL: &str = "https://nwis.waterdata.usgs.gov/nwis/qwdata";

/// Parameter code catalogue endpoint
pub const PMCODES_URL: &str = "https://nwis.waterdata.usgs.gov/nwis/pmcodes";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// RDB Format
// =============================================================================

/// Leading character of RDB comment lines
pub const RDB_COMMENT_PREFIX: char = '#';

/// Field separator of RDB header and data lines
pub const RDB_SEPARATOR: u8 = b'\t';

/// Token the services use for a missing field
pub const RDB_MISSING_VALUE: &str = "NaN";

/// Body prefix the services send instead of a table when nothing matched
pub const NO_DATA_SENTINEL: &str = "No sites/data";

// =============================================================================
// Column Name Constants
// =============================================================================

/// Standard column names in normalized tables
pub mod columns {
    /// Site identifier, always kept as a string
    pub const SITE_NO: &str = "site_no";

    /// Normalized timestamp column
    pub const DATETIME: &str = "datetime";

    /// Suffix of the qualifier column paired with each value column
    pub const QUALIFIER_SUFFIX: &str = "_cd";

    // Raw sample columns combined into `datetime`
    pub const SAMPLE_DATE: &str = "sample_dt";
    pub const SAMPLE_TIME: &str = "sample_tm";
    pub const SAMPLE_TZ: &str = "sample_start_time_datum_cd";
}

// =============================================================================
// Timestamp Formats
// =============================================================================

/// Sample date format requested from qwdata (`date_format=YYYY-MM-DD`)
pub const SAMPLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Sample time-of-day format
pub const SAMPLE_TIME_FORMAT: &str = "%H:%M";

/// WaterML timestamp without an offset
pub const JSON_NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// =============================================================================
// Fixed Query Payloads
// =============================================================================

/// Query pairs sent with every qwdata request
pub const QWDATA_DEFAULT_PAYLOAD: &[(&str, &str)] = &[
    ("agency_cd", "USGS"),
    ("format", "rdb"),
    ("pm_cd_compare", "Greater than"),
    ("inventory_output", "0"),
    ("rdb_inventory_output", "file"),
    ("TZoutput", "0"),
    ("radio_parm_cds", "all_parm_cds"),
    ("rdb_qw_attributes", "expanded"),
    ("date_format", "YYYY-MM-DD"),
    ("rdb_compression", "value"),
    ("submmitted_form", "brief_list"),
    ("qw_sample_wide", "separated_wide"),
];

/// Query pairs listing every parameter code group
pub const PMCODES_PAYLOAD: &[(&str, &str)] = &[
    ("radio_pm_search", "param_group"),
    ("pm_group", "All -- include all parameter groups"),
    ("pm_search", ""),
    ("casrn_search", ""),
    ("srsname_search", ""),
    ("format", "rdb"),
    ("show", "parameter_group_nm"),
    ("show", "parameter_nm"),
    ("show", "casrn"),
    ("show", "srsname"),
    ("show", "parameter_units"),
];
