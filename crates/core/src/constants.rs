//! Constants used throughout the core crate.

/// Default directory for request data when none is configured.
pub const DEFAULT_DATA_DIR: &str = "request_data";

/// Directory under the data dir holding one JSON file per test request.
pub const REQUESTS_DIR_NAME: &str = "requests";

/// Extension of stored request files.
pub const RECORD_EXTENSION: &str = "json";

/// Default upper bound on consultation comment length, in characters.
pub const DEFAULT_MAX_COMMENT_LEN: usize = 2_000;

/// Hard ceiling for a configured comment length.
pub const MAX_COMMENT_LEN_CEILING: usize = 20_000;
