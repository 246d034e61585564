//! Record key registry.
//!
//! The four common keys appear on every record. Each data type module lists
//! the keys specific to that type; `REQUIRED` is what `SensorRecord::missing_keys`
//! checks on top of the common set.

/// Tool that produced the measurement (e.g. "JUnit").
pub const TOOL: &str = "Tool";
/// Data type name, see [`crate::SensorDataType`].
pub const SENSOR_DATA_TYPE: &str = "SensorDataType";
/// Unique timestamp of this record.
pub const TIMESTAMP: &str = "Timestamp";
/// File or URI the measurement is about. May be empty when unresolved.
pub const RESOURCE: &str = "Resource";
/// Timestamp of the sensor run, shared by all records of one run.
pub const RUNTIME: &str = "Runtime";

/// Keys every record must carry.
pub const COMMON: &[&str] = &[TOOL, SENSOR_DATA_TYPE, TIMESTAMP, RESOURCE];

/// Unit test results.
pub mod unit_test {
    pub const NAME: &str = "Name";
    pub const RESULT: &str = "Result";
    /// Elapsed time in integer milliseconds.
    pub const ELAPSED_TIME: &str = "ElapsedTime";
    pub const TEST_NAME: &str = "TestName";
    pub const TEST_CASE_NAME: &str = "TestCaseName";
    pub const FAILURE_STRING: &str = "FailureString";
    pub const ERROR_STRING: &str = "ErrorString";

    pub const REQUIRED: &[&str] = &[NAME, RESULT];

    /// `Result` value of a passing test.
    pub const PASS: &str = "pass";
    /// `Result` value of a failing or erroring test.
    pub const FAIL: &str = "fail";
}

/// Per-file commit statistics.
pub mod commit {
    pub const TOTAL_LINES: &str = "totalLines";
    pub const LINES_ADDED: &str = "linesAdded";
    pub const LINES_DELETED: &str = "linesDeleted";
    pub const LINES_MODIFIED: &str = "linesModified";
    pub const AUTHOR: &str = "Author";
    pub const COMMIT_ID: &str = "CommitId";
    pub const MESSAGE: &str = "Message";

    pub const REQUIRED: &[&str] = &[TOTAL_LINES, LINES_ADDED, LINES_DELETED];
}

/// Issue tracker state and updates.
pub mod issue {
    pub const ID: &str = "Id";
    pub const TYPE: &str = "Type";
    pub const STATUS: &str = "Status";
    pub const PRIORITY: &str = "Priority";
    pub const MILESTONE: &str = "Milestone";
    pub const OWNER: &str = "Owner";
    pub const UPDATE_NUMBER: &str = "UpdateNumber";
    pub const COMMENT: &str = "Comment";
    pub const LINK: &str = "Link";
    pub const AUTHOR: &str = "Author";

    /// Fields tracked for change detection, in export column order.
    pub const TRACKED: &[&str] = &[TYPE, STATUS, PRIORITY, MILESTONE, OWNER];

    pub const REQUIRED: &[&str] = &[ID];

    /// Separates a tracked value from the timestamp it was observed at.
    pub const TIMESTAMP_SEPARATOR: &str = "--";
}
