//! # buildsense-types
//!
//! **Tier 0 (Core Types)**
//!
//! The canonical record handed to the telemetry client, plus the small count
//! structs shared by the diff and VCS layers.
//!
//! ## What belongs here
//! * `SensorRecord` and `SensorDataType`
//! * The record key registry (`keys`)
//! * `DiffCounts`, `LineCounts`
//!
//! ## What does NOT belong here
//! * File I/O
//! * Report parsing
//! * Client or transport logic

pub mod keys;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of measurement a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorDataType {
    UnitTest,
    Commit,
    Issue,
}

impl SensorDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorDataType::UnitTest => "UnitTest",
            SensorDataType::Commit => "Commit",
            SensorDataType::Issue => "Issue",
        }
    }

    /// Keys required for this type in addition to [`keys::COMMON`].
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            SensorDataType::UnitTest => keys::unit_test::REQUIRED,
            SensorDataType::Commit => keys::commit::REQUIRED,
            SensorDataType::Issue => keys::issue::REQUIRED,
        }
    }
}

impl fmt::Display for SensorDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UnitTest" => Ok(SensorDataType::UnitTest),
            "Commit" => Ok(SensorDataType::Commit),
            "Issue" => Ok(SensorDataType::Issue),
            other => Err(format!("unknown sensor data type: {other}")),
        }
    }
}

/// One flattened measurement, keyed by string.
///
/// Serializes as a plain JSON object. Keys are kept sorted so that the same
/// record always renders the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRecord {
    fields: BTreeMap<String, String>,
}

impl SensorRecord {
    /// Create a record with the four common keys populated.
    pub fn new(
        tool: impl Into<String>,
        data_type: SensorDataType,
        timestamp: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(keys::TOOL.to_string(), tool.into());
        fields.insert(
            keys::SENSOR_DATA_TYPE.to_string(),
            data_type.as_str().to_string(),
        );
        fields.insert(keys::TIMESTAMP.to_string(), timestamp.into());
        fields.insert(keys::RESOURCE.to_string(), resource.into());
        Self { fields }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style insert that skips `None`.
    #[must_use]
    pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn tool(&self) -> Option<&str> {
        self.get(keys::TOOL)
    }

    pub fn data_type(&self) -> Option<SensorDataType> {
        self.get(keys::SENSOR_DATA_TYPE)?.parse().ok()
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get(keys::TIMESTAMP)
    }

    pub fn resource(&self) -> Option<&str> {
        self.get(keys::RESOURCE)
    }

    /// Required keys this record lacks, common keys first.
    ///
    /// An unknown or absent `SensorDataType` only checks the common keys.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = keys::COMMON
            .iter()
            .copied()
            .filter(|k| !self.contains_key(k))
            .collect();
        if let Some(dt) = self.data_type() {
            missing.extend(
                dt.required_keys()
                    .iter()
                    .copied()
                    .filter(|k| !self.contains_key(k)),
            );
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_keys().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl From<BTreeMap<String, String>> for SensorRecord {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

/// Line counts produced by comparing two revisions.
///
/// `changed` counts lines modified in place; surplus lines of a replacement
/// block stay on the longer side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffCounts {
    pub added: usize,
    pub deleted: usize,
    pub changed: usize,
}

impl DiffCounts {
    pub const ZERO: DiffCounts = DiffCounts {
        added: 0,
        deleted: 0,
        changed: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for DiffCounts {
    type Output = DiffCounts;

    fn add(self, rhs: DiffCounts) -> DiffCounts {
        DiffCounts {
            added: self.added + rhs.added,
            deleted: self.deleted + rhs.deleted,
            changed: self.changed + rhs.changed,
        }
    }
}

impl AddAssign for DiffCounts {
    fn add_assign(&mut self, rhs: DiffCounts) {
        *self = *self + rhs;
    }
}

/// Size of a single revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineCounts {
    pub total: usize,
    pub non_blank: usize,
}
