//! JUnit XML test results.
//!
//! Accepts a single `<testsuite>` root or a `<testsuites>` wrapper. Nested
//! suites are flattened.

use buildsense_types::{SensorDataType, SensorRecord, keys};
use serde::Deserialize;
use tracing::debug;

use crate::{ParseContext, RawReport, ReportError, ReportFormat};

pub const TOOL: &str = "JUnit";

/// Parser for JUnit XML reports.
#[derive(Debug, Clone, Default)]
pub struct JunitFormat;

#[derive(Debug, Deserialize)]
struct SuiteNode {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "testcase", default)]
    cases: Vec<CaseNode>,
    #[serde(rename = "testsuite", default)]
    suites: Vec<SuiteNode>,
}

#[derive(Debug, Deserialize)]
struct CaseNode {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@time")]
    time: Option<String>,
    #[serde(default)]
    failure: Vec<Outcome>,
    #[serde(default)]
    error: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    #[serde(rename = "@message")]
    message: Option<String>,
}

impl SuiteNode {
    fn flatten<'a>(&'a self, out: &mut Vec<&'a SuiteNode>) {
        if !self.cases.is_empty() {
            out.push(self);
        }
        for s in &self.suites {
            s.flatten(out);
        }
    }
}

/// Seconds as written by JUnit to whole milliseconds.
///
/// Rounded, since decimal seconds such as `0.29` are not exact in binary.
fn elapsed_ms(time: &str) -> Option<i64> {
    let secs: f64 = time.trim().replace(',', "").parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some((secs * 1000.0).round() as i64)
}

fn outcome_message(outcomes: &[Outcome]) -> Option<String> {
    outcomes
        .first()
        .map(|o| o.message.clone().unwrap_or_default())
}

impl ReportFormat for JunitFormat {
    fn tool(&self) -> &str {
        TOOL
    }

    fn data_type(&self) -> SensorDataType {
        SensorDataType::UnitTest
    }

    fn parse(
        &self,
        report: &RawReport,
        ctx: &mut ParseContext,
    ) -> Result<Vec<SensorRecord>, ReportError> {
        let root: SuiteNode =
            quick_xml::de::from_str(&report.content).map_err(|source| ReportError::Xml {
                path: report.path.clone(),
                source,
            })?;

        let mut suites = Vec::new();
        root.flatten(&mut suites);

        let mut records = Vec::new();
        for suite in suites {
            let resource = ctx.resolver.resource_for(&suite.name);
            for case in &suite.cases {
                let failure = outcome_message(&case.failure);
                let error = outcome_message(&case.error);
                let result = if failure.is_some() || error.is_some() {
                    keys::unit_test::FAIL
                } else {
                    keys::unit_test::PASS
                };
                let elapsed = case.time.as_deref().and_then(elapsed_ms);
                if elapsed.is_none() && case.time.is_some() {
                    debug!(case = %case.name, "unreadable test time, omitting ElapsedTime");
                }

                let record = ctx
                    .record(
                        TOOL,
                        SensorDataType::UnitTest,
                        report.modified_ms,
                        resource.clone(),
                    )
                    .with(keys::unit_test::NAME, format!("{}.{}", suite.name, case.name))
                    .with(keys::unit_test::RESULT, result)
                    .with(keys::unit_test::TEST_NAME, suite.name.as_str())
                    .with(keys::unit_test::TEST_CASE_NAME, case.name.as_str())
                    .with_opt(keys::unit_test::ELAPSED_TIME, elapsed.map(|ms| ms.to_string()))
                    .with_opt(keys::unit_test::FAILURE_STRING, failure)
                    .with_opt(keys::unit_test::ERROR_STRING, error);
                records.push(record);
            }
        }
        debug!(
            path = %report.path.display(),
            cases = records.len(),
            "parsed JUnit report"
        );
        Ok(records)
    }
}
