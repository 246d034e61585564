//! Issue update Atom feed.
//!
//! Entry titles look like `Update 3 to issue 42 ("Crash on start")` or
//! `Issue 42 created: "Crash on start"`. Content is HTML wrapped in `<pre>`.

use buildsense_tstamp::parse_ms;
use buildsense_types::{SensorDataType, SensorRecord, keys};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::issue_csv::DEFAULT_TOOL;
use crate::{ParseContext, RawReport, ReportError, ReportFormat};

const STATUS_MARKER: &str = "Status:";
const LABEL_MARKER: &str = "Label:";
pub const CREATED_STATUS: &str = "Created";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    updated: Option<String>,
    #[serde(default)]
    title: String,
    author: Option<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    #[serde(rename = "content", default)]
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(rename = "$text", default)]
    value: String,
}

/// One update to an issue, as read from the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueEvent {
    pub issue: u64,
    /// Zero for the creation event.
    pub update: u64,
    pub status: Option<String>,
    pub comment: String,
    pub author: Option<String>,
    pub link: Option<String>,
    pub entry_id: Option<String>,
    pub updated_ms: Option<i64>,
}

/// `(issue, update)` from an entry title, update 0 meaning creation.
pub fn parse_title(title: &str) -> Option<(u64, u64)> {
    let words: Vec<&str> = title.split_whitespace().collect();
    match words.as_slice() {
        ["Update", update, "to", "issue", issue, _, ..] => {
            Some((issue.parse().ok()?, update.parse().ok()?))
        }
        ["Issue", issue, "created:", _, ..] => Some((issue.parse().ok()?, 0)),
        _ => None,
    }
}

/// Strip the `<pre>` wrapper and turn line breaks into spaces.
pub fn clean_content(raw: &str) -> String {
    raw.replace("<pre>", "")
        .replace("</pre>", "")
        .trim()
        .replace("<br/>", " ")
}

/// Comment and status of an update body.
///
/// The status is the word after the last `Status:`; the comment is the text
/// before the earlier of the last `Status:` and last `Label:` markers.
pub fn split_update(content: &str) -> (String, Option<String>) {
    let Some(status_at) = content.rfind(STATUS_MARKER) else {
        return (content.trim().to_string(), None);
    };
    let comment_end = content
        .rfind(LABEL_MARKER)
        .map_or(status_at, |label_at| label_at.min(status_at));
    let comment = content[..comment_end].trim().to_string();
    let status = content[status_at + STATUS_MARKER.len()..]
        .split_whitespace()
        .next()
        .map(str::to_string);
    (comment, status)
}

impl IssueEvent {
    fn from_entry(entry: Entry) -> Result<Self, String> {
        if entry.contents.len() != 1 {
            return Err(format!(
                "expected exactly one content element, found {}",
                entry.contents.len()
            ));
        }
        let (issue, update) = parse_title(&entry.title)
            .ok_or_else(|| format!("unrecognised title {:?}", entry.title.trim()))?;

        let content = clean_content(&entry.contents[0].value);
        let (comment, status) = if update > 0 {
            split_update(&content)
        } else {
            (content, Some(CREATED_STATUS.to_string()))
        };

        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
            .or(entry.links.first())
            .and_then(|l| l.href.clone());

        Ok(Self {
            issue,
            update,
            status,
            comment,
            author: entry.author.and_then(|a| a.name),
            link,
            entry_id: entry.id,
            updated_ms: entry.updated.as_deref().and_then(parse_ms),
        })
    }
}

/// Parser for the issue update feed.
#[derive(Debug, Clone)]
pub struct IssueFeedFormat {
    pub tool: String,
}

impl Default for IssueFeedFormat {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
        }
    }
}

impl IssueFeedFormat {
    /// Events in feed order. Unsupported entries are logged and skipped.
    pub fn events(&self, report: &RawReport) -> Result<Vec<IssueEvent>, ReportError> {
        let feed: Feed =
            quick_xml::de::from_str(&report.content).map_err(|source| ReportError::Xml {
                path: report.path.clone(),
                source,
            })?;
        let mut events = Vec::with_capacity(feed.entries.len());
        for entry in feed.entries {
            match IssueEvent::from_entry(entry) {
                Ok(event) => events.push(event),
                Err(reason) => warn!(path = %report.path.display(), %reason, "skipping feed entry"),
            }
        }
        debug!(events = events.len(), "parsed issue feed");
        Ok(events)
    }
}

impl ReportFormat for IssueFeedFormat {
    fn tool(&self) -> &str {
        &self.tool
    }

    fn data_type(&self) -> SensorDataType {
        SensorDataType::Issue
    }

    fn parse(
        &self,
        report: &RawReport,
        ctx: &mut ParseContext,
    ) -> Result<Vec<SensorRecord>, ReportError> {
        let events = self.events(report)?;
        let records = events
            .into_iter()
            .map(|e| {
                let base = e.updated_ms.unwrap_or(report.modified_ms);
                ctx.record(&self.tool, SensorDataType::Issue, base, "")
                    .with(keys::issue::ID, e.issue.to_string())
                    .with(keys::issue::UPDATE_NUMBER, e.update.to_string())
                    .with(keys::issue::COMMENT, e.comment)
                    .with_opt(keys::issue::STATUS, e.status)
                    .with_opt(keys::issue::AUTHOR, e.author)
                    .with_opt(keys::issue::LINK, e.link)
            })
            .collect();
        Ok(records)
    }
}
