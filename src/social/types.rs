use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Outcome shape handed to callers that want a sentinel instead of an error:
/// `{"success": false, "error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// Collapse a result into the sentinel shape, logging the failure
    pub fn from_result<T>(operation: &str, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => {
                error!("[{}] failed: {:#}", operation, e);
                Self::failed(e.to_string())
            }
        }
    }
}

/// Current time in Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn to_local(millis: i64) -> Option<DateTime<Local>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.with_timezone(&Local))
}

/// Format a timestamp as e.g. `Fri, Oct 16`
pub fn format_event_date(millis: i64) -> String {
    to_local(millis)
        .map(|t| t.format("%a, %b %-d").to_string())
        .unwrap_or_default()
}

/// Format a timestamp as e.g. `7:30 PM`
pub fn format_event_time(millis: i64) -> String {
    to_local(millis)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// `Fri, Oct 16 · 7:00 PM - 11:00 PM`; the end date is repeated when the
/// window crosses midnight.
pub fn format_event_window(start: i64, end: i64) -> String {
    let start_date = format_event_date(start);
    let end_date = format_event_date(end);
    if start_date == end_date {
        format!(
            "{} · {} - {}",
            start_date,
            format_event_time(start),
            format_event_time(end)
        )
    } else {
        format!(
            "{} · {} - {} · {}",
            start_date,
            format_event_time(start),
            end_date,
            format_event_time(end)
        )
    }
}
