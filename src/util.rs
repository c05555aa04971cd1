//! Shared utility functions for the kanban crate.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2026-10-14T08:30:00.000Z`.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Calendar date of `now` in UTC, `YYYY-MM-DD`.
pub fn iso_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Collapse line breaks to single spaces so a value stays on one markdown line.
pub fn single_line(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("\r\n", " ")
            .replace(['\n', '\r'], " "),
    )
}

/// Trim `value`, treating an all-whitespace string as absent.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
