//! Snapshot name codec.
//!
//! A managed snapshot carries its scheduling metadata in its name:
//!
//! ```text
//! hadoopit-<frequency minutes>-<yyyy.MM.dd.H.m.s.SSS>[-<label>]
//! ```
//!
//! e.g. `hadoopit-1440-2014.01.01.3.5.0.250-daily`. Hour, minute and second
//! are written without padding; both padded and unpadded forms decode. The
//! format is persisted in the filesystem and must stay stable.
//!
//! Timestamps in names are UTC. Names written in a local zone by older tools
//! are read as UTC and are not adjusted.

use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, Utc};
use hadoopit_core::error::{HadoopitError, Result};

pub const PREFIX: &str = "hadoopit";
pub const SEPARATOR: char = '-';

const TIMESTAMP_WRITE_FORMAT: &str = "%Y.%m.%d.%-H.%-M.%-S.%3f";
const TIMESTAMP_READ_FORMAT: &str = "%Y.%m.%d.%H.%M.%S.%3f";

/// Metadata decoded from a snapshot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    pub frequency_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
}

/// Encode scheduling metadata into a snapshot name.
///
/// The timestamp is truncated to milliseconds. Only years 0 through 9999 are
/// representable; other years would put a sign or a fifth digit into the
/// name. `label` must already have passed [`validate_label`].
pub fn encode(
    frequency_minutes: u32,
    timestamp: DateTime<Utc>,
    label: Option<&str>,
) -> Result<String> {
    if !(0..=9999).contains(&timestamp.year()) {
        return Err(HadoopitError::config(format!(
            "Snapshot timestamp {} is outside the years 0 to 9999",
            timestamp
        )));
    }

    let mut name = format!(
        "{}{}{}{}{}",
        PREFIX,
        SEPARATOR,
        frequency_minutes,
        SEPARATOR,
        timestamp.format(TIMESTAMP_WRITE_FORMAT)
    );
    if let Some(label) = label {
        name.push(SEPARATOR);
        name.push_str(label);
    }
    Ok(name)
}

pub fn decode(identifier: &str) -> Result<DecodedName> {
    let fields: Vec<&str> = identifier.splitn(4, SEPARATOR).collect();
    if fields.len() < 3 {
        return Err(HadoopitError::malformed(
            identifier,
            format!(
                "expected at least 3 '{}' separated fields, found {}",
                SEPARATOR,
                fields.len()
            ),
        ));
    }

    if fields[0] != PREFIX {
        return Err(HadoopitError::malformed(
            identifier,
            format!("expected prefix '{}', found '{}'", PREFIX, fields[0]),
        ));
    }

    if fields[1].is_empty() || !fields[1].bytes().all(|b| b.is_ascii_digit()) {
        return Err(HadoopitError::malformed(
            identifier,
            format!("frequency '{}' is not an unsigned integer", fields[1]),
        ));
    }
    let frequency_minutes = fields[1].parse::<u32>().map_err(|_| {
        HadoopitError::malformed(
            identifier,
            format!("frequency '{}' is not an integer", fields[1]),
        )
    })?;

    if !fields[2].bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(HadoopitError::malformed(
            identifier,
            format!("timestamp '{}' contains characters other than digits and '.'", fields[2]),
        ));
    }
    let created_at = NaiveDateTime::parse_from_str(fields[2], TIMESTAMP_READ_FORMAT)
        .map_err(|e| {
            HadoopitError::malformed(
                identifier,
                format!("timestamp '{}' is invalid: {}", fields[2], e),
            )
        })?
        .and_utc();

    let label = match fields.get(3) {
        None => None,
        Some(&"") => {
            return Err(HadoopitError::malformed(identifier, "label is empty"));
        }
        Some(label) => Some(label.to_string()),
    };

    Ok(DecodedName {
        frequency_minutes,
        created_at,
        label,
    })
}

/// The name prefix shared by every snapshot with this frequency tag.
///
/// The trailing separator keeps `hadoopit-1-` from matching `hadoopit-10-`.
pub fn name_prefix(frequency_minutes: u32) -> String {
    format!("{}{}{}{}", PREFIX, SEPARATOR, frequency_minutes, SEPARATOR)
}

/// Labels become part of the name, so they must not contain the separator
/// or a path delimiter.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(HadoopitError::config("Snapshot label must not be empty"));
    }
    if let Some(bad) = label.chars().find(|c| *c == SEPARATOR || *c == '/' || c.is_whitespace()) {
        return Err(HadoopitError::config(format!(
            "Snapshot label '{}' must not contain {:?}",
            label, bad
        )));
    }
    Ok(())
}

/// Drop everything below millisecond precision.
pub fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(3)
}
