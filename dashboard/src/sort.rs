//! Client-side ordering of a log collection.

use std::cmp::Ordering;

use clap::ValueEnum;
use common::LogRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortField {
    Timestamp,
    Level,
    StakeUsername,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    #[value(name = "asc")]
    Ascending,
    #[value(name = "desc")]
    Descending,
}

/// One active sort column and its direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Timestamp,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Column-header click: an already ascending column flips to descending,
    /// anything else becomes the ascending column.
    pub fn request(self, field: SortField) -> Self {
        let direction = if self.field == field && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self { field, direction }
    }
}

/// Returns `records` ordered by `spec`. Equal keys keep their relative order.
pub fn sort_records(records: &[LogRecord], spec: SortSpec) -> Vec<LogRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, spec.field);
        match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}

fn compare(a: &LogRecord, b: &LogRecord, field: SortField) -> Ordering {
    match field {
        SortField::Timestamp => a.instant().cmp(&b.instant()),
        SortField::Level => a.level.cmp(&b.level),
        SortField::StakeUsername => a
            .stake_username
            .as_deref()
            .unwrap_or("")
            .cmp(b.stake_username.as_deref().unwrap_or("")),
    }
}
