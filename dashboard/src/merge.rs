use common::LogRecord;

/// How a fetch result joins the collection already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// New criteria or first load: the result is the whole collection.
    Replace,
    /// Next page under unchanged criteria: the result goes after what is there.
    Append,
}

/// Existing entries are never reordered and ids are not de-duplicated.
pub fn merge(previous: Vec<LogRecord>, fetched: Vec<LogRecord>, mode: MergeMode) -> Vec<LogRecord> {
    match mode {
        MergeMode::Replace => fetched,
        MergeMode::Append => {
            let mut merged = previous;
            merged.extend(fetched);
            merged
        }
    }
}
