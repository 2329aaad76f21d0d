use common::{LogQuery, LogRecord, NewLog};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    logs: Arc<RwLock<Vec<LogRecord>>>,
}

#[axum::async_trait]
impl crate::LogStore for InMemoryStore {
    async fn list_logs(
        &self,
        query: &LogQuery,
        default_limit: u32,
    ) -> anyhow::Result<Vec<LogRecord>> {
        let logs = self.logs.read().await;
        let matching = logs.iter().rev().filter(|log| matches_query(log, query));

        let list = match (query.page, query.limit) {
            (None, None) => matching.cloned().collect(),
            (page, limit) => {
                let limit = limit.unwrap_or(default_limit).max(1) as usize;
                let page = page.unwrap_or(1).max(1) as usize;
                matching
                    .skip((page - 1) * limit)
                    .take(limit)
                    .cloned()
                    .collect()
            }
        };
        Ok(list)
    }

    async fn add_log(&self, new: NewLog) -> anyhow::Result<LogRecord> {
        let entry = LogRecord::from_new(new);
        self.logs.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        let mut logs = self.logs.write().await;
        let removed = logs.len();
        logs.clear();
        Ok(removed)
    }
}

fn matches_query(log: &LogRecord, query: &LogQuery) -> bool {
    let user_ok = match query.stake_username.as_deref().filter(|s| !s.is_empty()) {
        Some(needle) => log
            .stake_username
            .as_deref()
            .is_some_and(|name| name.contains(needle)),
        None => true,
    };
    let level_ok = match query.level.as_deref().filter(|s| !s.is_empty()) {
        Some(level) => log.level.eq_ignore_ascii_case(level),
        None => true,
    };
    user_ok && level_ok
}
