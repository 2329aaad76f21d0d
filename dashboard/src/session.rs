use std::sync::Arc;

use common::{LogRecord, PushEnvelope};
use tokio::sync::{RwLock, watch};

use crate::filter::FilterCriteria;
use crate::service::LogService;
use crate::sort::{SortField, SortSpec};
use crate::state::{FetchKind, StateUpdate, ViewSnapshot, ViewState};

#[derive(Clone, Debug)]
pub struct DashboardOptions {
    /// Paginated mode when set.
    pub page_size: Option<u32>,
    /// Client-side ordering; `None` keeps the service's order.
    pub sort: Option<SortSpec>,
    /// Secret sent with deletes.
    pub delete_token: Option<String>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: None,
            sort: Some(SortSpec::default()),
            delete_token: None,
        }
    }
}

/// Result of a fetch-issuing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued before this one resolved.
    Stale,
    /// Logged; the collection is unchanged.
    Failed,
    /// Nothing to fetch in the current mode.
    Skipped,
}

/// Cloneable handle on one dashboard session.
#[derive(Clone)]
pub struct Dashboard {
    pub(crate) service: Arc<dyn LogService>,
    state: Arc<RwLock<ViewState>>,
    revision: Arc<watch::Sender<u64>>,
    pub(crate) delete_token: Option<String>,
}

impl Dashboard {
    pub fn new(service: impl LogService + 'static, options: DashboardOptions) -> Self {
        Self {
            service: Arc::new(service),
            state: Arc::new(RwLock::new(ViewState::new(options.page_size, options.sort))),
            revision: Arc::new(watch::channel(0).0),
            delete_token: options.delete_token,
        }
    }

    pub async fn apply(&self, update: StateUpdate) -> bool {
        let applied = self.state.write().await.apply(update);
        if applied {
            self.bump();
        }
        applied
    }

    /// Ticks whenever an update takes effect.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn logs(&self) -> Vec<LogRecord> {
        self.state.read().await.logs().to_vec()
    }

    /// Replaces the criteria and reloads from the first page.
    pub async fn set_filter(&self, criteria: FilterCriteria) -> FetchOutcome {
        self.execute(FetchKind::Filter(criteria)).await
    }

    /// Reloads the first page under the current criteria.
    pub async fn refresh(&self) -> FetchOutcome {
        self.execute(FetchKind::Refresh).await
    }

    /// Appends the next page. Skipped outside paginated mode.
    pub async fn load_more(&self) -> FetchOutcome {
        self.execute(FetchKind::NextPage).await
    }

    pub async fn set_sort(&self, spec: Option<SortSpec>) {
        self.apply(StateUpdate::Sorted(spec)).await;
    }

    /// Column-header style toggle, returns the resulting ordering.
    pub async fn request_sort(&self, field: SortField) -> SortSpec {
        let mut state = self.state.write().await;
        let spec = state.sort().unwrap_or_default().request(field);
        state.apply(StateUpdate::Sorted(Some(spec)));
        drop(state);
        self.bump();
        spec
    }

    /// Feeds one push channel frame. Returns whether a log was prepended;
    /// anything that is not a well-formed `NEW_LOG` message is dropped.
    pub async fn receive_push(&self, frame: &str) -> bool {
        let record = match serde_json::from_str::<PushEnvelope>(frame) {
            Ok(envelope) => envelope.into_new_log(),
            Err(err) => {
                tracing::debug!("dropping undecodable push frame: {err}");
                return false;
            }
        };
        match record {
            Some(record) => self.apply(StateUpdate::Pushed(record)).await,
            None => false,
        }
    }

    async fn execute(&self, kind: FetchKind) -> FetchOutcome {
        // The lock is released before the request goes out.
        let issued = self.state.write().await.issue(kind);
        let Some((ticket, query)) = issued else {
            return FetchOutcome::Skipped;
        };

        match self.service.fetch_logs(&query).await {
            Ok(records) => {
                let count = records.len();
                if self.apply(StateUpdate::Fetched { ticket, records }).await {
                    tracing::debug!(seq = ticket.seq(), count, "applied fetched logs");
                    FetchOutcome::Applied
                } else {
                    tracing::debug!(seq = ticket.seq(), "discarding superseded response");
                    FetchOutcome::Stale
                }
            }
            Err(err) => {
                tracing::error!("failed to fetch logs: {err}");
                self.apply(StateUpdate::FetchFailed(ticket)).await;
                FetchOutcome::Failed
            }
        }
    }
}
