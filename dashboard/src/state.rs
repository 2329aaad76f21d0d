//! The view state owned by one dashboard session.
//!
//! Every write to the log collection goes through [`ViewState::apply`]: fetch
//! results, live pushes, and the reset after a delete. Fetches are tagged
//! with a [`Ticket`] whose sequence number must still be the latest issued
//! when the response arrives, otherwise the response is discarded.

use common::{LogQuery, LogRecord};

use crate::filter::{FilterCriteria, PageState};
use crate::merge::{MergeMode, merge};
use crate::sort::{SortSpec, sort_records};

/// What a fetch is for.
#[derive(Debug, Clone)]
pub enum FetchKind {
    /// New criteria: back to the first page, replace on arrival.
    Filter(FilterCriteria),
    /// Same criteria, first page, replace on arrival.
    Refresh,
    /// Same criteria, next page, append on arrival.
    NextPage,
}

/// Identifies one issued fetch and how its result is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    mode: MergeMode,
    page: Option<PageState>,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }
}

#[derive(Debug, Clone)]
pub enum StateUpdate {
    Fetched { ticket: Ticket, records: Vec<LogRecord> },
    FetchFailed(Ticket),
    Pushed(LogRecord),
    Cleared,
    Sorted(Option<SortSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub logs: Vec<LogRecord>,
    pub filter: FilterCriteria,
    pub sort: Option<SortSpec>,
    pub page: Option<PageState>,
}

#[derive(Debug)]
pub struct ViewState {
    logs: Vec<LogRecord>,
    /// Criteria the current collection was fetched under.
    filter: FilterCriteria,
    /// Criteria of the outstanding replacing fetch, committed when it lands.
    pending_filter: Option<FilterCriteria>,
    sort: Option<SortSpec>,
    page: Option<PageState>,
    latest: u64,
    in_flight: Option<Ticket>,
}

impl ViewState {
    /// `page_size` switches on paginated mode. `sort` is the client-side
    /// ordering, `None` keeps the service's order.
    pub fn new(page_size: Option<u32>, sort: Option<SortSpec>) -> Self {
        Self {
            logs: Vec::new(),
            filter: FilterCriteria::default(),
            pending_filter: None,
            sort,
            page: page_size.map(PageState::first),
            latest: 0,
            in_flight: None,
        }
    }

    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn page(&self) -> Option<PageState> {
        self.page
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            logs: self.logs.clone(),
            filter: self.filter.clone(),
            sort: self.sort,
            page: self.page,
        }
    }

    /// Registers a new fetch and returns its ticket and outbound query.
    ///
    /// `None` when there is nothing to fetch: a next page outside paginated
    /// mode, or while a replacing fetch is still outstanding.
    pub fn issue(&mut self, kind: FetchKind) -> Option<(Ticket, LogQuery)> {
        let (mode, page, criteria) = match kind {
            FetchKind::Filter(criteria) => {
                let first = self.page.map(|p| PageState::first(p.size));
                (MergeMode::Replace, first, criteria.normalized())
            }
            FetchKind::Refresh => {
                let first = self.page.map(|p| PageState::first(p.size));
                let criteria = self
                    .pending_filter
                    .clone()
                    .unwrap_or_else(|| self.filter.clone());
                (MergeMode::Replace, first, criteria)
            }
            FetchKind::NextPage => {
                let current = self.page?;
                if self
                    .in_flight
                    .is_some_and(|pending| pending.mode == MergeMode::Replace)
                {
                    return None;
                }
                (MergeMode::Append, Some(current.next()), self.filter.clone())
            }
        };

        self.latest += 1;
        let ticket = Ticket {
            seq: self.latest,
            mode,
            page,
        };
        self.in_flight = Some(ticket);
        let query = criteria.to_query(page);
        self.pending_filter = match mode {
            MergeMode::Replace => Some(criteria),
            MergeMode::Append => None,
        };
        Some((ticket, query))
    }

    /// The single mutation entry point. Returns whether the update took effect.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        match update {
            StateUpdate::Fetched { ticket, records } => {
                if ticket.seq != self.latest {
                    return false;
                }
                let merged = merge(std::mem::take(&mut self.logs), records, ticket.mode);
                self.logs = match self.sort {
                    Some(spec) => sort_records(&merged, spec),
                    None => merged,
                };
                if ticket.page.is_some() {
                    self.page = ticket.page;
                }
                if let Some(criteria) = self.pending_filter.take() {
                    self.filter = criteria;
                }
                self.in_flight = None;
                true
            }
            StateUpdate::FetchFailed(ticket) => {
                if ticket.seq != self.latest {
                    return false;
                }
                // The collection still belongs to the committed criteria.
                self.pending_filter = None;
                self.in_flight = None;
                true
            }
            StateUpdate::Pushed(record) => {
                self.logs.insert(0, record);
                true
            }
            StateUpdate::Cleared => {
                // Anything fetched before the delete is out of date.
                self.latest += 1;
                self.in_flight = None;
                self.pending_filter = None;
                self.logs.clear();
                self.page = self.page.map(|p| PageState::first(p.size));
                true
            }
            StateUpdate::Sorted(spec) => {
                self.sort = spec;
                if let Some(spec) = spec {
                    self.logs = sort_records(&self.logs, spec);
                }
                true
            }
        }
    }
}
