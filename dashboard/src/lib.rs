//! Query, ordering, pagination and live-update engine for a log dashboard.
//!
//! A [`Dashboard`] owns the view state of one session. Filter changes,
//! page loads, live pushes and deletes all funnel their writes through
//! [`Dashboard::apply`]; responses to superseded queries are discarded.

pub mod config;
pub mod delete;
pub mod error;
pub mod filter;
pub mod live;
pub mod merge;
pub mod service;
pub mod session;
pub mod sort;
pub mod state;

pub use delete::{Confirm, DeleteOutcome};
pub use error::ServiceError;
pub use filter::{FilterCriteria, PageState};
pub use live::{Backoff, LiveListener, LiveOptions};
pub use service::{HttpLogService, LogService};
pub use session::{Dashboard, DashboardOptions, FetchOutcome};
pub use sort::{SortDirection, SortField, SortSpec, sort_records};
pub use state::{StateUpdate, ViewSnapshot};
