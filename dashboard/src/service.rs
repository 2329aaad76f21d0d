//! The remote Log Service as seen by the dashboard.

use std::time::Duration;

use async_trait::async_trait;
use common::{LogQuery, LogRecord};
use reqwest::Client;

use crate::error::ServiceError;

/// Header carrying the shared secret on deletes.
pub const DELETE_TOKEN_HEADER: &str = "x-delete-token";

#[async_trait]
pub trait LogService: Send + Sync {
    /// One `GET /api/logs` carrying exactly the fields present in `query`.
    async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>, ServiceError>;

    /// `DELETE /api/logs`, with the secret header when one is given.
    async fn delete_logs(&self, token: Option<&str>) -> Result<(), ServiceError>;
}

#[derive(Clone, Debug)]
pub struct HttpLogService {
    client: Client,
    api: String,
}

impl HttpLogService {
    pub fn new(api: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api: api.trim_end_matches('/').to_string(),
        })
    }

    fn logs_url(&self) -> String {
        format!("{}/api/logs", self.api)
    }
}

#[async_trait]
impl LogService for HttpLogService {
    async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>, ServiceError> {
        let resp = self.client.get(self.logs_url()).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }
        Ok(resp.json().await?)
    }

    async fn delete_logs(&self, token: Option<&str>) -> Result<(), ServiceError> {
        let mut req = self.client.delete(self.logs_url());
        if let Some(token) = token {
            req = req.header(DELETE_TOKEN_HEADER, token);
        }

        let status = req.send().await?.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }
        Ok(())
    }
}
