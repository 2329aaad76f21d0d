use std::time::Duration;

use serde::Deserialize;

use crate::live::{Backoff, LiveOptions};
use crate::session::DashboardOptions;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub ws_url: String,
    pub delete_token: Option<String>,
    /// Paginated mode when set.
    pub page_size: Option<u32>,
    pub request_timeout_ms: u64,
    pub log_level: String,
    pub reconnect: bool,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("api_url", "http://127.0.0.1:3000")?
            .set_default("ws_url", "ws://127.0.0.1:3000/ws")?
            .set_default("request_timeout_ms", 10_000u64)?
            .set_default("log_level", "warn")?
            .set_default("reconnect", true)?
            .set_default("reconnect_initial_ms", 500u64)?
            .set_default("reconnect_max_ms", 30_000u64)?
            .add_source(config::File::with_name("logboard").required(false))
            .add_source(config::Environment::with_prefix("LOGBOARD").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            page_size: self.page_size,
            delete_token: self.delete_token.clone(),
            ..DashboardOptions::default()
        }
    }

    /// Reconnect delays are at least 1 ms so backoff can grow.
    pub fn live_options(&self) -> LiveOptions {
        let initial_ms = self.reconnect_initial_ms.max(1);
        LiveOptions {
            url: self.ws_url.clone(),
            reconnect: self.reconnect.then(|| Backoff {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(self.reconnect_max_ms.max(initial_ms)),
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::from("http://127.0.0.1:3000"),
            ws_url: String::from("ws://127.0.0.1:3000/ws"),
            delete_token: None,
            page_size: None,
            request_timeout_ms: 10_000,
            log_level: String::from("warn"),
            reconnect: true,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
        }
    }
}
