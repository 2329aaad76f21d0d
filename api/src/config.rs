use std::net::Ipv4Addr;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub address: Ipv4Addr,
    pub port: u16,
    pub log_level: String,
    /// Secret expected in `x-delete-token`; deletion is unguarded when unset.
    pub delete_token: Option<String>,
    pub default_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("address", "127.0.0.1")?
            .set_default("port", 3000u16)?
            .set_default("log_level", "info")?
            .set_default("default_limit", 50u32)?
            .add_source(config::File::with_name("api").required(false))
            .add_source(config::Environment::with_prefix("LOGBOARD_API").separator("__"));

        builder.build()?.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::new(127, 0, 0, 1),
            port: 3000u16,
            log_level: String::from("info"),
            delete_token: None,
            default_limit: 50,
        }
    }
}
