//! Server configuration.
//!
//! Everything is read from `SFG_*` environment variables. A missing or invalid value is logged and replaced with its
//! default, so the server always starts. The Stripe credentials are the exception to "always works": without them,
//! charges are rejected and every webhook call fails verification.
use std::{env, time::Duration};

use log::*;
use order_engine::{Deadlines, DEFAULT_GATEWAY_DEADLINE, DEFAULT_LEDGER_DEADLINE};
use storefront_common::helpers::parse_number;
use stripe_tools::StripeConfig;

const DEFAULT_SFG_HOST: &str = "127.0.0.1";
const DEFAULT_SFG_PORT: u16 = 8370;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_RECONCILIATION_MONITOR_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Deadlines for calls to Stripe and to the database.
    pub deadlines: Deadlines,
    /// How often the reconciliation monitor reports outstanding entries.
    pub reconciliation_monitor_interval: Duration,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFG_HOST.to_string(),
            port: DEFAULT_SFG_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            deadlines: Deadlines::default(),
            reconciliation_monitor_interval: DEFAULT_RECONCILIATION_MONITOR_INTERVAL,
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFG_HOST").ok().unwrap_or_else(|| DEFAULT_SFG_HOST.into());
        let port = env_number("SFG_PORT", DEFAULT_SFG_PORT);
        let database_url = env::var("SFG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SFG_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let db_max_connections = env_number("SFG_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let gateway_ms = env_number("SFG_GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_DEADLINE.as_millis() as u64);
        let ledger_ms = env_number("SFG_LEDGER_TIMEOUT_MS", DEFAULT_LEDGER_DEADLINE.as_millis() as u64);
        let deadlines =
            Deadlines { gateway: Duration::from_millis(gateway_ms), ledger: Duration::from_millis(ledger_ms) };
        let monitor_secs =
            env_number("SFG_RECONCILIATION_MONITOR_SECS", DEFAULT_RECONCILIATION_MONITOR_INTERVAL.as_secs());
        let stripe = StripeConfig::new_from_env_or_default();
        if stripe.webhook_secret.is_empty() {
            warn!("🪛️ No Stripe webhook secret is configured. Every payment notification will be rejected.");
        }
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            deadlines,
            reconciliation_monitor_interval: Duration::from_secs(monitor_secs.max(1)),
            stripe,
        }
    }
}

fn env_number<T>(name: &str, default: T) -> T
where T: std::str::FromStr + std::fmt::Display + Copy {
    parse_number(env::var(name).ok(), default).unwrap_or_else(|v| {
        error!("🪛️ {v} is not a valid value for {name}. Using the default, {default}, instead.");
        default
    })
}
