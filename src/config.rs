use crate::errors::{SwiftError, SwiftResult};
use clap::Args as ClapArgs;
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:8080/v1/AUTH_test";
pub const DEFAULT_CONCURRENCY: usize = 25;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Centralized client configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct SwiftConfig {
    /// Storage endpoint every container path is relative to.
    pub storage_url: String,
    /// Pre-issued token sent as `X-Auth-Token`.
    pub auth_token: Option<String>,
    /// Upper bound on in-flight requests of a batch.
    pub concurrency: usize,
    pub timeout_secs: u64,
}

/// Connection flags, shared by every binary subcommand.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Storage URL (overrides SWIFT_STORAGE_URL)
    #[arg(long, global = true)]
    pub storage_url: Option<String>,

    /// Auth token (overrides SWIFT_AUTH_TOKEN)
    #[arg(long, global = true)]
    pub auth_token: Option<String>,

    /// Max concurrent requests per batch (overrides SWIFT_CONCURRENCY)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds (overrides SWIFT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl SwiftConfig {
    pub fn new(storage_url: impl Into<String>) -> Self {
        Self {
            storage_url: storage_url.into(),
            auth_token: None,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Read configuration from the environment only.
    pub fn from_env() -> SwiftResult<Self> {
        Self::from_env_and_args(ConnectionArgs::default())
    }

    /// Environment variables with CLI arguments taking precedence.
    pub fn from_env_and_args(args: ConnectionArgs) -> SwiftResult<Self> {
        // --- Environment fallback ---
        let env_url = env::var("SWIFT_STORAGE_URL").unwrap_or_else(|_| DEFAULT_STORAGE_URL.into());
        let env_token = env::var("SWIFT_AUTH_TOKEN").ok().filter(|t| !t.is_empty());
        let env_concurrency = parse_env("SWIFT_CONCURRENCY", DEFAULT_CONCURRENCY)?;
        let env_timeout = parse_env("SWIFT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        // --- Merge ---
        Ok(Self {
            storage_url: args.storage_url.unwrap_or(env_url),
            auth_token: args.auth_token.or(env_token),
            concurrency: args.concurrency.unwrap_or(env_concurrency).max(1),
            timeout_secs: args.timeout_secs.unwrap_or(env_timeout),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> SwiftResult<T> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| SwiftError::Config(format!("parsing {} value `{}`", name, value))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(SwiftError::Config(format!("reading {}: {}", name, err))),
    }
}
