use std::env;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(&'static str),
    InvalidValue { variable: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => {
                write!(f, "{} must be set in the environment or .env file", name)
            }
            ConfigError::InvalidValue { variable, reason } => {
                write!(f, "invalid value for {}: {}", variable, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// How many blocks behind the chain tip still counts as synced.
    pub sync_threshold: u64,
    pub sync_cache_ttl_secs: u64,
    pub channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "juiceflow.db".to_string());

        let chain_id = parse_var("CHAIN_ID", 5115)?;

        let rpc_url = env::var("RPC_URL")
            .unwrap_or_else(|_| "https://rpc.testnet.juiceswap.com/".to_string());
        if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                variable: "RPC_URL",
                reason: format!("expected an http(s) URL, got {}", rpc_url),
            });
        }

        Ok(Self {
            database_path,
            chain_id,
            rpc_url,
            sync_threshold: parse_var("SYNC_THRESHOLD", 500)?,
            sync_cache_ttl_secs: parse_var("SYNC_CACHE_TTL_SECS", 5)?,
            channel_capacity: parse_var("CHANNEL_CAPACITY", 10000)?,
        })
    }
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            variable: name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
