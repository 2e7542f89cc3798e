use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use stripe::Currency;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 10;
pub const MAX_PROCESSOR_RETRIES: u32 = 1;

/// Smallest accepted payment, in cents ($5.00).
pub const MIN_PAYMENT_CENTS: i64 = 500;
/// Largest accepted payment, in cents ($650.00, the full package price).
pub const MAX_PAYMENT_CENTS: i64 = 65_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("STRIPE_SECRET_KEY is not set")]
    MissingSecretKey,
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("STRIPE_MAX_RETRIES must be 0 or 1, got {0}")]
    TooManyRetries(u32),
}

/// Bounds and currency every payment intent is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPolicy {
    pub min_amount: i64,
    pub max_amount: i64,
    pub currency: Currency,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            min_amount: MIN_PAYMENT_CENTS,
            max_amount: MAX_PAYMENT_CENTS,
            currency: Currency::USD,
        }
    }
}

/// How the outbound processor call is bounded.
///
/// Retries only apply to transient failures (timeouts and transport errors);
/// anything the processor actively rejected fails immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for ProcessorPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROCESSOR_TIMEOUT_SECS),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeMode {
    Test,
    Live,
}

impl fmt::Display for StripeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripeMode::Test => f.write_str("TEST"),
            StripeMode::Live => f.write_str("LIVE"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub stripe_secret_key: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub payment: PaymentPolicy,
    pub processor: ProcessorPolicy,
}

// Keeps the secret key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("stripe_mode", &self.stripe_mode())
            .field("port", &self.port)
            .field("public_dir", &self.public_dir)
            .field("payment", &self.payment)
            .field("processor", &self.processor)
            .finish()
    }
}

impl Config {
    /// Reads and validates the process environment. Called once at startup;
    /// an error here means the server must not start.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stripe_secret_key = lookup("STRIPE_SECRET_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecretKey)?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let public_dir = lookup("PUBLIC_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR));

        let timeout_secs = parse_or(
            &lookup,
            "STRIPE_TIMEOUT_SECS",
            DEFAULT_PROCESSOR_TIMEOUT_SECS,
        )?;
        let max_retries = parse_or(&lookup, "STRIPE_MAX_RETRIES", 0u32)?;
        if max_retries > MAX_PROCESSOR_RETRIES {
            return Err(ConfigError::TooManyRetries(max_retries));
        }

        Ok(Self {
            stripe_secret_key,
            port,
            public_dir,
            payment: PaymentPolicy::default(),
            processor: ProcessorPolicy {
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
            },
        })
    }

    pub fn stripe_mode(&self) -> StripeMode {
        if self.stripe_secret_key.starts_with("sk_test") {
            StripeMode::Test
        } else {
            StripeMode::Live
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        _ => Ok(default),
    }
}
