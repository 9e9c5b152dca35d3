//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub probes: ProbesConfig,
    pub orchestrator: OrchestratorConfig,
    pub scheduler: SchedulerConfig,
    pub entitlements: EntitlementsConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Signal probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    /// Budget for a single probe, enforced by the orchestrator
    pub probe_timeout_seconds: u64,
    /// Timeout for an individual DNS query
    pub dns_timeout_seconds: u64,
    /// Attempts per DNS query before the lookup is reported as failed
    pub dns_attempts: usize,
    /// Timeout for HTTP requests issued by probes
    pub http_timeout_seconds: u64,
    /// DKIM selectors tried under `{selector}._domainkey.{domain}`
    pub dkim_selectors: Vec<String>,
    /// Product token sent in the `User-Agent` header
    pub user_agent: String,
    pub rdap_base_url: String,
    pub breach_api_base_url: String,
    /// Optional API key for the breach data source
    pub breach_api_key: Option<String>,
    pub crtsh_base_url: String,
    /// Whether the certificate-transparency subdomain probe is registered
    pub enable_subdomains: bool,
    pub max_subdomains: usize,
    /// Maximum number of addresses looked up for reverse DNS
    pub max_ptr_lookups: usize,
    pub tls_port: u16,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            probe_timeout_seconds: 15,
            dns_timeout_seconds: 5,
            dns_attempts: 2,
            http_timeout_seconds: 10,
            dkim_selectors: [
                "default",
                "google",
                "selector1",
                "selector2",
                "k1",
                "mail",
                "dkim",
                "smtp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            user_agent: "itreality-probe/0.1".to_string(),
            rdap_base_url: "https://rdap.org".to_string(),
            breach_api_base_url: "https://haveibeenpwned.com/api/v3".to_string(),
            breach_api_key: None,
            crtsh_base_url: "https://crt.sh".to_string(),
            enable_subdomains: true,
            max_subdomains: 200,
            max_ptr_lookups: 4,
            tls_port: 443,
        }
    }
}

impl ProbesConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_seconds)
    }
}

/// Snapshot pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Wall-clock budget for collection plus synthesis of a single snapshot
    pub run_budget_seconds: u64,
    /// Maximum number of domains processed concurrently during a tick
    pub max_concurrent_domains: usize,
    /// Public URL embedded in reports so readers can find the service
    pub context_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            run_budget_seconds: 120,
            max_concurrent_domains: 4,
            context_url: "https://itreality.example/report".to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_budget_seconds)
    }
}

/// Periodic re-snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// How often the background worker runs a tick
    pub interval_hours: u64,
    /// Days after the last completed snapshot before a domain is due again
    pub snapshot_interval_days: i64,
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            snapshot_interval_days: 30,
            run_on_startup: false,
        }
    }
}

/// Limits for a single subscription tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TierLimitConfig {
    /// Minimum days between snapshots of the same domain (0 disables the cooldown)
    pub cooldown_days: i64,
    /// Maximum distinct domains tracked (`None` = unlimited)
    pub max_domains: Option<usize>,
}

/// No cooldown and no domain ceiling
impl Default for TierLimitConfig {
    fn default() -> Self {
        Self {
            cooldown_days: 0,
            max_domains: None,
        }
    }
}

/// Tier entitlements for on-demand snapshot requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitlementsConfig {
    pub free: TierLimitConfig,
    pub basic: TierLimitConfig,
}

impl Default for EntitlementsConfig {
    fn default() -> Self {
        Self {
            free: TierLimitConfig {
                cooldown_days: 30,
                max_domains: Some(3),
            },
            basic: TierLimitConfig::default(),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Active provider: "openai" (any OpenAI-compatible endpoint)
    pub provider: String,

    #[serde(default)]
    pub openai: OpenAIConfig,

    pub default_model: String,
    /// Temperature for generation (0.0 to 1.0)
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    #[serde(default)]
    pub resilience: LlmResilienceConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            openai: OpenAIConfig::default(),
            default_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            timeout_seconds: 60,
            resilience: LlmResilienceConfig::default(),
        }
    }
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// API Key (can also use OPENAI_API_KEY env var)
    pub api_key: Option<String>,
    pub base_url: String,
    pub organization_id: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            organization_id: None,
        }
    }
}

/// LLM resilience configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmResilienceConfig {
    /// Enable resilience wrapper (circuit breaker + retry)
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Number of failures before circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds before circuit attempts recovery
    pub circuit_breaker_timeout_secs: u64,
}

impl Default for LlmResilienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL (can also be set via DATABASE_URL env var).
    /// Empty selects the in-memory snapshot store.
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    /// Apply the bundled migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            connect_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

/// Snapshot-ready notification delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Webhook receiving snapshot-ready events; unset logs them instead
    pub webhook_url: Option<String>,
    /// HMAC-SHA256 signing secret for webhook payloads
    pub webhook_secret: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_secret: None,
            timeout_seconds: 10,
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.probes.validate()?;
        self.orchestrator.validate()?;
        self.scheduler.validate()?;
        self.entitlements.validate()?;
        self.llm.validate()?;
        self.database.validate()?;
        self.notifications.validate()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Local overrides and environment variables take precedence
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("ITREALITY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("probes.dkim_selectors")
                    .try_parsing(true),
            );

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            config.database.url = database_url;
        }
        if config.llm.openai.api_key.is_none()
            && let Ok(key) = std::env::var("OPENAI_API_KEY")
        {
            config.llm.openai.api_key = Some(key);
        }

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_tier_limits() {
        let entitlements = EntitlementsConfig::default();
        assert_eq!(entitlements.free.cooldown_days, 30);
        assert_eq!(entitlements.free.max_domains, Some(3));
        assert_eq!(entitlements.basic.cooldown_days, 0);
        assert_eq!(entitlements.basic.max_domains, None);
    }

    #[test]
    fn test_default_budgets() {
        let config = Config::default();
        assert_eq!(config.probes.probe_timeout(), Duration::from_secs(15));
        assert_eq!(config.orchestrator.run_budget(), Duration::from_secs(120));
        assert_eq!(config.scheduler.snapshot_interval_days, 30);
    }
}
