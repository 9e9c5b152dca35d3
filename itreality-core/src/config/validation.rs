//! Configuration validation module

use crate::config::{
    DatabaseConfig, EntitlementsConfig, LlmConfig, LoggingConfig, NotificationsConfig,
    OrchestratorConfig, ProbesConfig, SchedulerConfig, TierLimitConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Logging configuration error: {message}")]
    Logging { message: String },

    #[error("Probe configuration error: {message}")]
    Probes { message: String },

    #[error("Orchestrator configuration error: {message}")]
    Orchestrator { message: String },

    #[error("Scheduler configuration error: {message}")]
    Scheduler { message: String },

    #[error("Entitlements configuration error: {message}")]
    Entitlements { message: String },

    #[error("LLM configuration error: {message}")]
    Llm { message: String },

    #[error("Database configuration error: {message}")]
    Database { message: String },

    #[error("Notification configuration error: {message}")]
    Notifications { message: String },
}

impl ValidationError {
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    pub fn probes(message: impl Into<String>) -> Self {
        Self::Probes {
            message: message.into(),
        }
    }

    pub fn orchestrator(message: impl Into<String>) -> Self {
        Self::Orchestrator {
            message: message.into(),
        }
    }

    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler {
            message: message.into(),
        }
    }

    pub fn entitlements(message: impl Into<String>) -> Self {
        Self::Entitlements {
            message: message.into(),
        }
    }

    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn notifications(message: impl Into<String>) -> Self {
        Self::Notifications {
            message: message.into(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::logging("Log level cannot be empty"));
        }
        if !matches!(self.format.as_str(), "json" | "pretty") {
            return Err(ValidationError::logging(format!(
                "Log format must be 'json' or 'pretty', got: {}",
                self.format
            )));
        }
        Ok(())
    }
}

impl Validate for ProbesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.probe_timeout_seconds == 0 {
            return Err(ValidationError::probes(
                "Probe timeout must be greater than 0 seconds",
            ));
        }
        if self.dns_timeout_seconds == 0 || self.dns_attempts == 0 {
            return Err(ValidationError::probes(
                "DNS timeout and attempts must be greater than 0",
            ));
        }
        if self.http_timeout_seconds == 0 {
            return Err(ValidationError::probes(
                "HTTP timeout must be greater than 0 seconds",
            ));
        }
        if self.dkim_selectors.iter().any(|s| s.trim().is_empty()) {
            return Err(ValidationError::probes("DKIM selectors cannot be empty"));
        }
        for (name, url) in [
            ("rdap_base_url", &self.rdap_base_url),
            ("breach_api_base_url", &self.breach_api_base_url),
            ("crtsh_base_url", &self.crtsh_base_url),
        ] {
            if !is_http_url(url) {
                return Err(ValidationError::probes(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::probes("User agent cannot be empty"));
        }
        if self.max_subdomains == 0 {
            return Err(ValidationError::probes(
                "max_subdomains must be greater than 0",
            ));
        }
        if self.tls_port == 0 {
            return Err(ValidationError::probes("TLS port must be in range 1-65535"));
        }
        Ok(())
    }
}

impl Validate for OrchestratorConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.run_budget_seconds == 0 {
            return Err(ValidationError::orchestrator(
                "Run budget must be greater than 0 seconds",
            ));
        }
        if self.max_concurrent_domains == 0 {
            return Err(ValidationError::orchestrator(
                "max_concurrent_domains must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Validate for SchedulerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_hours == 0 {
            return Err(ValidationError::scheduler(
                "Scheduler interval must be greater than 0 hours",
            ));
        }
        if self.snapshot_interval_days <= 0 {
            return Err(ValidationError::scheduler(format!(
                "snapshot_interval_days must be positive, got {}",
                self.snapshot_interval_days
            )));
        }
        Ok(())
    }
}

impl Validate for TierLimitConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.cooldown_days < 0 {
            return Err(ValidationError::entitlements(format!(
                "cooldown_days cannot be negative, got {}",
                self.cooldown_days
            )));
        }
        if self.max_domains == Some(0) {
            return Err(ValidationError::entitlements(
                "max_domains must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}

impl Validate for EntitlementsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.free.validate()?;
        self.basic.validate()
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.provider != "openai" {
            return Err(ValidationError::llm(format!(
                "Unsupported LLM provider: {}",
                self.provider
            )));
        }
        if !is_http_url(&self.openai.base_url) {
            return Err(ValidationError::llm(format!(
                "OpenAI base_url must start with http:// or https://, got: {}",
                self.openai.base_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ValidationError::llm("LLM timeout must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::llm(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::llm("max_tokens must be > 0"));
        }
        Ok(())
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            // In-memory store
            return Ok(());
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::database(
                "Database URL must start with postgres:// or postgresql://",
            ));
        }
        if self.max_connections == 0 {
            return Err(ValidationError::database(
                "max_connections must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Validate for NotificationsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.webhook_url
            && !is_http_url(url)
        {
            return Err(ValidationError::notifications(format!(
                "Webhook URL must start with http:// or https://, got: {url}"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ValidationError::notifications(
                "Notification timeout must be greater than 0 seconds",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_validation() {
        let valid = LoggingConfig::default();
        assert!(valid.validate().is_ok());

        let invalid = LoggingConfig {
            format: "xml".to_string(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_probes_config_validation() {
        let valid = ProbesConfig::default();
        assert!(valid.validate().is_ok());

        let invalid = ProbesConfig {
            probe_timeout_seconds: 0,
            ..valid.clone()
        };
        assert!(invalid.validate().is_err());

        let invalid = ProbesConfig {
            rdap_base_url: "rdap.org".to_string(),
            ..valid.clone()
        };
        assert!(invalid.validate().is_err());

        let invalid = ProbesConfig {
            dkim_selectors: vec!["google".to_string(), " ".to_string()],
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_tier_limit_validation() {
        let invalid = TierLimitConfig {
            cooldown_days: -1,
            max_domains: None,
        };
        assert!(invalid.validate().is_err());

        let invalid = TierLimitConfig {
            cooldown_days: 30,
            max_domains: Some(0),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_database_config_validation() {
        assert!(DatabaseConfig::default().validate().is_ok());

        let invalid = DatabaseConfig {
            url: "mysql://localhost/itreality".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_notifications_config_validation() {
        let invalid = NotificationsConfig {
            webhook_url: Some("ftp://hooks.local".to_string()),
            ..NotificationsConfig::default()
        };
        assert!(invalid.validate().is_err());
    }
}
