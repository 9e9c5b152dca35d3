//! Tier entitlements for on-demand snapshot requests
//!
//! A request for a domain the owner already tracks is subject to the tier
//! cooldown; a request for a new domain is subject to the tier's domain
//! ceiling. A new domain never triggers a cooldown.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use itreality_core::config::{EntitlementsConfig, TierLimitConfig};
use itreality_core::domain::{DomainName, Snapshot, SubscriptionTier};

/// Structured, user-facing reason a request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EntitlementDenial {
    #[error(
        "{domain} was checked recently; the next snapshot is available in {days_remaining} day(s), at {next_eligible_at}"
    )]
    CooldownNotElapsed {
        domain: DomainName,
        next_eligible_at: DateTime<Utc>,
        days_remaining: i64,
    },

    #[error("your plan covers {limit} domain(s) and {tracked} are already tracked")]
    DomainCeilingReached { limit: usize, tracked: usize },
}

/// Tier limits resolved from configuration
#[derive(Debug, Clone)]
pub struct EntitlementPolicy {
    free: TierLimitConfig,
    basic: TierLimitConfig,
}

impl EntitlementPolicy {
    pub fn new(config: &EntitlementsConfig) -> Self {
        Self {
            free: config.free.clone(),
            basic: config.basic.clone(),
        }
    }

    pub fn limits(&self, tier: SubscriptionTier) -> &TierLimitConfig {
        match tier {
            SubscriptionTier::Free => &self.free,
            SubscriptionTier::Basic => &self.basic,
        }
    }

    /// Decide whether an owner on `tier` with the given snapshot `history`
    /// may snapshot `domain` at `now`.
    ///
    /// Only completed snapshots count towards tracking and cooldown.
    pub fn check(
        &self,
        tier: SubscriptionTier,
        domain: &DomainName,
        history: &[Snapshot],
        now: DateTime<Utc>,
    ) -> Result<(), EntitlementDenial> {
        let limits = self.limits(tier);

        let mut last_completed: HashMap<&DomainName, DateTime<Utc>> = HashMap::new();
        for snapshot in history.iter().filter(|s| s.is_completed()) {
            let entry = last_completed
                .entry(&snapshot.domain)
                .or_insert(snapshot.created_at);
            if snapshot.created_at > *entry {
                *entry = snapshot.created_at;
            }
        }

        if let Some(last) = last_completed.get(domain) {
            if limits.cooldown_days <= 0 {
                return Ok(());
            }
            let next_eligible_at = *last + Duration::days(limits.cooldown_days);
            if now < next_eligible_at {
                return Err(EntitlementDenial::CooldownNotElapsed {
                    domain: domain.clone(),
                    next_eligible_at,
                    days_remaining: days_until(now, next_eligible_at),
                });
            }
            return Ok(());
        }

        if let Some(limit) = limits.max_domains {
            let tracked = last_completed.len();
            if tracked >= limit {
                return Err(EntitlementDenial::DomainCeilingReached { limit, tracked });
            }
        }

        Ok(())
    }
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self::new(&EntitlementsConfig::default())
    }
}

/// Whole days until `deadline`, rounded up
fn days_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> i64 {
    let remaining = deadline - now;
    let days = remaining.num_days();
    if remaining > Duration::days(days) {
        days + 1
    } else {
        days
    }
}
