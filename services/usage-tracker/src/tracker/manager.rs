use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::{DailyUsageRecord, ReserveOutcome, UsageDatabase, UsageKey};

use super::clock::Clock;
use super::error::QuotaError;
use super::policy::{Feature, QuotaPolicy};

/// View of one usage counter after an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub tenant_id: String,
    pub instance_name: String,
    pub feature: Feature,
    pub day: String,
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
}

/// Admission control for metered features. The database row is the
/// single source of truth; nothing is cached in process, so any number
/// of tracker instances can share one store.
#[derive(Clone)]
pub struct UsageTracker {
    database: Arc<UsageDatabase>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl UsageTracker {
    pub fn new(database: Arc<UsageDatabase>, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            database,
            policy,
            clock,
        }
    }

    /// Reserve `amount` units of `feature` for today, or fail without
    /// touching the stored counter.
    pub fn check_and_reserve(
        &self,
        tenant_id: &str,
        instance_name: &str,
        feature: &str,
        amount: u64,
    ) -> Result<UsageSnapshot, QuotaError> {
        let feature = parse_feature(feature)?;
        if amount == 0 {
            return Err(QuotaError::InvalidAmount);
        }

        let limit = self.policy.limit(feature);
        let day = self.day_key();
        let key = UsageKey {
            tenant_id,
            instance_name,
            feature: feature.as_str(),
            day: &day,
        };

        match self.database.reserve(&key, amount, limit)? {
            ReserveOutcome::Admitted { used } => {
                info!(
                    tenant_id,
                    instance_name,
                    feature = %feature,
                    amount,
                    used,
                    limit,
                    "reserved usage"
                );
                Ok(self.snapshot(tenant_id, instance_name, feature, day, used, limit))
            }
            ReserveOutcome::Rejected { used } => {
                warn!(
                    tenant_id,
                    instance_name,
                    feature = %feature,
                    amount,
                    used,
                    limit,
                    "reservation rejected, daily limit reached"
                );
                Err(QuotaError::QuotaExceeded {
                    tenant_id: tenant_id.to_string(),
                    instance_name: instance_name.to_string(),
                    feature: feature.as_str().to_string(),
                    limit,
                    used,
                    requested: amount,
                    remaining: limit.saturating_sub(used),
                })
            }
        }
    }

    /// Today's remaining allowance for one counter. Never negative, even
    /// if the stored count somehow exceeds the limit. Does not mutate
    /// state.
    pub fn remaining_quota(
        &self,
        tenant_id: &str,
        instance_name: &str,
        feature: &str,
    ) -> Result<UsageSnapshot, QuotaError> {
        let feature = parse_feature(feature)?;
        let limit = self.policy.limit(feature);
        let day = self.day_key();
        let used = self.database.load_count(&UsageKey {
            tenant_id,
            instance_name,
            feature: feature.as_str(),
            day: &day,
        })?;

        Ok(self.snapshot(tenant_id, instance_name, feature, day, used, limit))
    }

    pub fn usage_for_today(&self, tenant_id: &str) -> Result<Vec<DailyUsageRecord>, QuotaError> {
        Ok(self.database.list_usage(tenant_id, &self.day_key())?)
    }

    /// Zero today's counter for one tuple.
    pub fn reset(
        &self,
        tenant_id: &str,
        instance_name: &str,
        feature: &str,
    ) -> Result<(), QuotaError> {
        let feature = parse_feature(feature)?;
        let day = self.day_key();
        self.database.save_count(
            &UsageKey {
                tenant_id,
                instance_name,
                feature: feature.as_str(),
                day: &day,
            },
            0,
        )?;

        info!(tenant_id, instance_name, feature = %feature, "reset daily usage");
        Ok(())
    }

    fn day_key(&self) -> String {
        self.clock.today().format("%Y-%m-%d").to_string()
    }

    fn snapshot(
        &self,
        tenant_id: &str,
        instance_name: &str,
        feature: Feature,
        day: String,
        used: u64,
        limit: u64,
    ) -> UsageSnapshot {
        UsageSnapshot {
            tenant_id: tenant_id.to_string(),
            instance_name: instance_name.to_string(),
            feature,
            day,
            used,
            limit,
            remaining: limit.saturating_sub(used),
        }
    }
}

fn parse_feature(name: &str) -> Result<Feature, QuotaError> {
    Feature::parse(name).ok_or_else(|| QuotaError::UnknownFeature(name.to_string()))
}
