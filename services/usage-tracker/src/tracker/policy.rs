use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UsageTrackerConfig;

/// Metered capabilities. Each variant maps to one entry in the daily
/// limit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MessageSend,
    AiCall,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::MessageSend, Feature::AiCall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::MessageSend => "message_send",
            Feature::AiCall => "ai_call",
        }
    }

    pub fn parse(value: &str) -> Option<Feature> {
        match value {
            "message_send" => Some(Feature::MessageSend),
            "ai_call" => Some(Feature::AiCall),
            _ => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("no daily limit configured for feature {0}")]
    MissingLimit(Feature),
    #[error("daily limit for feature {0} must be greater than zero")]
    ZeroLimit(Feature),
}

/// Daily limits per feature, validated at construction so a
/// misconfigured table fails at startup instead of per request.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    limits: HashMap<Feature, u64>,
}

impl QuotaPolicy {
    pub fn new(limits: HashMap<Feature, u64>) -> Result<Self, PolicyError> {
        for feature in Feature::ALL {
            match limits.get(&feature) {
                None => return Err(PolicyError::MissingLimit(feature)),
                Some(0) => return Err(PolicyError::ZeroLimit(feature)),
                Some(_) => {}
            }
        }
        Ok(Self { limits })
    }

    pub fn from_config(config: &UsageTrackerConfig) -> Result<Self, PolicyError> {
        let mut limits = HashMap::new();
        limits.insert(Feature::MessageSend, config.message_send_daily_limit);
        limits.insert(Feature::AiCall, config.ai_call_daily_limit);
        Self::new(limits)
    }

    pub fn limit(&self, feature: Feature) -> u64 {
        self.limits
            .get(&feature)
            .copied()
            .expect("policy table validated at construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_feature_fails_validation() {
        let mut limits = HashMap::new();
        limits.insert(Feature::MessageSend, 40);

        let result = QuotaPolicy::new(limits);
        assert!(matches!(
            result,
            Err(PolicyError::MissingLimit(Feature::AiCall))
        ));
    }

    #[test]
    fn zero_limit_fails_validation() {
        let mut limits = HashMap::new();
        limits.insert(Feature::MessageSend, 0);
        limits.insert(Feature::AiCall, 100);

        let result = QuotaPolicy::new(limits);
        assert!(matches!(
            result,
            Err(PolicyError::ZeroLimit(Feature::MessageSend))
        ));
    }

    #[test]
    fn feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::parse(feature.as_str()), Some(feature));
        }
        assert_eq!(Feature::parse("whatsapp_messages"), None);
    }
}
