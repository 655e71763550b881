use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::*;
pub use router::create_router;
pub use types::*;

use crate::config::UsageTrackerConfig;
use crate::tracker::UsageTracker;

pub struct ApiState {
    pub tracker: Arc<UsageTracker>,
    pub config: Arc<UsageTrackerConfig>,
}

impl ApiState {
    pub fn new(tracker: Arc<UsageTracker>, config: UsageTrackerConfig) -> Self {
        Self {
            tracker,
            config: Arc::new(config),
        }
    }
}
