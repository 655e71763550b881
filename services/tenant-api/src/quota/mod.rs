pub mod client;

pub use client::{QuotaClient, QuotaClientError, ReservedUsage};

pub const MESSAGE_SEND_FEATURE: &str = "message_send";
pub const AI_CALL_FEATURE: &str = "ai_call";
