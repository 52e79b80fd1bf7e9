use async_trait::async_trait;

pub mod dispatch;
pub mod line;
pub mod line_receive;
pub mod line_send;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{DispatchSummary, Dispatcher, FailureMessages, HandlerSettings, failure_message};
pub use line::{LineAdapter, LineConfig, SIGNATURE_HEADER};
pub use line_receive::{EventSource, InboundEvent, parse_events, sign_body, verify_signature};
pub use line_send::{LineApi, LineClient};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build an optional Axum sub-router for inbound webhook endpoints.
    /// Adapters that use polling/long-connections return an empty router.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Start the adapter's background work, if any.
    async fn start(&self) -> anyhow::Result<()>;
}
