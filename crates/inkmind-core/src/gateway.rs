use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::chat::ChatRequest;
use crate::errors::GatewayError;
use crate::stream::StreamEvent;

/// The one capability this system consumes: send an ordered list of
/// role-tagged messages to a model and get a reply back, either as a single
/// completion or as an incremental delta stream.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    fn name(&self) -> &str;

    /// Blocking call: the full reply text or an error, nothing in between.
    async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError>;

    /// Streamed call: deltas terminated by a `Done` carrying the full text.
    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send>>, GatewayError>;
}
