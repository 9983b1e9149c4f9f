use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::Stream;

use inkmind_core::chat::ChatRequest;
use inkmind_core::errors::GatewayError;
use inkmind_core::gateway::ChatGateway;
use inkmind_core::stream::{FinishReason, StreamEvent};

/// Pre-programmed replies for deterministic testing without API calls.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Return this text (as a completion, or as a one-delta stream).
    Text(String),
    /// Yield this exact sequence of StreamEvents.
    Stream(Vec<StreamEvent>),
    /// Return an error from the call itself.
    Error(GatewayError),
    /// Wait a duration, then resolve the inner reply.
    Delay(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// A well-formed delta stream for `text`, split at whitespace.
    pub fn stream_text(text: &str) -> Self {
        let mut events = vec![StreamEvent::Start];
        let mut rest = text;
        while !rest.is_empty() {
            let split = rest
                .char_indices()
                .find(|(i, c)| *i > 0 && c.is_whitespace())
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let (head, tail) = rest.split_at(split);
            events.push(StreamEvent::TextDelta {
                delta: head.to_string(),
            });
            rest = tail;
        }
        events.push(StreamEvent::Done {
            text: text.to_string(),
            finish_reason: Some(FinishReason::Stop),
        });
        Self::Stream(events)
    }

    pub fn delayed(delay: Duration, inner: MockReply) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock gateway that returns pre-programmed replies in sequence and records
/// every request it receives, so tests can assert on outbound message lists.
pub struct MockGateway {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockGateway {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_reply(&self, request: &ChatRequest) -> Result<MockReply, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies.lock().unwrap().pop_front().ok_or_else(|| {
            GatewayError::InvalidRequest("MockGateway: no reply configured for this call".into())
        })
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let mut reply = self.next_reply(request)?;
        loop {
            match reply {
                MockReply::Text(text) => return Ok(text),
                MockReply::Stream(events) => {
                    // A scripted stream resolves to its terminal event.
                    for event in events {
                        match event {
                            StreamEvent::Done { text, .. } => return Ok(text),
                            StreamEvent::Error { error } => return Err(error),
                            _ => {}
                        }
                    }
                    return Err(GatewayError::StreamInterrupted(
                        "mock stream ended without Done".into(),
                    ));
                }
                MockReply::Error(e) => return Err(e),
                MockReply::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    reply = *inner;
                }
            }
        }
    }

    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send>>, GatewayError> {
        let mut reply = self.next_reply(request)?;
        loop {
            match reply {
                MockReply::Text(text) => {
                    let events = vec![
                        StreamEvent::Start,
                        StreamEvent::TextDelta { delta: text.clone() },
                        StreamEvent::Done {
                            text,
                            finish_reason: Some(FinishReason::Stop),
                        },
                    ];
                    return Ok(Box::pin(stream::iter(events)));
                }
                MockReply::Stream(events) => return Ok(Box::pin(stream::iter(events))),
                MockReply::Error(e) => return Err(e),
                MockReply::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    reply = *inner;
                }
            }
        }
    }
}
