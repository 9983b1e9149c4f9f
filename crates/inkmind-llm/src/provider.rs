use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Future, Stream};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use inkmind_core::chat::{ChatMessage, ChatRequest};
use inkmind_core::errors::GatewayError;
use inkmind_core::gateway::ChatGateway;
use inkmind_core::security::ApiKey;
use inkmind_core::stream::StreamEvent;

use crate::sse::{self, SseParser};

const API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const SSE_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Gateway to Groq's OpenAI-compatible chat-completions endpoint.
pub struct GroqProvider {
    client: Client,
    api_key: ApiKey,
}

impl GroqProvider {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key,
        }
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> reqwest::RequestBuilder {
        let body = WireRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream,
        };

        self.client
            .post(API_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.0.expose_secret()),
            )
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .json(&body)
    }
}

#[async_trait]
impl ChatGateway for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let resp = self
            .build_request(request, false)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(REQUEST_TIMEOUT)
                } else {
                    GatewayError::NetworkError(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        let completion: WireCompletion = resp
            .json()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidRequest("response contained no choices".into()))
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send>>, GatewayError> {
        let resp = self
            .build_request(request, true)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        let byte_stream = resp.bytes_stream();
        Ok(Box::pin(SseStream::new(byte_stream)))
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct WireCompletion {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
}

/// Wraps a byte stream from reqwest and yields StreamEvents.
/// Includes an idle timeout — if no data arrives within `idle_duration`, emits an error.
struct SseStream {
    inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    parser: SseParser,
    buffer: String,
    pending: Vec<StreamEvent>,
    idle_deadline: Pin<Box<tokio::time::Sleep>>,
    idle_duration: Duration,
}

impl SseStream {
    fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self::with_idle_timeout(byte_stream, SSE_IDLE_TIMEOUT)
    }

    fn with_idle_timeout(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: SseParser::new(),
            buffer: String::new(),
            pending: Vec::new(),
            idle_deadline: Box::pin(tokio::time::sleep(idle_timeout)),
            idle_duration: idle_timeout,
        }
    }

    fn drain_chunk(&mut self, chunk: &str) {
        for payload in sse::parse_sse_lines(chunk) {
            let events = self.parser.parse_data(&payload);
            self.pending.extend(events);
        }
    }
}

impl Stream for SseStream {
    type Item = StreamEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        // Return pending events first
        if !self.pending.is_empty() {
            return std::task::Poll::Ready(Some(self.pending.remove(0)));
        }

        loop {
            match self.inner.as_mut().poll_next(cx) {
                std::task::Poll::Ready(Some(Ok(bytes))) => {
                    // Data received — reset idle timer
                    let new_deadline = tokio::time::Instant::now() + self.idle_duration;
                    self.idle_deadline.as_mut().reset(new_deadline);

                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    self.buffer.push_str(&text);

                    // Process complete SSE events from the buffer
                    while let Some(pos) = self.buffer.find("\n\n") {
                        let chunk = self.buffer[..pos + 2].to_string();
                        self.buffer = self.buffer[pos + 2..].to_string();
                        self.drain_chunk(&chunk);
                    }

                    if !self.pending.is_empty() {
                        return std::task::Poll::Ready(Some(self.pending.remove(0)));
                    }
                }
                std::task::Poll::Ready(Some(Err(e))) => {
                    return std::task::Poll::Ready(Some(StreamEvent::Error {
                        error: GatewayError::StreamInterrupted(e.to_string()),
                    }));
                }
                std::task::Poll::Ready(None) => {
                    // Stream ended — process remaining buffer
                    if !self.buffer.is_empty() {
                        let remaining = std::mem::take(&mut self.buffer);
                        self.drain_chunk(&remaining);
                        if !self.pending.is_empty() {
                            return std::task::Poll::Ready(Some(self.pending.remove(0)));
                        }
                    }
                    return std::task::Poll::Ready(None);
                }
                std::task::Poll::Pending => {
                    // No data available — check idle timeout
                    if self.idle_deadline.as_mut().poll(cx).is_ready() {
                        return std::task::Poll::Ready(Some(StreamEvent::Error {
                            error: GatewayError::StreamInterrupted(format!(
                                "idle timeout after {}s",
                                self.idle_duration.as_secs()
                            )),
                        }));
                    }
                    return std::task::Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use secrecy::SecretString;

    fn test_key() -> ApiKey {
        ApiKey(SecretString::from("gsk_test"))
    }

    #[test]
    fn provider_name() {
        let provider = GroqProvider::new(test_key());
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn wire_request_shape() {
        let body = WireRequest {
            model: "test-model",
            messages: &[ChatMessage::system("rules"), ChatMessage::user("hi")],
            max_tokens: 900,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["max_tokens"], 900);
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn wire_completion_parse() {
        let raw = r#"{"id":"cmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Once upon a time."},"finish_reason":"stop"}]}"#;
        let completion: WireCompletion = serde_json::from_str(raw).unwrap();
        assert_eq!(completion.choices[0].message.content, "Once upon a time.");
    }

    #[tokio::test]
    async fn sse_stream_parses_chunked_data() {
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n",
            )),
            Ok(bytes::Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":\"stop\"}]}\n\ndata: [DONE]\n\n",
            )),
        ];
        let mut stream = Box::pin(SseStream::new(futures::stream::iter(chunks)));

        let mut deltas = String::new();
        let mut done_text = None;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::TextDelta { delta } => deltas.push_str(&delta),
                StreamEvent::Done { text, .. } => done_text = Some(text),
                StreamEvent::Error { error } => panic!("unexpected error: {error}"),
                StreamEvent::Start => {}
            }
        }
        assert_eq!(deltas, "Hello");
        assert_eq!(done_text.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn sse_stream_splits_events_across_chunks() {
        // One SSE event arriving in two byte chunks
        let chunks: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"cont",
            )),
            Ok(bytes::Bytes::from(
                "ent\":\"hi\"},\"finish_reason\":null}]}\n\ndata: [DONE]\n\n",
            )),
        ];
        let mut stream = Box::pin(SseStream::new(futures::stream::iter(chunks)));

        let mut saw_delta = false;
        while let Some(event) = stream.next().await {
            if let StreamEvent::TextDelta { delta } = &event {
                assert_eq!(delta, "hi");
                saw_delta = true;
            }
        }
        assert!(saw_delta);
    }

    #[tokio::test]
    async fn sse_stream_idle_timeout_fires_when_no_data() {
        tokio::time::pause();

        let byte_stream = futures::stream::pending::<Result<bytes::Bytes, reqwest::Error>>();
        let mut stream = Box::pin(SseStream::with_idle_timeout(
            byte_stream,
            Duration::from_secs(5),
        ));

        tokio::time::advance(Duration::from_secs(6)).await;

        let event = stream.next().await;
        assert!(
            matches!(&event, Some(StreamEvent::Error { error: GatewayError::StreamInterrupted(msg) }) if msg.contains("idle timeout")),
            "expected idle timeout error, got: {event:?}"
        );
    }

    #[tokio::test]
    async fn sse_stream_idle_timeout_resets_on_data() {
        tokio::time::pause();

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<bytes::Bytes, reqwest::Error>>(16);
        let rx_stream = tokio_stream::wrappers::ReceiverStream::new(rx);
        let mut stream = Box::pin(SseStream::with_idle_timeout(
            rx_stream,
            Duration::from_secs(5),
        ));

        tx.send(Ok(bytes::Bytes::from(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"},\"finish_reason\":null}]}\n\n",
        )))
        .await
        .unwrap();
        let _event = stream.next().await;

        tokio::time::advance(Duration::from_secs(4)).await;

        tx.send(Ok(bytes::Bytes::from(
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"},\"finish_reason\":null}]}\n\n",
        )))
        .await
        .unwrap();
        let _event = stream.next().await;

        // Drop sender to end the stream cleanly
        drop(tx);
        // Remaining buffered events drain, then the stream ends without an
        // idle-timeout error.
        let mut last = None;
        while let Some(event) = stream.next().await {
            last = Some(event);
        }
        assert!(
            !matches!(last, Some(StreamEvent::Error { .. })),
            "expected clean end, got: {last:?}"
        );
    }

    #[test]
    fn timeout_constants() {
        assert_eq!(CONNECT_TIMEOUT, Duration::from_secs(30));
        assert_eq!(SSE_IDLE_TIMEOUT, Duration::from_secs(90));
    }
}
