use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use inkmind_core::chat::{ChatMessage, ChatRequest};
use inkmind_core::events::SessionEvent;
use inkmind_core::gateway::ChatGateway;
use inkmind_core::stream::StreamEvent;

use crate::compactor::{CompactionOutcome, HistoryCompactor};
use crate::config::EngineConfig;
use crate::context::ContextBuilder;
use crate::corrector::OutputCorrector;
use crate::error::EngineError;
use crate::extract::ProfileExtractor;
use crate::prompts;
use crate::session::{Mode, Phase, SessionState};

/// Shown while the narration call is in flight.
const WORKING_PLACEHOLDER: &str = "...";
/// Shown while the correction pass is in flight.
const REVISING_PLACEHOLDER: &str = "revising...";
/// Shown when no credential is configured; the turn is not sent.
const MISSING_KEY_MESSAGE: &str =
    "Please set GROQ_API_KEY or enter your API key in the settings panel.";

/// Owns the per-turn pipeline: context build → gateway call → correction →
/// history update, with incremental UI updates over a broadcast channel.
///
/// One controller serves one session at a time; the caller passes the
/// session state explicitly on every turn and must not interleave turns.
pub struct SessionController {
    gateway: Option<Arc<dyn ChatGateway>>,
    config: EngineConfig,
    extractor: ProfileExtractor,
    compactor: HistoryCompactor,
    corrector: OutputCorrector,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        gateway: Option<Arc<dyn ChatGateway>>,
        config: EngineConfig,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let extractor = ProfileExtractor::new(&config.utility_model);
        let compactor = HistoryCompactor::new(&config.utility_model, config.compaction_period);
        let corrector = OutputCorrector::new(&config.utility_model);
        Self {
            gateway,
            config,
            extractor,
            compactor,
            corrector,
            event_tx,
        }
    }

    fn send_event(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("no event receivers, event dropped");
        }
    }

    fn emit_display(&self, session: &SessionState) {
        self.send_event(SessionEvent::Display {
            session_id: session.id.clone(),
            history: session.display.clone(),
        });
    }

    /// Drive one user turn through the state machine. Only the primary
    /// generation call may fail; auxiliary calls degrade silently.
    #[instrument(skip(self, session, input), fields(session_id = %session.id, phase = ?session.phase))]
    pub async fn handle_turn(
        &self,
        session: &mut SessionState,
        input: &str,
    ) -> Result<(), EngineError> {
        if input.trim().is_empty() {
            return Ok(());
        }

        let Some(gateway) = self.gateway.clone() else {
            session.display.push(ChatMessage::assistant(MISSING_KEY_MESSAGE));
            self.emit_display(session);
            return Ok(());
        };

        match session.phase {
            Phase::AwaitingSetup => self.setup_turn(&gateway, session, input).await,
            Phase::Narrating => self.narration_turn(&gateway, session, input).await,
        }
    }

    /// First turn: establish the opening scene, streamed incrementally.
    async fn setup_turn(
        &self,
        gateway: &Arc<dyn ChatGateway>,
        session: &mut SessionState,
        input: &str,
    ) -> Result<(), EngineError> {
        self.send_event(SessionEvent::TurnStart {
            session_id: session.id.clone(),
            turn: session.turn_count,
        });

        if session.mode == Mode::Guided {
            session.profile = self.extractor.extract(gateway, input).await;
        }
        session.phase = Phase::Narrating;

        session.display.push(ChatMessage::user(input));
        self.emit_display(session);

        let request_text = match session.mode {
            Mode::Guided => prompts::opening_scene_request(&session.profile),
            Mode::Free => prompts::continuation_request(input),
        };
        let request = ChatRequest::new(
            &self.config.narration_model,
            self.config.max_tokens,
            vec![
                ChatMessage::system(ContextBuilder::build_system(
                    &session.profile,
                    &session.summary,
                )),
                ChatMessage::user(request_text),
            ],
        );

        session.display.push(ChatMessage::assistant(""));

        let mut stream = gateway.stream(&request).await?;
        let mut reply = String::new();
        let mut completed = false;

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::TextDelta { delta } => {
                    reply.push_str(&delta);
                    session.set_last_display(reply.clone());
                    self.send_event(SessionEvent::TextDelta {
                        session_id: session.id.clone(),
                        delta,
                    });
                }
                StreamEvent::Done { text, .. } => {
                    reply = text;
                    completed = true;
                    break;
                }
                StreamEvent::Error { error } => return Err(error.into()),
                StreamEvent::Start => {}
            }
        }
        if !completed {
            return Err(EngineError::StreamEnded);
        }

        session.set_last_display(reply.clone());
        self.emit_display(session);

        // The raw history keeps the player's own words, not the request
        // wrapper built around them.
        session.raw_history.push(ChatMessage::user(input));
        session.raw_history.push(ChatMessage::assistant(reply));
        session.turn_count += 1;

        self.send_event(SessionEvent::TurnComplete {
            session_id: session.id.clone(),
            turn: session.turn_count - 1,
        });
        Ok(())
    }

    /// Steady state: compact if due, generate, correct, record.
    async fn narration_turn(
        &self,
        gateway: &Arc<dyn ChatGateway>,
        session: &mut SessionState,
        input: &str,
    ) -> Result<(), EngineError> {
        session.turn_count += 1;
        self.send_event(SessionEvent::TurnStart {
            session_id: session.id.clone(),
            turn: session.turn_count,
        });

        session.display.push(ChatMessage::user(input));
        self.emit_display(session);

        if self
            .compactor
            .should_compact(session.turn_count, session.raw_history.len())
        {
            self.send_event(SessionEvent::CompactionStarted {
                session_id: session.id.clone(),
            });
            let outcome = self
                .compactor
                .run(
                    gateway,
                    session.turn_count,
                    &mut session.raw_history,
                    &mut session.summary,
                )
                .await;
            if let CompactionOutcome::Compacted { dropped } = outcome {
                self.send_event(SessionEvent::CompactionComplete {
                    session_id: session.id.clone(),
                    dropped,
                });
            }
        }

        let messages = ContextBuilder::build_messages(
            &session.profile,
            &session.summary,
            &session.raw_history,
            input,
        );
        let request = ChatRequest::new(&self.config.narration_model, self.config.max_tokens, messages);

        session.display.push(ChatMessage::assistant(WORKING_PLACEHOLDER));
        self.emit_display(session);

        // The one call allowed to fail visibly — no retry, no fallback.
        let raw_reply = gateway.complete(&request).await?;
        let raw_reply = raw_reply.trim().to_string();

        session.set_last_display(REVISING_PLACEHOLDER);
        self.emit_display(session);

        let corrected = self.corrector.correct(gateway, &raw_reply).await;

        session.set_last_display(corrected.clone());
        self.emit_display(session);

        session.raw_history.push(ChatMessage::user(input));
        session.raw_history.push(ChatMessage::assistant(corrected));

        self.send_event(SessionEvent::TurnComplete {
            session_id: session.id.clone(),
            turn: session.turn_count,
        });
        Ok(())
    }
}
