use std::io::Write as _;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use inkmind_core::events::SessionEvent;
use inkmind_core::gateway::ChatGateway;
use inkmind_core::security::ApiKey;
use inkmind_engine::{EngineConfig, Mode, Phase, SessionController, SessionState};
use inkmind_llm::GroqProvider;

#[derive(Parser)]
#[command(name = "inkmind", about = "Interactive narrative roleplay session")]
struct Args {
    /// How the opening scene is established.
    #[arg(long, value_enum, default_value = "guided")]
    mode: ModeArg,

    /// API key, used when GROQ_API_KEY is not set.
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Guided,
    Free,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Guided => Mode::Guided,
            ModeArg::Free => Mode::Free,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env();

    let gateway: Option<Arc<dyn ChatGateway>> = ApiKey::from_env(args.api_key.as_deref())
        .map(|key| Arc::new(GroqProvider::new(key)) as Arc<dyn ChatGateway>);
    if gateway.is_none() {
        tracing::warn!("no API credential found, turns will not be sent");
    }

    let (event_tx, _) = broadcast::channel::<SessionEvent>(256);
    spawn_delta_printer(event_tx.subscribe());

    let controller = SessionController::new(gateway, config, event_tx);
    let mut session = SessionState::new(args.mode.into());

    println!("{}\n", session.display[0].content);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        let was_setup = session.phase == Phase::AwaitingSetup;
        match controller.handle_turn(&mut session, &line).await {
            Ok(()) => {
                if was_setup && session.phase == Phase::Narrating {
                    // The opening scene already streamed through the printer.
                    println!("\n");
                } else if let Some(reply) = session.display.last() {
                    println!("{}\n", reply.content);
                }
            }
            Err(e) => {
                eprintln!("turn failed: {e}");
            }
        }
    }

    tracing::info!("session ended");
    Ok(())
}

/// Prints streamed opening-scene deltas as they arrive.
fn spawn_delta_printer(mut rx: broadcast::Receiver<SessionEvent>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::TextDelta { delta, .. }) => {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
