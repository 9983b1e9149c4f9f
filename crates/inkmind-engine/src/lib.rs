pub mod compactor;
pub mod config;
pub mod context;
pub mod controller;
pub mod corrector;
pub mod error;
pub mod extract;
pub mod profile;
pub mod prompts;
pub mod session;

pub use compactor::HistoryCompactor;
pub use config::EngineConfig;
pub use context::ContextBuilder;
pub use controller::SessionController;
pub use corrector::OutputCorrector;
pub use error::EngineError;
pub use extract::ProfileExtractor;
pub use profile::StoryProfile;
pub use session::{Mode, Phase, SessionState};
