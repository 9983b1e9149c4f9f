pub mod chat;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod security;
pub mod stream;

pub use chat::{ChatMessage, ChatRequest, ChatRole};
pub use errors::GatewayError;
pub use events::SessionEvent;
pub use gateway::ChatGateway;
pub use ids::SessionId;
pub use security::ApiKey;
pub use stream::{FinishReason, StreamEvent};
