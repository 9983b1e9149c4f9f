pub mod mock;
pub mod provider;
pub mod sse;

pub use mock::{MockGateway, MockReply};
pub use provider::GroqProvider;
