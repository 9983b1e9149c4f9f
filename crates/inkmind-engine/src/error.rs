use inkmind_core::errors::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("stream ended without completion")]
    StreamEnded,

    #[error("{0}")]
    Internal(String),
}
