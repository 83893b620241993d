use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("endpoint list is empty")]
    NoEndpoints,
    #[error("rpc call failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ChainError>,
    },
    #[error("transaction confirmation timed out after {timeout_ms}ms")]
    TxTimeout { timeout_ms: u64 },
    #[error("provider error: {0}")]
    Provider(String),
    #[error("signer error: {0}")]
    Signer(String),
    #[error("nonce drift too large: local={local}, server={server}")]
    NonceDrift { local: u64, server: u64 },
}

pub type Result<T> = std::result::Result<T, ChainError>;
