use thiserror::Error;

#[derive(Error, Debug)]
pub enum BidwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] nara_client::NaraError),

    #[error("Destination store error: {0}")]
    Sink(String),
}
