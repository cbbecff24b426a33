use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("spatial understanding is not ready")]
    NotReady,
    #[error("a query is already in flight")]
    Busy,
    #[error("failed to start query worker: {0}")]
    Spawn(#[from] std::io::Error),
}
