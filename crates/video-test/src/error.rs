use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid frame configuration: {0}")]
    InvalidConfig(String),
    #[error("lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("driver not found: {0}")]
    DriverNotFound(String),
    #[error("driver already registered: {0}")]
    DuplicateDriver(String),
}
