use thiserror::Error;

/// Errores del dominio.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid airport code: {0}")]
    InvalidAirportCode(String),

    #[error("Invalid station id: {0}")]
    InvalidStationId(String),

    #[error("Invalid archive token: {0}")]
    InvalidArchiveToken(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid segment URL: {0}")]
    InvalidSegmentUrl(String),

    #[error("Invalid token rule: {0}")]
    InvalidTokenRule(String),
}
