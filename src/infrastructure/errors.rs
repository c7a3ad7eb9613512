use crate::domain::errors::DomainError;
use crate::domain::models::{FailureReason, SegmentFailure};
use thiserror::Error;

/// Errores de infraestructura.
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Segment download failed: {0}")]
    Segment(#[from] SegmentFailure),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fallo de una descarga HTTP, ya clasificado.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP 404 for {url}")]
    NotFound { url: String },

    #[error("{message}")]
    Transient {
        message: String,
        status: Option<u16>,
    },

    #[error("certificate verification failed: {0}")]
    TlsUntrusted(String),

    #[error("{message}")]
    Fatal {
        message: String,
        status: Option<u16>,
    },
}

impl FetchError {
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::NotFound { .. } => FailureReason::NotFound,
            FetchError::Transient { .. } => FailureReason::Transient,
            FetchError::TlsUntrusted(_) => FailureReason::TlsUntrusted,
            FetchError::Fatal { .. } => FailureReason::Fatal,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { .. } => Some(404),
            FetchError::Transient { status, .. } | FetchError::Fatal { status, .. } => *status,
            FetchError::TlsUntrusted(_) => None,
        }
    }

    /// Convierte el error en el fallo de dominio, con el numero de intentos.
    pub fn into_segment_failure(self, attempts: u32) -> SegmentFailure {
        SegmentFailure {
            reason: self.reason(),
            http_status: self.http_status(),
            detail: self.to_string(),
            attempts,
        }
    }
}
