use crate::domain::value_objects::{AirportCode, ArchiveToken, ZuluTime};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Alinea un instante al limite de 30 minutos anterior (nunca hacia arriba).
pub fn floor30(instant: DateTime<Utc>) -> DateTime<Utc> {
    let zulu = ZuluTime::floor(instant.time());
    instant.date_naive().and_time(zulu.as_naive_time()).and_utc()
}

/// Pedido de un segmento de 30 minutos.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentRequest {
    pub airport_code: AirportCode,
    pub archive_token: ArchiveToken,
    pub date: NaiveDate,
    pub time_of_day: ZuluTime,
}

impl SegmentRequest {
    pub fn new(
        airport_code: AirportCode,
        archive_token: ArchiveToken,
        date: NaiveDate,
        time_of_day: ZuluTime,
    ) -> Self {
        Self {
            airport_code,
            archive_token,
            date,
            time_of_day,
        }
    }

    /// Pedido para el segmento que contiene `instant`.
    pub fn at(airport_code: AirportCode, archive_token: ArchiveToken, instant: DateTime<Utc>) -> Self {
        let alineado = floor30(instant);
        Self::new(
            airport_code,
            archive_token,
            alineado.date_naive(),
            ZuluTime::floor(alineado.time()),
        )
    }

    /// Instante UTC en que empieza el segmento.
    pub fn instant(&self) -> DateTime<Utc> {
        self.date.and_time(self.time_of_day.as_naive_time()).and_utc()
    }

    /// Fecha con el formato del archivo: `Dec-10-2025`.
    pub fn date_label(&self) -> String {
        self.date.format("%b-%d-%Y").to_string()
    }

    /// Mismo intervalo con otro token.
    pub fn with_token(&self, archive_token: ArchiveToken) -> Self {
        Self {
            archive_token,
            ..self.clone()
        }
    }
}

impl fmt::Display for SegmentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_label(), self.time_of_day)
    }
}

/// Clasificacion de un fallo de descarga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    NotFound,
    Transient,
    TlsUntrusted,
    Fatal,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texto = match self {
            FailureReason::NotFound => "not found",
            FailureReason::Transient => "transient failure",
            FailureReason::TlsUntrusted => "untrusted TLS certificate",
            FailureReason::Fatal => "fatal error",
        };
        f.write_str(texto)
    }
}

/// Fallo clasificado de un segmento, tras agotar reintentos.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} after {attempts} attempt(s): {detail}")]
pub struct SegmentFailure {
    pub reason: FailureReason,
    pub http_status: Option<u16>,
    pub detail: String,
    pub attempts: u32,
}

/// Contenido descargado de un segmento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSegment {
    pub bytes: Vec<u8>,
    pub attempts: u32,
    /// Se descargo sin verificar el certificado TLS.
    pub tls_bypassed: bool,
}

/// Resultado de un pedido emitido por el planificador; exactamente uno por pedido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Success {
        request: SegmentRequest,
        segment: FetchedSegment,
    },
    Failure {
        request: SegmentRequest,
        failure: SegmentFailure,
    },
}

impl SegmentOutcome {
    pub fn from_result(request: SegmentRequest, result: Result<FetchedSegment, SegmentFailure>) -> Self {
        match result {
            Ok(segment) => SegmentOutcome::Success { request, segment },
            Err(failure) => SegmentOutcome::Failure { request, failure },
        }
    }

    pub fn request(&self) -> &SegmentRequest {
        match self {
            SegmentOutcome::Success { request, .. } | SegmentOutcome::Failure { request, .. } => {
                request
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SegmentOutcome::Success { .. })
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            SegmentOutcome::Success { segment, .. } => Some(&segment.bytes),
            SegmentOutcome::Failure { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&SegmentFailure> {
        match self {
            SegmentOutcome::Success { .. } => None,
            SegmentOutcome::Failure { failure, .. } => Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pedido(instant: DateTime<Utc>) -> SegmentRequest {
        SegmentRequest::at(
            AirportCode::new("kpdx").unwrap(),
            ArchiveToken::new("KPDX-App").unwrap(),
            instant,
        )
    }

    #[test]
    fn test_floor30_never_rounds_up() {
        let t = Utc.with_ymd_and_hms(2025, 12, 10, 23, 59, 59).unwrap();
        assert_eq!(floor30(t), Utc.with_ymd_and_hms(2025, 12, 10, 23, 30, 0).unwrap());
        assert_eq!(floor30(floor30(t)), floor30(t));
    }

    #[test]
    fn test_request_at_floors_and_labels() {
        let request = pedido(Utc.with_ymd_and_hms(2025, 3, 4, 7, 45, 12).unwrap());
        assert_eq!(request.date_label(), "Mar-04-2025");
        assert_eq!(request.time_of_day.hhmm(), "0730");
        assert_eq!(
            request.instant(),
            Utc.with_ymd_and_hms(2025, 3, 4, 7, 30, 0).unwrap()
        );
        assert_eq!(request.to_string(), "Mar-04-2025 0730Z");
    }

    #[test]
    fn test_outcome_accessors() {
        let request = pedido(Utc.with_ymd_and_hms(2025, 3, 4, 7, 0, 0).unwrap());
        let fallo = SegmentOutcome::from_result(
            request.clone(),
            Err(SegmentFailure {
                reason: FailureReason::NotFound,
                http_status: Some(404),
                detail: "gone".to_string(),
                attempts: 1,
            }),
        );
        assert!(!fallo.is_success());
        assert_eq!(fallo.request(), &request);
        assert_eq!(fallo.failure().unwrap().http_status, Some(404));
        assert!(fallo.bytes().is_none());
    }
}
