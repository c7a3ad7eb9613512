use crate::domain::models::{floor30, SegmentRequest};
use crate::domain::value_objects::{AirportCode, ArchiveToken};
use chrono::{DateTime, Duration, Utc};

/// Duracion fija de cada segmento publicado.
pub const SEGMENT_MINUTES: i64 = 30;

/// Recorre los limites de 30 minutos desde `floor30(start)` hasta `end` (excluido).
///
/// El avance de fecha (fin de dia, mes o anio) queda a cargo de `chrono`.
#[derive(Debug, Clone)]
pub struct SegmentBoundaries {
    current: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SegmentBoundaries {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end <= start {
            return Self {
                current: end,
                end,
            };
        }
        Self {
            current: floor30(start),
            end,
        }
    }
}

impl Iterator for SegmentBoundaries {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }
        let limite = self.current;
        self.current = limite + Duration::minutes(SEGMENT_MINUTES);
        Some(limite)
    }
}

/// Pedidos en orden cronologico que cubren `[start, end)`.
pub fn plan_range(
    airport_code: &AirportCode,
    archive_token: &ArchiveToken,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<SegmentRequest> {
    SegmentBoundaries::new(start, end)
        .map(|limite| SegmentRequest::at(airport_code.clone(), archive_token.clone(), limite))
        .collect()
}
