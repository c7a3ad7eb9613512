use crate::domain::models::SegmentOutcome;
use crate::domain::value_objects::{ArchiveToken, StationId};

/// Resultados de una descarga por rango, en orden cronologico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResult {
    station: StationId,
    token: Option<ArchiveToken>,
    outcomes: Vec<SegmentOutcome>,
}

impl RangeResult {
    /// Rango vacio: no se emitio ningun pedido.
    pub fn empty(station: StationId) -> Self {
        Self {
            station,
            token: None,
            outcomes: Vec::new(),
        }
    }

    pub fn new(station: StationId, token: ArchiveToken, outcomes: Vec<SegmentOutcome>) -> Self {
        Self {
            station,
            token: Some(token),
            outcomes,
        }
    }

    pub fn station(&self) -> &StationId {
        &self.station
    }

    /// Token usado para construir las URLs; `None` si el rango estaba vacio.
    pub fn token(&self) -> Option<&ArchiveToken> {
        self.token.as_ref()
    }

    pub fn outcomes(&self) -> &[SegmentOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<SegmentOutcome> {
        self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SegmentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
