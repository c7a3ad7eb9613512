use crate::domain::value_objects::StationId;
use serde::{Deserialize, Serialize};

/// Frecuencia publicada por una estacion (rol, valor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub label: String,
    pub frequency: String,
}

impl Frequency {
    pub fn new(label: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            frequency: frequency.into(),
        }
    }
}

/// Estacion encontrada en el catalogo de un aeropuerto.
///
/// `is_live` es solo orientativo: una estacion caida puede tener archivos historicos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: StationId,
    pub description: String,
    pub frequencies: Vec<Frequency>,
    pub is_live: bool,
}
