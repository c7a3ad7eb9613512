use crate::domain::errors::DomainError;
use crate::domain::value_objects::AirportCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identificador opaco de estacion (ej. `kpdx_zse`), usado tal cual en las consultas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(String);

impl StationId {
    /// Crea un identificador de estacion valido.
    /// # Errors
    /// - `DomainError::InvalidStationId` si esta vacio o tiene caracteres invalidos.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into().trim().to_string();

        if id.is_empty() {
            return Err(DomainError::InvalidStationId(
                "Station id cannot be empty".to_string(),
            ));
        }

        if id.len() > 100 {
            return Err(DomainError::InvalidStationId(
                "Station id too long".to_string(),
            ));
        }

        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DomainError::InvalidStationId(format!(
                "Station id contains invalid characters: {}",
                id
            )));
        }

        Ok(Self(id))
    }

    /// Devuelve el identificador como `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deriva el codigo de aeropuerto del prefijo del identificador.
    ///
    /// `kcho3_zdc_121675` -> `kcho`: se toma la parte previa al primer `_`
    /// y se descartan los digitos finales.
    /// # Errors
    /// - `DomainError::InvalidAirportCode` si el prefijo no produce un codigo valido.
    pub fn airport_code(&self) -> Result<AirportCode, DomainError> {
        let prefijo = self.0.split('_').next().unwrap_or_default();
        let sin_digitos = prefijo.trim_end_matches(|c: char| c.is_ascii_digit());
        AirportCode::new(sin_digitos)
    }
}

impl TryFrom<&str> for StationId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for StationId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
