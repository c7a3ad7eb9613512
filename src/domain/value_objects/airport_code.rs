use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Codigo de aeropuerto normalizado (minusculas, ej. `kpdx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AirportCode(String);

impl AirportCode {
    /// Crea un codigo de aeropuerto valido y normalizado.
    /// # Arguments
    /// - `code`: codigo crudo (ICAO o similar).
    /// # Errors
    /// - `DomainError::InvalidAirportCode` si el formato es invalido.
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into().trim().to_lowercase();

        if code.is_empty() {
            return Err(DomainError::InvalidAirportCode(
                "Airport code cannot be empty".to_string(),
            ));
        }

        if code.len() < 2 || code.len() > 8 {
            return Err(DomainError::InvalidAirportCode(format!(
                "Airport code must have 2 to 8 characters: {}",
                code
            )));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidAirportCode(format!(
                "Airport code contains invalid characters: {}",
                code
            )));
        }

        Ok(Self(code))
    }

    /// Devuelve el codigo en minusculas, tal como aparece en las rutas del archivo.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Devuelve el codigo en mayusculas, como lo espera el buscador.
    pub fn to_uppercase(&self) -> String {
        self.0.to_uppercase()
    }
}

impl TryFrom<&str> for AirportCode {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for AirportCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
