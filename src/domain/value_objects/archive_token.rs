use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nombre de archivo propio de cada estacion (ej. `KPDX-App-Dep`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveToken(String);

impl ArchiveToken {
    /// Crea un token de archivo valido.
    /// # Errors
    /// - `DomainError::InvalidArchiveToken` si esta vacio o tiene caracteres
    ///   que no pueden aparecer en un nombre de segmento.
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into().trim().to_string();

        if token.is_empty() {
            return Err(DomainError::InvalidArchiveToken(
                "Archive token cannot be empty".to_string(),
            ));
        }

        if token.len() > 100 {
            return Err(DomainError::InvalidArchiveToken(
                "Archive token too long".to_string(),
            ));
        }

        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DomainError::InvalidArchiveToken(format!(
                "Archive token contains invalid characters: {}",
                token
            )));
        }

        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ArchiveToken {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ArchiveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confianza en el token elegido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenConfidence {
    High,
    Low,
}

/// Resultado de resolver el token de una estacion: candidatos ordenados
/// por preferencia, el primero es el elegido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResolution {
    candidates: Vec<ArchiveToken>,
    confidence: TokenConfidence,
}

impl TokenResolution {
    /// # Errors
    /// - `DomainError::InvalidArchiveToken` si no hay ningun candidato.
    pub fn new(
        candidates: Vec<ArchiveToken>,
        confidence: TokenConfidence,
    ) -> Result<Self, DomainError> {
        if candidates.is_empty() {
            return Err(DomainError::InvalidArchiveToken(
                "Token resolution needs at least one candidate".to_string(),
            ));
        }
        Ok(Self {
            candidates,
            confidence,
        })
    }

    /// Resolucion con un unico token conocido.
    pub fn single(token: ArchiveToken) -> Self {
        Self {
            candidates: vec![token],
            confidence: TokenConfidence::High,
        }
    }

    pub fn primary(&self) -> &ArchiveToken {
        &self.candidates[0]
    }

    pub fn alternates(&self) -> &[ArchiveToken] {
        &self.candidates[1..]
    }

    pub fn candidates(&self) -> &[ArchiveToken] {
        &self.candidates
    }

    pub fn confidence(&self) -> TokenConfidence {
        self.confidence
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == TokenConfidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_token_valid() {
        assert_eq!(
            ArchiveToken::new(" KPDX-App-Dep ").unwrap().as_str(),
            "KPDX-App-Dep"
        );
    }

    #[test]
    fn test_archive_token_invalid_characters_fails() {
        for token in ["", "KPDX App", "KPDX/App", "KPDX.mp3"] {
            assert!(ArchiveToken::new(token).is_err(), "Expected {:?} to fail", token);
        }
    }

    #[test]
    fn test_resolution_requires_candidates() {
        assert!(TokenResolution::new(Vec::new(), TokenConfidence::High).is_err());
    }

    #[test]
    fn test_resolution_primary_and_alternates() {
        let resolucion = TokenResolution::new(
            vec![
                ArchiveToken::new("KPDX-App").unwrap(),
                ArchiveToken::new("KPDX2-App").unwrap(),
            ],
            TokenConfidence::Low,
        )
        .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX-App");
        assert_eq!(resolucion.alternates().len(), 1);
        assert!(resolucion.is_low_confidence());
    }
}
