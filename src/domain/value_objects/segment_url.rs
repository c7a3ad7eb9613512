use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL absoluta de un archivo `.mp3` del archivo de audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentUrl(String);

impl SegmentUrl {
    /// # Errors
    /// - `DomainError::InvalidSegmentUrl` si no es `http(s)://host/.../*.mp3`
    ///   o contiene espacios.
    pub fn new(url: impl Into<String>) -> Result<Self, DomainError> {
        let url = url.into();
        let invalida = |motivo: &str| DomainError::InvalidSegmentUrl(format!("{}: {}", motivo, url));

        if url.chars().any(char::is_whitespace) {
            return Err(invalida("URL contains whitespace"));
        }

        let resto = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| invalida("URL must start with http:// or https://"))?;

        let (host, ruta) = resto
            .split_once('/')
            .ok_or_else(|| invalida("URL has no path"))?;
        if host.is_empty() {
            return Err(invalida("URL has no host"));
        }

        let archivo = ruta.rsplit('/').next().unwrap_or(ruta);
        let es_mp3 = archivo
            .len()
            .checked_sub(4)
            .and_then(|i| archivo.get(i..))
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".mp3"));
        if archivo.len() <= 4 || !es_mp3 {
            return Err(invalida("URL must point to an .mp3 file"));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nombre del archivo remoto.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for SegmentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
