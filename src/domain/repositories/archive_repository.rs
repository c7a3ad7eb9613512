use crate::domain::errors::DomainError;
use crate::domain::models::{FetchedSegment, SegmentFailure, SegmentRequest, StationRecord};
use crate::domain::value_objects::{AirportCode, SegmentUrl, StationId, TokenResolution};
use async_trait::async_trait;

/// Contrato para consultar el catalogo y descargar segmentos del archivo.
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lista las estaciones de un aeropuerto.
    /// # Errors
    /// - `Self::Error` si no hay estaciones o la pagina no se puede leer.
    async fn list_stations(&self, airport: &AirportCode)
        -> Result<Vec<StationRecord>, Self::Error>;

    /// Resuelve el token de archivo de una estacion.
    /// # Returns
    /// - Candidatos ordenados y su nivel de confianza.
    /// # Errors
    /// - `Self::Error` si la pagina no tiene ningun token reconocible o falla la consulta.
    async fn resolve_archive_token(
        &self,
        station: &StationId,
    ) -> Result<TokenResolution, Self::Error>;

    /// URL del segmento para un pedido. Sin E/S.
    fn segment_url(&self, request: &SegmentRequest) -> Result<SegmentUrl, DomainError>;

    /// Descarga un segmento con reintentos.
    /// # Errors
    /// - `SegmentFailure` clasificado cuando no se pudo obtener el contenido.
    async fn fetch_segment(&self, request: &SegmentRequest)
        -> Result<FetchedSegment, SegmentFailure>;
}
