use crate::domain::errors::DomainError;
use crate::domain::models::SegmentRequest;
use crate::domain::value_objects::SegmentUrl;

/// Nombre remoto del segmento: `{token}-{Mon}-{DD}-{YYYY}-{HHMM}Z.mp3`.
pub fn segment_file_name(request: &SegmentRequest) -> String {
    format!(
        "{}-{}-{}Z.mp3",
        request.archive_token.as_str(),
        request.date_label(),
        request.time_of_day.hhmm()
    )
}

/// Construye la URL completa de un segmento. Sin E/S ni reloj.
/// # Arguments
/// - `archive_base_url`: raiz del archivo (ej. `https://archive.liveatc.net`).
/// - `request`: pedido ya alineado.
/// # Errors
/// - `DomainError::InvalidSegmentUrl` si la raiz no es una URL http(s).
pub fn build_segment_url(
    archive_base_url: &str,
    request: &SegmentRequest,
) -> Result<SegmentUrl, DomainError> {
    SegmentUrl::new(format!(
        "{}/{}/{}",
        archive_base_url.trim().trim_end_matches('/'),
        request.airport_code.as_str(),
        segment_file_name(request)
    ))
}
