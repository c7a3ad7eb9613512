use crate::domain::errors::DomainError;
use crate::domain::models::{
    FailureReason, FetchedSegment, SegmentFailure, SegmentRequest, StationRecord,
};
use crate::domain::repositories::ArchiveRepository;
use crate::domain::services::{build_segment_url, derive_from_station, TokenNormalizer};
use crate::domain::value_objects::{
    AirportCode, SegmentUrl, StationId, TokenConfidence, TokenResolution,
};
use crate::infrastructure::config::{AppConfig, Endpoints};
use crate::infrastructure::external::html_parser::HtmlScanner;
use crate::infrastructure::external::http_transport::{HttpTransport, ReqwestTransport};
use crate::infrastructure::external::segment_fetcher::{FetchFailure, RetryPolicy, SegmentFetcher};
use crate::infrastructure::InfrastructureError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Cliente del buscador y del archivo de audio de LiveATC.
#[derive(Clone)]
pub struct LiveAtcClient {
    paginas: SegmentFetcher,
    segmentos: SegmentFetcher,
    endpoints: Endpoints,
    scanner: HtmlScanner,
    normalizador: TokenNormalizer,
    derivar_si_falta: bool,
}

impl LiveAtcClient {
    /// Crea un cliente a partir de la configuracion.
    ///
    /// Las paginas y los segmentos usan clientes distintos porque tienen
    /// timeouts distintos.
    /// # Errors
    /// - `InfrastructureError::Config` si falla la configuracion HTTP.
    /// - `InfrastructureError::Domain` si una regla de token no es valida.
    pub fn new(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let paginas = ReqwestTransport::new(
            &config.http,
            Duration::from_secs(config.http.page_timeout_secs),
        )?;
        let segmentos =
            ReqwestTransport::new(&config.http, Duration::from_secs(config.http.timeout_secs))?;
        Self::with_transports(config, Arc::new(paginas), Arc::new(segmentos))
    }

    /// Crea un cliente sobre transportes arbitrarios.
    /// # Errors
    /// - Igual que `new`.
    pub fn with_transports(
        config: &AppConfig,
        paginas: Arc<dyn HttpTransport>,
        segmentos: Arc<dyn HttpTransport>,
    ) -> Result<Self, InfrastructureError> {
        let politica = RetryPolicy::from_settings(&config.http);
        Ok(Self {
            paginas: SegmentFetcher::new(paginas, politica),
            segmentos: SegmentFetcher::new(segmentos, politica),
            endpoints: config.endpoints.clone(),
            scanner: HtmlScanner::new()?,
            normalizador: TokenNormalizer::new(&config.tokens.rules)?,
            derivar_si_falta: config.tokens.derive_when_missing,
        })
    }

    /// Cambia la politica de reintentos de ambos descargadores.
    pub fn with_retry_policy(mut self, politica: RetryPolicy) -> Self {
        self.paginas = SegmentFetcher::new(self.paginas.transport(), politica);
        self.segmentos = SegmentFetcher::new(self.segmentos.transport(), politica);
        self
    }

    fn search_url(&self, airport: &AirportCode) -> String {
        format!(
            "{}/search/?icao={}",
            self.endpoints.search_base_url.trim_end_matches('/'),
            airport.to_uppercase()
        )
    }

    fn station_url(&self, station: &StationId) -> String {
        self.endpoints
            .station_page_url
            .replace("{station}", station.as_str())
    }

    async fn obtener_pagina(&self, url: &str) -> Result<String, InfrastructureError> {
        self.paginas
            .fetch_text(url)
            .await
            .map_err(|FetchFailure { error, attempts }| {
                InfrastructureError::Upstream(format!(
                    "Failed to fetch {} after {} attempt(s): {}",
                    url, attempts, error
                ))
            })
    }
}

#[async_trait]
impl ArchiveRepository for LiveAtcClient {
    type Error = InfrastructureError;

    async fn list_stations(
        &self,
        airport: &AirportCode,
    ) -> Result<Vec<StationRecord>, InfrastructureError> {
        let html = self.obtener_pagina(&self.search_url(airport)).await?;
        let pagina = self.scanner.parse_catalog(&html);

        if pagina.stations.is_empty() {
            if pagina.discarded == 0 {
                return Err(InfrastructureError::NotFound(format!(
                    "No stations found for airport {}",
                    airport.to_uppercase()
                )));
            }
            return Err(InfrastructureError::Upstream(format!(
                "Unrecognized catalog page for {}: {} station block(s) without id, description or frequencies",
                airport.to_uppercase(),
                pagina.discarded
            )));
        }

        if pagina.discarded > 0 {
            tracing::warn!(
                airport = airport.as_str(),
                descartadas = pagina.discarded,
                "Some station blocks could not be read"
            );
        }
        tracing::info!(
            airport = airport.as_str(),
            estaciones = pagina.stations.len(),
            "Catalog resolved"
        );
        Ok(pagina.stations)
    }

    async fn resolve_archive_token(
        &self,
        station: &StationId,
    ) -> Result<TokenResolution, InfrastructureError> {
        let airport = station.airport_code()?;
        let html = self.obtener_pagina(&self.station_url(station)).await?;
        let candidatos = self.scanner.parse_token_candidates(&html);

        let resolucion = match self.normalizador.rank(&candidatos, &airport) {
            Some(resolucion) => resolucion,
            None if self.derivar_si_falta => {
                let token = derive_from_station(station).ok_or_else(|| {
                    InfrastructureError::NotFound(format!(
                        "No archive token for station {}",
                        station
                    ))
                })?;
                TokenResolution::new(vec![token], TokenConfidence::Low)?
            }
            None => {
                return Err(InfrastructureError::NotFound(format!(
                    "No archive link found for station {}",
                    station
                )))
            }
        };

        if resolucion.is_low_confidence() {
            tracing::warn!(
                station = station.as_str(),
                token = resolucion.primary().as_str(),
                alternativas = resolucion.alternates().len(),
                "Archive token resolved with low confidence"
            );
        } else {
            tracing::info!(
                station = station.as_str(),
                token = resolucion.primary().as_str(),
                "Archive token resolved"
            );
        }
        Ok(resolucion)
    }

    fn segment_url(&self, request: &SegmentRequest) -> Result<SegmentUrl, DomainError> {
        build_segment_url(&self.endpoints.archive_base_url, request)
    }

    async fn fetch_segment(
        &self,
        request: &SegmentRequest,
    ) -> Result<FetchedSegment, SegmentFailure> {
        let url = self.segment_url(request).map_err(|e| SegmentFailure {
            reason: FailureReason::Fatal,
            http_status: None,
            detail: e.to_string(),
            attempts: 0,
        })?;
        tracing::debug!(archivo = url.file_name(), "Fetching segment");
        self.segmentos
            .fetch(url.as_str())
            .await
            .map_err(SegmentFailure::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ArchiveToken, ZuluTime};
    use crate::infrastructure::external::http_transport::TlsMode;
    use crate::infrastructure::external::segment_fetcher::tests::{
        estado, ok, politica_inmediata, ScriptedTransport,
    };
    use chrono::NaiveDate;

    fn cliente(
        config: &AppConfig,
        paginas: &Arc<ScriptedTransport>,
        segmentos: &Arc<ScriptedTransport>,
    ) -> LiveAtcClient {
        let p: Arc<dyn HttpTransport> = paginas.clone();
        let s: Arc<dyn HttpTransport> = segmentos.clone();
        LiveAtcClient::with_transports(config, p, s)
            .unwrap()
            .with_retry_policy(politica_inmediata())
    }

    fn vacio() -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::new(Vec::new()))
    }

    const CATALOGO: &str = r#"
<table class="body" padding="5"><tr><td><strong>KPDX Tower</strong>
<font>UP</font><a href="/archive.php?m=kpdx_twr">Archive</a></td></tr></table>
<table class="freqTable"><tr><th>Facility</th><th>Frequency</th></tr>
<tr><td>PDX Tower</td><td>118.700</td></tr></table>"#;

    #[tokio::test]
    async fn lista_estaciones_del_aeropuerto() {
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(CATALOGO.as_bytes())]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());

        let estaciones = cliente
            .list_stations(&AirportCode::new("KPDX").unwrap())
            .await
            .unwrap();
        assert_eq!(estaciones.len(), 1);
        assert_eq!(estaciones[0].id.as_str(), "kpdx_twr");
        assert_eq!(
            paginas.llamadas.lock().unwrap()[0].0,
            "https://www.liveatc.net/search/?icao=KPDX"
        );
    }

    #[tokio::test]
    async fn aeropuerto_sin_estaciones_es_not_found() {
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(b"<p>No results</p>")]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());
        let resultado = cliente.list_stations(&AirportCode::new("zzzz").unwrap()).await;
        assert!(matches!(resultado, Err(InfrastructureError::NotFound(_))));
    }

    #[tokio::test]
    async fn catalogo_ilegible_es_upstream() {
        let html = r#"<table class="body" padding="5"><tr><td>??</td></tr></table>"#;
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(html.as_bytes())]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());
        let resultado = cliente.list_stations(&AirportCode::new("kpdx").unwrap()).await;
        assert!(matches!(resultado, Err(InfrastructureError::Upstream(_))));
    }

    #[tokio::test]
    async fn fallo_de_pagina_es_upstream() {
        let paginas = Arc::new(ScriptedTransport::new(vec![estado(403)]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());
        let resultado = cliente.list_stations(&AirportCode::new("kpdx").unwrap()).await;
        assert!(matches!(resultado, Err(InfrastructureError::Upstream(_))));
    }

    #[tokio::test]
    async fn resuelve_token_seleccionado() {
        let html = r#"<option value="KPDX-Gnd">G</option><option selected value="KPDX-Twr">T</option>"#;
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(html.as_bytes())]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());

        let resolucion = cliente
            .resolve_archive_token(&StationId::new("kpdx_twr").unwrap())
            .await
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX-Twr");
        assert_eq!(resolucion.confidence(), TokenConfidence::High);
        assert_eq!(
            paginas.llamadas.lock().unwrap()[0].0,
            "https://www.liveatc.net/archive.php?m=kpdx_twr"
        );
    }

    #[tokio::test]
    async fn pagina_sin_token_es_not_found() {
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(b"<html></html>")]));
        let cliente = cliente(&AppConfig::default(), &paginas, &vacio());
        let resultado = cliente
            .resolve_archive_token(&StationId::new("kxyz1_app").unwrap())
            .await;
        assert!(matches!(resultado, Err(InfrastructureError::NotFound(_))));
    }

    #[tokio::test]
    async fn token_derivado_cuando_se_permite() {
        let mut config = AppConfig::default();
        config.tokens.derive_when_missing = true;
        let paginas = Arc::new(ScriptedTransport::new(vec![ok(b"<html></html>")]));
        let cliente = cliente(&config, &paginas, &vacio());

        let resolucion = cliente
            .resolve_archive_token(&StationId::new("kxyz1_app").unwrap())
            .await
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KXYZ1-App");
        assert!(resolucion.is_low_confidence());
    }

    #[tokio::test]
    async fn descarga_segmento_en_la_url_del_archivo() {
        let segmentos = Arc::new(ScriptedTransport::new(vec![estado(503), ok(b"ID3audio")]));
        let cliente = cliente(&AppConfig::default(), &vacio(), &segmentos);
        let pedido = SegmentRequest::new(
            AirportCode::new("kpdx").unwrap(),
            ArchiveToken::new("KPDX-App-Dep").unwrap(),
            NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
            ZuluTime::new(0, 0).unwrap(),
        );

        let segmento = cliente.fetch_segment(&pedido).await.unwrap();
        assert_eq!(segmento.bytes, b"ID3audio");
        assert_eq!(segmento.attempts, 2);

        let llamadas = segmentos.llamadas.lock().unwrap();
        assert_eq!(
            llamadas[0],
            (
                "https://archive.liveatc.net/kpdx/KPDX-App-Dep-Oct-01-2021-0000Z.mp3".to_string(),
                TlsMode::Verified
            )
        );
    }

    #[tokio::test]
    async fn segmento_ausente_se_clasifica() {
        let segmentos = Arc::new(ScriptedTransport::new(vec![estado(404)]));
        let cliente = cliente(&AppConfig::default(), &vacio(), &segmentos);
        let pedido = SegmentRequest::new(
            AirportCode::new("kpdx").unwrap(),
            ArchiveToken::new("KPDX-App").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 10).unwrap(),
            ZuluTime::new(23, 30).unwrap(),
        );

        let fallo = cliente.fetch_segment(&pedido).await.unwrap_err();
        assert_eq!(fallo.reason, FailureReason::NotFound);
        assert_eq!(fallo.http_status, Some(404));
        assert_eq!(fallo.attempts, 1);
    }
}
