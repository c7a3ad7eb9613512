use crate::domain::models::{FetchedSegment, SegmentFailure};
use crate::infrastructure::config::HttpSettings;
use crate::infrastructure::errors::FetchError;
use crate::infrastructure::external::http_transport::{
    HttpResponse, HttpTransport, TlsMode, TransportError,
};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Politica de reintentos para fallos transitorios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub tls_fallback: bool,
}

impl RetryPolicy {
    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.backoff_base_ms),
            max_delay: Duration::from_millis(settings.backoff_max_ms),
            tls_fallback: settings.tls_fallback,
        }
    }

    /// Espera antes del reintento que sigue al intento `intento` (desde 1).
    pub fn delay_for(&self, intento: u32) -> Duration {
        let factor = 2u32.saturating_pow(intento.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&HttpSettings::default())
    }
}

/// Fallo final de una descarga y cuantas peticiones se emitieron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub error: FetchError,
    pub attempts: u32,
}

impl From<FetchFailure> for SegmentFailure {
    fn from(fallo: FetchFailure) -> Self {
        fallo.error.into_segment_failure(fallo.attempts)
    }
}

/// Descargador con reintentos y respaldo TLS por peticion.
#[derive(Clone)]
pub struct SegmentFetcher {
    transport: Arc<dyn HttpTransport>,
    politica: RetryPolicy,
}

impl SegmentFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, politica: RetryPolicy) -> Self {
        Self { transport, politica }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.politica
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Descarga `url`.
    ///
    /// - 404 es terminal al primer intento.
    /// - Timeouts, conexiones cortadas, 408, 429 y 5xx se reintentan hasta `max_attempts`.
    /// - Un fallo de certificado permite un unico intento sin verificacion,
    ///   que no consume el presupuesto de reintentos.
    /// # Errors
    /// - `FetchFailure` con el error clasificado y el total de peticiones.
    pub async fn fetch(&self, url: &str) -> Result<FetchedSegment, FetchFailure> {
        let mut intentos = 0u32;
        let mut transitorios = 0u32;
        let mut modo = TlsMode::Verified;

        loop {
            intentos += 1;
            tracing::debug!(url, intento = intentos, ?modo, "GET");

            let error = match self.transport.get(url, modo).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    return Ok(FetchedSegment {
                        bytes: response.body,
                        attempts: intentos,
                        tls_bypassed: modo == TlsMode::Unverified,
                    });
                }
                Ok(response) => clasificar_estado(url, &response),
                Err(err) => clasificar_transporte(err),
            };

            match error {
                FetchError::TlsUntrusted(ref detalle)
                    if modo == TlsMode::Verified && self.politica.tls_fallback =>
                {
                    tracing::warn!(
                        url,
                        detalle = detalle.as_str(),
                        "TLS certificate verification failed; retrying once WITHOUT certificate verification"
                    );
                    modo = TlsMode::Unverified;
                }
                FetchError::Transient { .. } => {
                    transitorios += 1;
                    if transitorios >= self.politica.max_attempts {
                        return Err(FetchFailure {
                            error,
                            attempts: intentos,
                        });
                    }
                    let espera = self.politica.delay_for(transitorios);
                    tracing::warn!(
                        url,
                        intento = transitorios,
                        espera_ms = espera.as_millis() as u64,
                        "{}, retrying",
                        error
                    );
                    sleep(espera).await;
                }
                error => {
                    return Err(FetchFailure {
                        error,
                        attempts: intentos,
                    })
                }
            }
        }
    }

    /// Descarga una pagina y la decodifica como texto.
    /// # Errors
    /// - `FetchFailure` igual que `fetch`.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchFailure> {
        let segmento = self.fetch(url).await?;
        Ok(String::from_utf8_lossy(&segmento.bytes).into_owned())
    }
}

fn clasificar_estado(url: &str, response: &HttpResponse) -> FetchError {
    let status = response.status;
    match status {
        404 => FetchError::NotFound {
            url: url.to_string(),
        },
        408 | 429 | 500..=599 => FetchError::Transient {
            message: format!("HTTP {} for {}", status, url),
            status: Some(status),
        },
        _ => FetchError::Fatal {
            message: format!("HTTP {} for {}", status, url),
            status: Some(status),
        },
    }
}

fn clasificar_transporte(err: TransportError) -> FetchError {
    match err {
        TransportError::Timeout(_) | TransportError::Connection(_) => FetchError::Transient {
            message: err.to_string(),
            status: None,
        },
        TransportError::Tls(detalle) => FetchError::TlsUntrusted(detalle),
        TransportError::Other(_) => FetchError::Fatal {
            message: err.to_string(),
            status: None,
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::models::FailureReason;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transporte con respuestas guionadas; registra cada peticion.
    pub(crate) struct ScriptedTransport {
        respuestas: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        pub(crate) llamadas: Mutex<Vec<(String, TlsMode)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(respuestas: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                respuestas: Mutex::new(respuestas.into()),
                llamadas: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn modos(&self) -> Vec<TlsMode> {
            self.llamadas.lock().unwrap().iter().map(|(_, m)| *m).collect()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &str, tls: TlsMode) -> Result<HttpResponse, TransportError> {
            self.llamadas.lock().unwrap().push((url.to_string(), tls));
            self.respuestas
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
        }
    }

    pub(crate) fn ok(body: &[u8]) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_vec(),
        })
    }

    pub(crate) fn estado(status: u16) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: Vec::new(),
        })
    }

    pub(crate) fn politica_inmediata() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            tls_fallback: true,
        }
    }

    fn fetcher(transporte: &Arc<ScriptedTransport>, politica: RetryPolicy) -> SegmentFetcher {
        let transporte: Arc<dyn HttpTransport> = transporte.clone();
        SegmentFetcher::new(transporte, politica)
    }

    const URL: &str = "https://archive.example.net/kpdx/KPDX-App-Dec-10-2025-0000Z.mp3";

    #[tokio::test]
    async fn dos_transitorios_y_exito() {
        let transporte = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Timeout("slow".to_string())),
            estado(503),
            ok(b"mp3"),
        ]));
        let segmento = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap();
        assert_eq!(segmento.bytes, b"mp3");
        assert_eq!(segmento.attempts, 3);
        assert!(!segmento.tls_bypassed);
        assert_eq!(transporte.llamadas.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn not_found_no_se_reintenta() {
        let transporte = Arc::new(ScriptedTransport::new(vec![estado(404), ok(b"never")]));
        let fallo = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap_err();
        assert_eq!(fallo.attempts, 1);
        assert_eq!(fallo.error.reason(), FailureReason::NotFound);
        assert_eq!(transporte.llamadas.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transitorios_agotan_el_presupuesto() {
        let transporte = Arc::new(ScriptedTransport::new(vec![
            estado(500),
            Err(TransportError::Connection("reset".to_string())),
            estado(429),
            ok(b"late"),
        ]));
        let fallo = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap_err();
        assert_eq!(fallo.attempts, 3);
        assert_eq!(fallo.error.reason(), FailureReason::Transient);
        assert_eq!(fallo.error.http_status(), Some(429));
    }

    #[tokio::test]
    async fn otros_estados_son_fatales() {
        let transporte = Arc::new(ScriptedTransport::new(vec![estado(403)]));
        let fallo: SegmentFailure = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap_err()
            .into();
        assert_eq!(fallo.reason, FailureReason::Fatal);
        assert_eq!(fallo.http_status, Some(403));
        assert_eq!(fallo.attempts, 1);
    }

    #[tokio::test]
    async fn respaldo_tls_una_sola_vez() {
        let transporte = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Tls("unknown issuer".to_string())),
            ok(b"mp3"),
        ]));
        let segmento = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap();
        assert!(segmento.tls_bypassed);
        assert_eq!(segmento.attempts, 2);
        assert_eq!(
            transporte.modos(),
            vec![TlsMode::Verified, TlsMode::Unverified]
        );
    }

    #[tokio::test]
    async fn respaldo_tls_no_consume_reintentos() {
        let transporte = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Tls("unknown issuer".to_string())),
            estado(502),
            estado(502),
            ok(b"mp3"),
        ]));
        let segmento = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap();
        assert_eq!(segmento.attempts, 4);
        assert!(segmento.tls_bypassed);
    }

    #[tokio::test]
    async fn tls_persistente_se_reporta() {
        let transporte = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Tls("bad".to_string())),
            Err(TransportError::Tls("still bad".to_string())),
        ]));
        let fallo = fetcher(&transporte, politica_inmediata())
            .fetch(URL)
            .await
            .unwrap_err();
        assert_eq!(fallo.error.reason(), FailureReason::TlsUntrusted);
        assert_eq!(fallo.attempts, 2);
    }

    #[tokio::test]
    async fn tls_sin_respaldo_configurado() {
        let transporte = Arc::new(ScriptedTransport::new(vec![Err(TransportError::Tls(
            "bad".to_string(),
        ))]));
        let politica = RetryPolicy {
            tls_fallback: false,
            ..politica_inmediata()
        };
        let fallo = fetcher(&transporte, politica).fetch(URL).await.unwrap_err();
        assert_eq!(fallo.error.reason(), FailureReason::TlsUntrusted);
        assert_eq!(fallo.attempts, 1);
        assert_eq!(transporte.modos(), vec![TlsMode::Verified]);
    }

    #[test]
    fn espera_exponencial_acotada() {
        let politica = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            tls_fallback: true,
        };
        assert_eq!(politica.delay_for(1), Duration::from_millis(1000));
        assert_eq!(politica.delay_for(2), Duration::from_millis(2000));
        assert_eq!(politica.delay_for(3), Duration::from_millis(3000));
        assert_eq!(politica.delay_for(10), Duration::from_millis(3000));
    }
}
