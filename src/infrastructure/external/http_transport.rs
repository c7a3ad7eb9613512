use crate::infrastructure::config::HttpSettings;
use crate::infrastructure::InfrastructureError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Modo de verificacion del certificado para una peticion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Verified,
    Unverified,
}

/// Respuesta HTTP minima; el cuerpo solo se lee en respuestas 2xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Error de red antes de obtener un estado HTTP.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{0}")]
    Other(String),
}

/// Contrato de transporte HTTP usado por el descargador.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Ejecuta un GET.
    /// # Errors
    /// - `TransportError` si no se obtuvo respuesta.
    async fn get(&self, url: &str, tls: TlsMode) -> Result<HttpResponse, TransportError>;
}

/// Transporte sobre `reqwest`. Los dos clientes se crean al construir y no cambian despues.
#[derive(Clone)]
pub struct ReqwestTransport {
    verificado: Client,
    sin_verificar: Option<Client>,
}

impl ReqwestTransport {
    /// Crea el transporte con el timeout indicado.
    /// # Errors
    /// - `InfrastructureError::Config` si falla la configuracion HTTP.
    pub fn new(settings: &HttpSettings, timeout: Duration) -> Result<Self, InfrastructureError> {
        let verificado = construir_cliente(settings, timeout, false)?;
        let sin_verificar = if settings.tls_fallback {
            Some(construir_cliente(settings, timeout, true)?)
        } else {
            None
        };
        Ok(Self {
            verificado,
            sin_verificar,
        })
    }
}

fn construir_cliente(
    settings: &HttpSettings,
    timeout: Duration,
    aceptar_invalidos: bool,
) -> Result<Client, InfrastructureError> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(timeout)
        .danger_accept_invalid_certs(aceptar_invalidos)
        .build()
        .map_err(|e| InfrastructureError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, tls: TlsMode) -> Result<HttpResponse, TransportError> {
        let client = match tls {
            TlsMode::Verified => &self.verificado,
            TlsMode::Unverified => self.sin_verificar.as_ref().ok_or_else(|| {
                TransportError::Other("TLS fallback is disabled".to_string())
            })?,
        };

        let response = client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(clasificar_error)?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: Vec::new(),
            });
        }

        let body = response.bytes().await.map_err(clasificar_error)?;
        Ok(HttpResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

fn clasificar_error(err: reqwest::Error) -> TransportError {
    // Sin la URL: su texto no debe influir en la clasificacion.
    let err = err.without_url();
    let detalle = cadena_de_errores(&err);
    if err.is_timeout() {
        TransportError::Timeout(detalle)
    } else if corte_de_conexion(&err) {
        TransportError::Connection(detalle)
    } else if es_error_tls(&detalle) {
        TransportError::Tls(detalle)
    } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
        TransportError::Connection(detalle)
    } else {
        TransportError::Other(detalle)
    }
}

/// Une el mensaje del error con todas sus causas.
fn cadena_de_errores(err: &dyn std::error::Error) -> String {
    let mut partes = vec![err.to_string()];
    let mut causa = err.source();
    while let Some(c) = causa {
        partes.push(c.to_string());
        causa = c.source();
    }
    partes.join(": ")
}

/// Alguna causa es un error de socket que ocurre antes del handshake TLS.
fn corte_de_conexion(err: &(dyn std::error::Error + 'static)) -> bool {
    use std::io::ErrorKind;

    let mut causa = Some(err);
    while let Some(c) = causa {
        if let Some(io) = c.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::AddrNotAvailable
                    | ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        causa = c.source();
    }
    false
}

fn es_error_tls(detalle: &str) -> bool {
    let texto = detalle.to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|marca| texto.contains(marca))
}
