use crate::domain::models::{
    FailureReason, FetchedSegment, RangeResult, SegmentFailure, SegmentOutcome, SegmentRequest,
    StationRecord,
};
use crate::domain::repositories::ArchiveRepository;
use crate::domain::services::plan_range;
use crate::domain::value_objects::{AirportCode, ArchiveToken, StationId, ZuluTime};
use crate::infrastructure::config::{DownloadSettings, MAX_JOBS};
use crate::infrastructure::InfrastructureError;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration};

/// Operaciones de alto nivel sobre el archivo: listar, descargar uno o un rango.
pub struct ArchiveService<R> {
    repository: Arc<R>,
    jobs: usize,
    stagger: Duration,
}

impl<R> ArchiveService<R>
where
    R: ArchiveRepository<Error = InfrastructureError> + 'static,
{
    pub fn new(repository: Arc<R>, settings: &DownloadSettings) -> Self {
        Self {
            repository,
            jobs: settings.jobs.clamp(1, MAX_JOBS),
            stagger: Duration::from_millis(settings.stagger_ms),
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Estaciones publicadas para un aeropuerto.
    /// # Errors
    /// - `InfrastructureError::NotFound` si el aeropuerto no tiene estaciones.
    /// - `InfrastructureError::Upstream` si la pagina no se pudo leer.
    pub async fn list_stations(
        &self,
        airport: &AirportCode,
    ) -> Result<Vec<StationRecord>, InfrastructureError> {
        self.repository.list_stations(airport).await
    }

    /// Descarga un solo segmento; el fallo se devuelve tal cual.
    /// # Returns
    /// - El pedido efectivo (ya alineado, con el token resuelto) y su contenido.
    /// # Errors
    /// - Errores de resolucion de token.
    /// - `InfrastructureError::Segment` si la descarga fallo.
    pub async fn download_one(
        &self,
        station: &StationId,
        date: NaiveDate,
        time: ZuluTime,
    ) -> Result<(SegmentRequest, FetchedSegment), InfrastructureError> {
        let airport = station.airport_code()?;
        let resolucion = self.repository.resolve_archive_token(station).await?;
        let pedido = SegmentRequest::new(airport, resolucion.primary().clone(), date, time);
        let segmento = self.repository.fetch_segment(&pedido).await?;
        Ok((pedido, segmento))
    }

    /// Descarga todos los segmentos de `[start, end)`.
    ///
    /// El token se resuelve una vez. Si la resolucion fue de baja confianza y
    /// el rango entero dio 404, se repite con cada alternativa, una vez cada una.
    /// # Errors
    /// - Solo errores de resolucion; los fallos por segmento quedan en el resultado.
    pub async fn download_range(
        &self,
        station: &StationId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RangeResult, InfrastructureError> {
        if end <= start {
            return Ok(RangeResult::empty(station.clone()));
        }

        let airport = station.airport_code()?;
        let resolucion = self.repository.resolve_archive_token(station).await?;

        let mut resultado = self
            .descargar_con_token(station, &airport, resolucion.primary(), start, end)
            .await;

        if resolucion.is_low_confidence() {
            for alternativa in resolucion.alternates() {
                if !todo_ausente(&resultado) {
                    break;
                }
                tracing::warn!(
                    station = station.as_str(),
                    anterior = resultado.token().map(ArchiveToken::as_str).unwrap_or_default(),
                    alternativa = alternativa.as_str(),
                    "Every segment was missing; retrying range with alternate token"
                );
                resultado = self
                    .descargar_con_token(station, &airport, alternativa, start, end)
                    .await;
            }
        }

        Ok(resultado)
    }

    /// Vuelve a pedir solo los segmentos fallidos, con el mismo token.
    pub async fn retry_failed(&self, previo: &RangeResult) -> RangeResult {
        let Some(token) = previo.token() else {
            return previo.clone();
        };

        let pendientes: Vec<(usize, SegmentRequest)> = previo
            .outcomes()
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(i, outcome)| (i, outcome.request().clone()))
            .collect();

        if pendientes.is_empty() {
            return previo.clone();
        }

        tracing::info!(
            station = previo.station().as_str(),
            pendientes = pendientes.len(),
            "Retrying failed segments"
        );

        let (indices, pedidos): (Vec<usize>, Vec<SegmentRequest>) = pendientes.into_iter().unzip();
        let nuevos = self.descargar_pedidos(pedidos).await;

        let mut outcomes = previo.outcomes().to_vec();
        for (indice, outcome) in indices.into_iter().zip(nuevos) {
            outcomes[indice] = outcome;
        }
        RangeResult::new(previo.station().clone(), token.clone(), outcomes)
    }

    async fn descargar_con_token(
        &self,
        station: &StationId,
        airport: &AirportCode,
        token: &ArchiveToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RangeResult {
        let pedidos = plan_range(airport, token, start, end);
        tracing::info!(
            station = station.as_str(),
            token = token.as_str(),
            segmentos = pedidos.len(),
            "Downloading range"
        );
        let outcomes = self.descargar_pedidos(pedidos).await;
        RangeResult::new(station.clone(), token.clone(), outcomes)
    }

    /// Descarga los pedidos con un pool acotado y devuelve un resultado por
    /// pedido, en el mismo orden de entrada.
    async fn descargar_pedidos(&self, pedidos: Vec<SegmentRequest>) -> Vec<SegmentOutcome> {
        let total = pedidos.len();
        if total == 0 {
            return Vec::new();
        }

        let trabajadores = self.jobs.min(total);
        let espera_envio = self.stagger / u32::try_from(self.jobs).unwrap_or(u32::MAX);

        let (tx, rx) = mpsc::channel::<(usize, SegmentRequest)>(trabajadores);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let mut tareas = JoinSet::new();

        for _ in 0..trabajadores {
            let repository = Arc::clone(&self.repository);
            let rx = Arc::clone(&rx);

            tareas.spawn(async move {
                let mut hechos = Vec::new();
                loop {
                    let siguiente = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some((indice, pedido)) = siguiente else {
                        break;
                    };

                    let resultado = repository.fetch_segment(&pedido).await;
                    match &resultado {
                        Ok(segmento) => tracing::debug!(
                            segmento = %pedido,
                            bytes = segmento.bytes.len(),
                            intentos = segmento.attempts,
                            "Segment downloaded"
                        ),
                        Err(fallo) => tracing::debug!(
                            segmento = %pedido,
                            error = %fallo,
                            "Segment failed"
                        ),
                    }
                    hechos.push((indice, SegmentOutcome::from_result(pedido, resultado)));
                }
                hechos
            });
        }

        let mut por_indice: Vec<Option<SegmentOutcome>> = vec![None; total];
        let copia = pedidos.clone();

        for (indice, pedido) in pedidos.into_iter().enumerate() {
            if indice > 0 && !espera_envio.is_zero() {
                sleep(espera_envio).await;
            }
            if tx.send((indice, pedido)).await.is_err() {
                break;
            }
        }
        drop(tx);

        while let Some(resultado) = tareas.join_next().await {
            match resultado {
                Ok(hechos) => {
                    for (indice, outcome) in hechos {
                        por_indice[indice] = Some(outcome);
                    }
                }
                Err(err) => tracing::warn!(error = %err, "Download worker aborted"),
            }
        }

        por_indice
            .into_iter()
            .enumerate()
            .map(|(indice, outcome)| {
                outcome.unwrap_or_else(|| SegmentOutcome::Failure {
                    request: copia[indice].clone(),
                    failure: SegmentFailure {
                        reason: FailureReason::Fatal,
                        http_status: None,
                        detail: "download worker aborted".to_string(),
                        attempts: 0,
                    },
                })
            })
            .collect()
    }
}

/// Ningun exito y todos los fallos son 404.
fn todo_ausente(resultado: &RangeResult) -> bool {
    !resultado.is_empty()
        && resultado.success_count() == 0
        && resultado
            .failures()
            .all(|o| o.failure().map(|f| f.reason) == Some(FailureReason::NotFound))
}
