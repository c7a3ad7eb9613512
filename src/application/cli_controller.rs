use crate::application::ArchiveService;
use crate::domain::models::{SegmentOutcome, SegmentRequest};
use crate::domain::repositories::ArchiveRepository;
use crate::domain::value_objects::{
    parse_archive_date, parse_utc_instant, AirportCode, StationId, ZuluTime,
};
use crate::infrastructure::config::{expandir_tilde, MAX_JOBS};
use crate::infrastructure::{AppConfig, InfrastructureError};
use crate::presentation::{Cli, Commands, ConsoleOutput};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

const LIMITE_CONCURRENCIA_DEFECTO: usize = 3;

/// Orquesta la ejecucion de la CLI.
///
/// Un rango con segmentos fallidos termina bien despues de informar; solo
/// los errores de resolucion (estacion o token) devuelven error.
pub async fn ejecutar_cli<R>(cli: Cli, mut config: AppConfig, repository: R) -> anyhow::Result<()>
where
    R: ArchiveRepository<Error = InfrastructureError> + 'static,
{
    let salida = ConsoleOutput::new();
    let Cli {
        output,
        jobs,
        delay,
        config: _,
        command,
    } = cli;

    if let Some(jobs) = jobs {
        if jobs == 0 || jobs > MAX_JOBS {
            anyhow::bail!("El limite de concurrencia debe estar entre 1 y {}", MAX_JOBS);
        }
        config.download.jobs = jobs;
    }
    if config.download.jobs > LIMITE_CONCURRENCIA_DEFECTO {
        salida.advertir_limite_concurrencia(LIMITE_CONCURRENCIA_DEFECTO, config.download.jobs);
    }
    if let Some(delay) = delay {
        config.download.stagger_ms = delay;
    }
    let raiz_salida = output.map(|ruta| expandir_tilde(&ruta));

    let service = ArchiveService::new(Arc::new(repository), &config.download);

    match command {
        Commands::Search { airport } => buscar_estaciones(&service, &salida, &airport).await,
        Commands::Get {
            station,
            date,
            time,
        } => {
            descargar_segmento(
                &service,
                &config,
                &salida,
                &station,
                &date,
                &time,
                raiz_salida.as_deref(),
            )
            .await
        }
        Commands::Range {
            station,
            start,
            end,
            retry_failed,
        } => {
            descargar_rango(
                &service,
                &config,
                &salida,
                &station,
                &start,
                &end,
                retry_failed,
                raiz_salida.as_deref(),
            )
            .await
        }
    }
}

async fn buscar_estaciones<R>(
    service: &ArchiveService<R>,
    salida: &ConsoleOutput,
    airport: &str,
) -> anyhow::Result<()>
where
    R: ArchiveRepository<Error = InfrastructureError> + 'static,
{
    let airport = AirportCode::new(airport)?;
    let estaciones = service.list_stations(&airport).await?;
    salida.mostrar_estaciones(&airport.to_uppercase(), &estaciones);
    Ok(())
}

async fn descargar_segmento<R>(
    service: &ArchiveService<R>,
    config: &AppConfig,
    salida: &ConsoleOutput,
    station: &str,
    date: &str,
    time: &str,
    raiz_salida: Option<&Path>,
) -> anyhow::Result<()>
where
    R: ArchiveRepository<Error = InfrastructureError> + 'static,
{
    let station = StationId::new(station)?;
    let fecha = parse_archive_date(date)?;
    let hora = ZuluTime::parse(time)?;
    salida.mostrar_inicio_descarga(
        station.as_str(),
        &fecha.format("%b-%d-%Y").to_string(),
        &hora.to_string(),
    );

    let (pedido, segmento) = service.download_one(&station, fecha, hora).await?;
    if segmento.tls_bypassed {
        salida.advertir_tls_omitido(&pedido);
    }

    let ruta = config.get_output_path(&station, &pedido, raiz_salida);
    guardar_segmento(&ruta, &segmento.bytes).await?;
    salida.mostrar_archivo_guardado(&ruta, segmento.bytes.len());
    if (segmento.bytes.len() as u64) < config.min_file_size {
        salida.advertir_archivo_pequeno(&ruta, segmento.bytes.len());
    }
    Ok(())
}

async fn descargar_rango<R>(
    service: &ArchiveService<R>,
    config: &AppConfig,
    salida: &ConsoleOutput,
    station: &str,
    start: &[String],
    end: &[String],
    reintentar_fallidos: bool,
    raiz_salida: Option<&Path>,
) -> anyhow::Result<()>
where
    R: ArchiveRepository<Error = InfrastructureError> + 'static,
{
    let station = StationId::new(station)?;
    let desde = leer_instante(start)?;
    let hasta = leer_instante(end)?;
    salida.mostrar_inicio_rango(station.as_str(), &formatear(desde), &formatear(hasta));

    let mut resultado = service.download_range(&station, desde, hasta).await?;
    if resultado.is_empty() {
        salida.mostrar_rango_vacio();
        salida.mostrar_resumen(&resultado, 0);
        return Ok(());
    }
    if let Some(token) = resultado.token() {
        salida.mostrar_token(token.as_str(), resultado.len());
    }

    if reintentar_fallidos && resultado.failure_count() > 0 {
        salida.mostrar_reintento_fallidos(resultado.failure_count());
        resultado = service.retry_failed(&resultado).await;
    }

    let mut sin_guardar = 0;
    for outcome in resultado.outcomes() {
        match outcome {
            SegmentOutcome::Success { request, segment } => {
                if segment.tls_bypassed {
                    salida.advertir_tls_omitido(request);
                }
                if !escribir_exito(config, salida, &station, request, &segment.bytes, raiz_salida)
                    .await
                {
                    sin_guardar += 1;
                }
            }
            SegmentOutcome::Failure { request, failure } => {
                salida.mostrar_segmento_fallido(request, failure);
            }
        }
    }

    salida.mostrar_resumen(&resultado, sin_guardar);
    Ok(())
}

/// Un fallo de escritura se informa y no corta el resto del rango.
/// Devuelve `false` si el archivo no se pudo guardar.
async fn escribir_exito(
    config: &AppConfig,
    salida: &ConsoleOutput,
    station: &StationId,
    pedido: &SegmentRequest,
    bytes: &[u8],
    raiz_salida: Option<&Path>,
) -> bool {
    let ruta = config.get_output_path(station, pedido, raiz_salida);
    match guardar_segmento(&ruta, bytes).await {
        Ok(()) => {
            salida.mostrar_segmento_ok(pedido, &ruta, bytes.len());
            if (bytes.len() as u64) < config.min_file_size {
                salida.advertir_archivo_pequeno(&ruta, bytes.len());
            }
            true
        }
        Err(err) => {
            salida.error_escritura(&ruta, &err.to_string());
            false
        }
    }
}

async fn guardar_segmento(ruta: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = ruta.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(ruta, bytes).await
}

fn leer_instante(partes: &[String]) -> anyhow::Result<DateTime<Utc>> {
    match partes {
        [fecha, hora] => Ok(parse_utc_instant(fecha, hora)?),
        _ => anyhow::bail!("Se esperaba fecha y hora (ej. 2025-12-10 2330)"),
    }
}

fn formatear(instante: DateTime<Utc>) -> String {
    instante.format("%b-%d-%Y %H%MZ").to_string()
}
