use crate::domain::models::{RangeResult, SegmentFailure, SegmentRequest, StationRecord};
use std::path::Path;

pub struct ConsoleOutput;

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }

    pub fn advertir_limite_concurrencia(&self, recomendado: usize, solicitado: usize) {
        println!(
            "[WARN] El limite recomendado es {}. Se solicito {}",
            recomendado, solicitado
        );
    }

    pub fn mostrar_estaciones(&self, aeropuerto: &str, estaciones: &[StationRecord]) {
        println!("=== atcrec - Estaciones de {} ===\n", aeropuerto);
        for estacion in estaciones {
            let estado = if estacion.is_live { "UP" } else { "DOWN" };
            println!("{} [{}]", estacion.id, estado);
            println!("  {}", estacion.description);
            for frecuencia in &estacion.frequencies {
                println!("    {:<30} {}", frecuencia.label, frecuencia.frequency);
            }
        }
        println!("\n{} estacion(es)", estaciones.len());
    }

    pub fn mostrar_inicio_descarga(&self, estacion: &str, fecha: &str, hora: &str) {
        println!("Estacion: {}", estacion);
        println!("Segmento: {} {}", fecha, hora);
    }

    pub fn mostrar_inicio_rango(&self, estacion: &str, desde: &str, hasta: &str) {
        println!("=== atcrec - Descarga por rango ===\n");
        println!("Estacion: {}", estacion);
        println!("Desde: {}", desde);
        println!("Hasta: {} (exclusivo)", hasta);
    }

    pub fn mostrar_rango_vacio(&self) {
        println!("[WARN] El rango no contiene ningun segmento (fin <= inicio)");
    }

    pub fn mostrar_token(&self, token: &str, segmentos: usize) {
        println!("Token: {}", token);
        println!("Segmentos: {}\n", segmentos);
    }

    pub fn mostrar_segmento_ok(&self, pedido: &SegmentRequest, ruta: &Path, bytes: usize) {
        println!(
            "[OK] {} -> {} ({:.2} MB)",
            pedido,
            ruta.display(),
            bytes as f64 / BYTES_PER_MEGABYTE
        );
    }

    pub fn mostrar_segmento_fallido(&self, pedido: &SegmentRequest, fallo: &SegmentFailure) {
        match fallo.http_status {
            Some(status) => println!("[FAIL] {}: {} (HTTP {})", pedido, fallo, status),
            None => println!("[FAIL] {}: {}", pedido, fallo),
        }
    }

    pub fn advertir_tls_omitido(&self, pedido: &SegmentRequest) {
        println!(
            "[WARN] {} se descargo SIN verificar el certificado TLS",
            pedido
        );
    }

    pub fn advertir_archivo_pequeno(&self, ruta: &Path, bytes: usize) {
        println!(
            "[WARN] Archivo muy pequeno ({} bytes): {}",
            bytes,
            ruta.display()
        );
    }

    pub fn error_escritura(&self, ruta: &Path, error: &str) {
        println!("[ERROR] No se pudo escribir {}: {}", ruta.display(), error);
    }

    pub fn mostrar_reintento_fallidos(&self, fallidos: usize) {
        println!("\nReintentando {} segmento(s) fallido(s)...\n", fallidos);
    }

    pub fn mostrar_resumen(&self, resultado: &RangeResult, sin_guardar: usize) {
        println!("\n---");
        println!("{}", resumen_rango(resultado, sin_guardar));
    }

    pub fn mostrar_archivo_guardado(&self, ruta: &Path, bytes: usize) {
        println!(
            "\n[OK] Archivo guardado: {} ({:.2} MB)",
            ruta.display(),
            bytes as f64 / BYTES_PER_MEGABYTE
        );
    }
}

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Linea final de un rango. `OK` cuenta solo los segmentos descargados y guardados.
pub fn resumen_rango(resultado: &RangeResult, sin_guardar: usize) -> String {
    let guardados = resultado.success_count().saturating_sub(sin_guardar);
    let mut linea = format!(
        "Total: {} | OK: {} | FAIL: {}",
        resultado.len(),
        guardados,
        resultado.failure_count()
    );
    if sin_guardar > 0 {
        linea.push_str(&format!(" | ERROR escritura: {}", sin_guardar));
    }
    linea
}
