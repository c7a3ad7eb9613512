//! Lectura tolerante de las paginas HTML del buscador y de cada estacion.
//!
//! El marcado no tiene contrato estable: se buscan solo los bloques
//! conocidos (tablas `body` y `freqTable`, `<option>`, enlaces `.mp3`) y se
//! ignora todo atributo o columna adicional. Una fila solo se descarta si le
//! falta id, descripcion o al menos una frecuencia.

use crate::domain::models::{Frequency, StationRecord};
use crate::domain::services::RawCandidate;
use crate::domain::value_objects::StationId;
use crate::infrastructure::InfrastructureError;
use regex::Regex;

/// Resultado de leer la pagina de busqueda.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub stations: Vec<StationRecord>,
    /// Bloques de estacion sin los campos minimos.
    pub discarded: usize,
}

/// Expresiones compiladas una sola vez por cliente.
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    apertura_tabla: Regex,
    cierre_tabla: Regex,
    atributo: Regex,
    fila: Regex,
    celda: Regex,
    etiqueta: Regex,
    strong: Regex,
    font: Regex,
    enlace_archivo: Regex,
    opcion: Regex,
    enlace_mp3: Regex,
    fecha_u_hora: Regex,
}

impl HtmlScanner {
    /// # Errors
    /// - `InfrastructureError::Config` si alguna expresion no compila.
    pub fn new() -> Result<Self, InfrastructureError> {
        let re = |patron: &str| {
            Regex::new(patron)
                .map_err(|e| InfrastructureError::Config(format!("Invalid HTML pattern: {}", e)))
        };
        Ok(Self {
            apertura_tabla: re(r"(?is)<table\b([^>]*)>")?,
            cierre_tabla: re(r"(?i)</table\s*>")?,
            atributo: re(
                r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
            )?,
            fila: re(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>")?,
            celda: re(r"(?is)<(t[dh])\b[^>]*>(.*?)</t[dh]\s*>")?,
            etiqueta: re(r"(?s)<[^>]*>")?,
            strong: re(r"(?is)<strong\b[^>]*>(.*?)</strong\s*>")?,
            font: re(r"(?is)<font\b[^>]*>(.*?)</font\s*>")?,
            enlace_archivo: re(r"(?i)archive\.php\?(?:[^\x22'>\s]*&(?:amp;)?)?m=([a-z0-9_]+)")?,
            opcion: re(r"(?is)<option\b([^>]*)>")?,
            enlace_mp3: re(r#"(?i)href\s*=\s*["']?[^"'\s>]*/([a-z0-9_-]+\.mp3)"#)?,
            fecha_u_hora: re(
                r"(?i)^(?:\d+|\d{4}z|[a-z]{3}-\d{2}-\d{4}|\d{1,2}/\d{1,2}/\d{2,4})$",
            )?,
        })
    }

    /// Lee los bloques de estacion de la pagina de busqueda.
    pub fn parse_catalog(&self, html: &str) -> CatalogPage {
        let tablas: Vec<(usize, usize, String)> = self
            .apertura_tabla
            .captures_iter(html)
            .filter_map(|caps| {
                let completo = caps.get(0)?;
                let atributos = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                Some((completo.start(), completo.end(), atributos.to_string()))
            })
            .collect();

        let inicios_estacion: Vec<usize> = tablas
            .iter()
            .enumerate()
            .filter(|(_, (_, _, atributos))| self.es_tabla_estacion(atributos))
            .map(|(i, _)| i)
            .collect();

        let mut pagina = CatalogPage::default();
        for (n, &indice) in inicios_estacion.iter().enumerate() {
            let inicio = tablas[indice].0;
            let fin = inicios_estacion
                .get(n + 1)
                .map(|&siguiente| tablas[siguiente].0)
                .unwrap_or(html.len());
            let bloque = &html[inicio..fin];

            let frecuencias = tablas
                .iter()
                .filter(|(pos, _, atributos)| {
                    *pos >= inicio && *pos < fin && tiene_clase(self, atributos, "freqtable")
                })
                .map(|(_, fin_apertura, _)| {
                    let resto = &html[*fin_apertura..];
                    let cierre = self
                        .cierre_tabla
                        .find(resto)
                        .map(|m| m.start())
                        .unwrap_or(resto.len());
                    self.parse_frequencies(&resto[..cierre])
                })
                .next()
                .unwrap_or_default();

            match self.parse_station_block(bloque, frecuencias) {
                Some(estacion) => pagina.stations.push(estacion),
                None => pagina.discarded += 1,
            }
        }
        pagina
    }

    /// Candidatos a token en la pagina de una estacion, en orden del documento.
    pub fn parse_token_candidates(&self, html: &str) -> Vec<RawCandidate> {
        let mut candidatos: Vec<RawCandidate> = self
            .opcion
            .captures_iter(html)
            .filter_map(|caps| {
                let atributos = caps.get(1)?.as_str();
                let value = self.atributo(atributos, "value")?;
                let value = limpiar_texto(&value);
                if value.is_empty() || self.fecha_u_hora.is_match(&value) {
                    return None;
                }
                Some(RawCandidate {
                    value,
                    selected: self.es_seleccionada(atributos),
                })
            })
            .collect();

        candidatos.extend(self.enlace_mp3.captures_iter(html).filter_map(|caps| {
            Some(RawCandidate {
                value: caps.get(1)?.as_str().to_string(),
                selected: false,
            })
        }));
        candidatos
    }

    fn parse_station_block(
        &self,
        bloque: &str,
        frequencies: Vec<Frequency>,
    ) -> Option<StationRecord> {
        let id = self
            .enlace_archivo
            .captures(bloque)
            .and_then(|caps| caps.get(1))
            .and_then(|m| StationId::new(m.as_str()).ok())?;

        let description = self
            .strong
            .captures(bloque)
            .and_then(|caps| caps.get(1))
            .map(|m| self.texto(m.as_str()))
            .filter(|texto| !texto.is_empty())?;

        if frequencies.is_empty() {
            return None;
        }

        let is_live = self
            .font
            .captures(bloque)
            .and_then(|caps| caps.get(1))
            .map(|m| self.texto(m.as_str()).eq_ignore_ascii_case("UP"))
            .unwrap_or(false);

        Some(StationRecord {
            id,
            description,
            frequencies,
            is_live,
        })
    }

    fn parse_frequencies(&self, tabla: &str) -> Vec<Frequency> {
        let filas: Vec<(bool, Vec<String>)> = self
            .fila
            .captures_iter(tabla)
            .filter_map(|caps| caps.get(1))
            .map(|fila| {
                let mut cabecera = false;
                let celdas = self
                    .celda
                    .captures_iter(fila.as_str())
                    .filter_map(|c| {
                        if c.get(1)?.as_str().eq_ignore_ascii_case("th") {
                            cabecera = true;
                        }
                        Some(self.texto(c.get(2)?.as_str()))
                    })
                    .collect();
                (cabecera, celdas)
            })
            .collect();

        // sin <th> la primera fila es la cabecera
        let saltar = usize::from(!filas.iter().any(|(cabecera, _)| *cabecera));

        filas
            .into_iter()
            .skip(saltar)
            .filter(|(cabecera, _)| !cabecera)
            .filter_map(|(_, celdas)| match celdas.as_slice() {
                [rol, valor, ..] if !valor.is_empty() => {
                    Some(Frequency::new(rol.as_str(), valor.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    fn es_tabla_estacion(&self, atributos: &str) -> bool {
        tiene_clase(self, atributos, "body")
            && self.atributo(atributos, "padding").as_deref() != Some("0")
    }

    fn es_seleccionada(&self, atributos: &str) -> bool {
        let sin_valores = self.atributo.replace_all(atributos, "");
        sin_valores
            .split(|c: char| c.is_whitespace() || c == '/')
            .any(|palabra| palabra.eq_ignore_ascii_case("selected"))
            || self.atributo(atributos, "selected").is_some()
    }

    fn atributo(&self, atributos: &str, nombre: &str) -> Option<String> {
        self.atributo.captures_iter(atributos).find_map(|caps| {
            let clave = caps.get(1)?.as_str();
            if !clave.eq_ignore_ascii_case(nombre) {
                return None;
            }
            caps.get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
        })
    }

    fn texto(&self, fragmento: &str) -> String {
        limpiar_texto(&self.etiqueta.replace_all(fragmento, " "))
    }
}

fn tiene_clase(scanner: &HtmlScanner, atributos: &str, clase: &str) -> bool {
    scanner
        .atributo(atributos, "class")
        .map(|valor| {
            valor
                .split_whitespace()
                .any(|c| c.eq_ignore_ascii_case(clase))
        })
        .unwrap_or(false)
}

/// Decodifica entidades comunes y colapsa espacios.
fn limpiar_texto(texto: &str) -> String {
    let decodificado = texto
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decodificado.split_whitespace().collect::<Vec<_>>().join(" ")
}
