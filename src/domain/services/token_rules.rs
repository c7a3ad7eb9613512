//! Reglas para normalizar y ordenar candidatos a token de archivo.
//!
//! El nombre que usa el archivo para cada estacion cambia sin aviso
//! (mayusculas, prefijos de aeropuerto, sufijos numericos), por eso las
//! reglas se leen de la configuracion en lugar de estar fijas.

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{
    AirportCode, ArchiveToken, StationId, TokenConfidence, TokenResolution,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

// "-Oct-01-2021-0000Z"
const LARGO_SUFIJO_FECHA: usize = 18;

/// Regla de normalizacion, aplicada en el orden configurado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TokenRule {
    /// Quita espacios alrededor.
    Trim,
    /// Quita `-Mon-DD-YYYY-HHMMZ.mp3` si el valor es un nombre de archivo completo.
    StripSegmentSuffix,
    /// Pasa a mayusculas el codigo de aeropuerto inicial (`kpdx-App` -> `KPDX-App`).
    UpperAirportPrefix,
    /// Reemplazo arbitrario por expresion regular.
    Replace { pattern: String, replacement: String },
}

/// Reglas por defecto.
pub fn default_rules() -> Vec<TokenRule> {
    vec![
        TokenRule::Trim,
        TokenRule::StripSegmentSuffix,
        TokenRule::UpperAirportPrefix,
    ]
}

/// Valor crudo encontrado en la pagina de la estacion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
enum ReglaCompilada {
    Trim,
    StripSegmentSuffix,
    UpperAirportPrefix,
    Replace { regex: Regex, replacement: String },
}

/// Normalizador construido a partir de una lista de reglas.
#[derive(Debug, Clone)]
pub struct TokenNormalizer {
    reglas: Vec<ReglaCompilada>,
}

impl Default for TokenNormalizer {
    fn default() -> Self {
        Self {
            reglas: vec![
                ReglaCompilada::Trim,
                ReglaCompilada::StripSegmentSuffix,
                ReglaCompilada::UpperAirportPrefix,
            ],
        }
    }
}

impl TokenNormalizer {
    /// # Errors
    /// - `DomainError::InvalidTokenRule` si un patron `replace` no compila.
    pub fn new(rules: &[TokenRule]) -> Result<Self, DomainError> {
        let reglas = rules
            .iter()
            .map(|regla| match regla {
                TokenRule::Trim => Ok(ReglaCompilada::Trim),
                TokenRule::StripSegmentSuffix => Ok(ReglaCompilada::StripSegmentSuffix),
                TokenRule::UpperAirportPrefix => Ok(ReglaCompilada::UpperAirportPrefix),
                TokenRule::Replace {
                    pattern,
                    replacement,
                } => Regex::new(pattern)
                    .map(|regex| ReglaCompilada::Replace {
                        regex,
                        replacement: replacement.clone(),
                    })
                    .map_err(|e| DomainError::InvalidTokenRule(format!("{}: {}", pattern, e))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { reglas })
    }

    /// Aplica las reglas; `None` si el resultado no es un token valido.
    pub fn normalize(&self, raw: &str, airport: &AirportCode) -> Option<ArchiveToken> {
        let mut valor = raw.to_string();
        for regla in &self.reglas {
            valor = match regla {
                ReglaCompilada::Trim => valor.trim().to_string(),
                ReglaCompilada::StripSegmentSuffix => quitar_sufijo_segmento(&valor),
                ReglaCompilada::UpperAirportPrefix => mayusculas_prefijo(&valor, airport),
                ReglaCompilada::Replace { regex, replacement } => {
                    regex.replace_all(&valor, replacement.as_str()).into_owned()
                }
            };
        }
        ArchiveToken::new(valor).ok()
    }

    /// Normaliza, deduplica y ordena los candidatos.
    ///
    /// Orden: coherentes con el aeropuerto primero, entre ellos el seleccionado,
    /// luego orden del documento. `None` si no queda ningun candidato valido.
    pub fn rank(
        &self,
        candidates: &[RawCandidate],
        airport: &AirportCode,
    ) -> Option<TokenResolution> {
        let mut vistos: Vec<(ArchiveToken, bool)> = Vec::new();
        for candidato in candidates {
            let Some(token) = self.normalize(&candidato.value, airport) else {
                continue;
            };
            match vistos.iter_mut().find(|(t, _)| *t == token) {
                Some((_, seleccionado)) => *seleccionado |= candidato.selected,
                None => vistos.push((token, candidato.selected)),
            }
        }

        if vistos.is_empty() {
            return None;
        }

        let mut ordenados: Vec<(ArchiveToken, bool, bool)> = vistos
            .into_iter()
            .map(|(token, seleccionado)| {
                let coherente = coherente_con_aeropuerto(&token, airport);
                (token, seleccionado, coherente)
            })
            .collect();
        // `selected` solo desempata entre candidatos igual de coherentes.
        ordenados.sort_by_key(|(_, seleccionado, coherente)| (!*coherente, !*seleccionado));

        let coherentes = ordenados.iter().filter(|(_, _, coherente)| *coherente).count();
        let (_, seleccionado, coherente) = &ordenados[0];
        let confianza = if ordenados.len() == 1 || (*coherente && (*seleccionado || coherentes == 1)) {
            TokenConfidence::High
        } else {
            TokenConfidence::Low
        };

        let tokens = ordenados.into_iter().map(|(token, _, _)| token).collect();
        TokenResolution::new(tokens, confianza).ok()
    }
}

/// Token derivado del identificador: `kxyz1_app` -> `KXYZ1-App`.
pub fn derive_from_station(station: &StationId) -> Option<ArchiveToken> {
    let partes: Vec<String> = station
        .as_str()
        .split('_')
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, parte)| {
            if i == 0 {
                parte.to_uppercase()
            } else {
                capitalizar(parte)
            }
        })
        .collect();
    ArchiveToken::new(partes.join("-")).ok()
}

fn capitalizar(parte: &str) -> String {
    let mut letras = parte.chars();
    match letras.next() {
        Some(primera) => primera
            .to_uppercase()
            .chain(letras.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

fn quitar_sufijo_segmento(valor: &str) -> String {
    let sin_extension = match valor.len().checked_sub(4).and_then(|i| valor.get(i..)) {
        Some(ext) if ext.eq_ignore_ascii_case(".mp3") => &valor[..valor.len() - 4],
        _ => valor,
    };

    let Some(inicio) = sin_extension.len().checked_sub(LARGO_SUFIJO_FECHA) else {
        return sin_extension.to_string();
    };
    let Some(sufijo) = sin_extension.get(inicio..) else {
        return sin_extension.to_string();
    };

    let es_fecha = sufijo.char_indices().all(|(i, c)| match i {
        0 | 4 | 7 | 12 => c == '-',
        1..=3 => c.is_ascii_alphabetic(),
        17 => c == 'Z' || c == 'z',
        _ => c.is_ascii_digit(),
    });

    if es_fecha {
        sin_extension[..inicio].to_string()
    } else {
        sin_extension.to_string()
    }
}

fn mayusculas_prefijo(valor: &str, airport: &AirportCode) -> String {
    let n = airport.as_str().len();
    match (valor.get(..n), valor.get(n..)) {
        (Some(prefijo), Some(resto)) if prefijo.eq_ignore_ascii_case(airport.as_str()) => {
            format!("{}{}", prefijo.to_uppercase(), resto)
        }
        _ => valor.to_string(),
    }
}

fn coherente_con_aeropuerto(token: &ArchiveToken, airport: &AirportCode) -> bool {
    token
        .as_str()
        .to_uppercase()
        .starts_with(&airport.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpdx() -> AirportCode {
        AirportCode::new("kpdx").unwrap()
    }

    fn crudo(value: &str, selected: bool) -> RawCandidate {
        RawCandidate {
            value: value.to_string(),
            selected,
        }
    }

    #[test]
    fn normaliza_nombre_de_archivo_completo() {
        let normalizador = TokenNormalizer::default();
        let token = normalizador
            .normalize(" kpdx-App-Dep-Oct-01-2021-0000Z.mp3 ", &kpdx())
            .unwrap();
        assert_eq!(token.as_str(), "KPDX-App-Dep");
    }

    #[test]
    fn descarta_valores_invalidos() {
        let normalizador = TokenNormalizer::default();
        assert!(normalizador.normalize("   ", &kpdx()).is_none());
        assert!(normalizador.normalize("Select a feed", &kpdx()).is_none());
    }

    #[test]
    fn seleccionado_y_coherente_es_confianza_alta() {
        let resolucion = TokenNormalizer::default()
            .rank(
                &[
                    crudo("KPDX-Gnd", false),
                    crudo("KPDX-App-Dep", true),
                    crudo("KPDX-Twr", false),
                ],
                &kpdx(),
            )
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX-App-Dep");
        assert_eq!(resolucion.confidence(), TokenConfidence::High);
        assert_eq!(resolucion.alternates().len(), 2);
    }

    #[test]
    fn prefiere_el_coherente_con_el_aeropuerto() {
        let resolucion = TokenNormalizer::default()
            .rank(&[crudo("ZSE-Seattle", false), crudo("kpdx2-App", false)], &kpdx())
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX2-App");
        assert_eq!(resolucion.confidence(), TokenConfidence::High);
    }

    #[test]
    fn coherente_gana_a_seleccionado_incoherente() {
        let resolucion = TokenNormalizer::default()
            .rank(&[crudo("ZSE-Seattle", true), crudo("KPDX-App", false)], &kpdx())
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX-App");
        assert_eq!(resolucion.alternates()[0].as_str(), "ZSE-Seattle");
        assert_eq!(resolucion.confidence(), TokenConfidence::High);
    }

    #[test]
    fn varios_coherentes_sin_seleccion_es_confianza_baja() {
        let resolucion = TokenNormalizer::default()
            .rank(&[crudo("KPDX-Gnd", false), crudo("KPDX-Twr", false)], &kpdx())
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "KPDX-Gnd");
        assert!(resolucion.is_low_confidence());
    }

    #[test]
    fn sin_preferencia_elige_el_primero_con_baja_confianza() {
        let resolucion = TokenNormalizer::default()
            .rank(&[crudo("ZSE-One", false), crudo("ZSE-Two", false)], &kpdx())
            .unwrap();
        assert_eq!(resolucion.primary().as_str(), "ZSE-One");
        assert!(resolucion.is_low_confidence());
    }

    #[test]
    fn candidato_unico_es_confianza_alta() {
        let resolucion = TokenNormalizer::default()
            .rank(&[crudo("ZSE-One", false), crudo("ZSE-One ", false)], &kpdx())
            .unwrap();
        assert_eq!(resolucion.candidates().len(), 1);
        assert_eq!(resolucion.confidence(), TokenConfidence::High);
    }

    #[test]
    fn regla_replace_configurable() {
        let normalizador = TokenNormalizer::new(&[
            TokenRule::Trim,
            TokenRule::Replace {
                pattern: "_".to_string(),
                replacement: "-".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(
            normalizador.normalize("KPDX_App", &kpdx()).unwrap().as_str(),
            "KPDX-App"
        );
    }

    #[test]
    fn regla_replace_invalida_falla() {
        let resultado = TokenNormalizer::new(&[TokenRule::Replace {
            pattern: "(".to_string(),
            replacement: String::new(),
        }]);
        assert!(matches!(resultado, Err(DomainError::InvalidTokenRule(_))));
    }

    #[test]
    fn deriva_token_del_identificador() {
        let id = StationId::new("kxyz1_app").unwrap();
        assert_eq!(derive_from_station(&id).unwrap().as_str(), "KXYZ1-App");
        let id = StationId::new("kpdx_app_DEP").unwrap();
        assert_eq!(derive_from_station(&id).unwrap().as_str(), "KPDX-App-Dep");
    }
}
