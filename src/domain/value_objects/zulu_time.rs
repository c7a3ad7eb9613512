use crate::domain::errors::DomainError;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use std::fmt;

/// Hora del dia en UTC, siempre alineada a un limite de 30 minutos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZuluTime {
    hour: u32,
    minute: u32,
}

impl ZuluTime {
    /// Crea una hora alineada, redondeando los minutos hacia abajo.
    /// # Errors
    /// - `DomainError::InvalidTimeOfDay` si la hora o los minutos estan fuera de rango.
    pub fn new(hour: u32, minute: u32) -> Result<Self, DomainError> {
        if hour > 23 || minute > 59 {
            return Err(DomainError::InvalidTimeOfDay(format!(
                "{:02}:{:02} is out of range",
                hour, minute
            )));
        }
        Ok(Self {
            hour,
            minute: minute - minute % 30,
        })
    }

    /// Alinea una hora arbitraria al limite de 30 minutos anterior.
    pub fn floor(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute() - time.minute() % 30,
        }
    }

    /// Interpreta `HHMM`, `HHMMZ` o `HH:MM`.
    /// # Errors
    /// - `DomainError::InvalidTimeOfDay` si el texto no es una hora valida.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let (hour, minute) = partes_hora(text)?;
        Self::new(hour, minute)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Formato `HHMM` usado en los nombres de segmento.
    pub fn hhmm(&self) -> String {
        format!("{:02}{:02}", self.hour, self.minute)
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ZuluTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Z", self.hhmm())
    }
}

fn partes_hora(text: &str) -> Result<(u32, u32), DomainError> {
    let limpio = text.trim();
    let limpio = limpio
        .strip_suffix('Z')
        .or_else(|| limpio.strip_suffix('z'))
        .unwrap_or(limpio);
    let digitos: String = limpio.chars().filter(|c| *c != ':').collect();

    if digitos.len() != 4 || !digitos.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvalidTimeOfDay(text.to_string()));
    }

    let hour: u32 = digitos[..2]
        .parse()
        .map_err(|_| DomainError::InvalidTimeOfDay(text.to_string()))?;
    let minute: u32 = digitos[2..]
        .parse()
        .map_err(|_| DomainError::InvalidTimeOfDay(text.to_string()))?;
    if hour > 23 || minute > 59 {
        return Err(DomainError::InvalidTimeOfDay(text.to_string()));
    }
    Ok((hour, minute))
}

/// Instante UTC exacto a partir de fecha y hora, sin alinear.
/// # Errors
/// - `DomainError::InvalidDate` o `DomainError::InvalidTimeOfDay`.
pub fn parse_utc_instant(date: &str, time: &str) -> Result<DateTime<Utc>, DomainError> {
    let fecha = parse_archive_date(date)?;
    let (hour, minute) = partes_hora(time)?;
    let hora = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| DomainError::InvalidTimeOfDay(time.to_string()))?;
    Ok(fecha.and_time(hora).and_utc())
}

/// Interpreta una fecha de calendario en `YYYY-MM-DD`, `MM/DD/YYYY` o `Mon-DD-YYYY`.
/// # Errors
/// - `DomainError::InvalidDate` si ningun formato coincide.
pub fn parse_archive_date(text: &str) -> Result<NaiveDate, DomainError> {
    let limpio = text.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%b-%d-%Y"]
        .iter()
        .find_map(|formato| NaiveDate::parse_from_str(limpio, formato).ok())
        .ok_or_else(|| DomainError::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_instant_keeps_minutes() {
        let instante = parse_utc_instant("12/10/2025", "0115Z").unwrap();
        assert_eq!(instante.to_rfc3339(), "2025-12-10T01:15:00+00:00");
        assert!(parse_utc_instant("2025-12-10", "2460").is_err());
        assert!(parse_utc_instant("10.12.2025", "0100").is_err());
    }

    #[test]
    fn test_zulu_time_floors_minutes() {
        assert_eq!(ZuluTime::new(14, 29).unwrap().hhmm(), "1400");
        assert_eq!(ZuluTime::new(14, 30).unwrap().hhmm(), "1430");
        assert_eq!(ZuluTime::new(14, 59).unwrap().hhmm(), "1430");
    }

    #[test]
    fn test_zulu_time_floor_is_idempotent() {
        for minutos in 0..24 * 60 {
            let t = NaiveTime::from_hms_opt(minutos / 60, minutos % 60, 17).unwrap();
            let una = ZuluTime::floor(t);
            let dos = ZuluTime::floor(una.as_naive_time());
            assert_eq!(una, dos);
            assert!(una.minute() == 0 || una.minute() == 30);
        }
    }

    #[test]
    fn test_zulu_time_parse_formats() {
        assert_eq!(ZuluTime::parse("0000Z").unwrap().hhmm(), "0000");
        assert_eq!(ZuluTime::parse("2345").unwrap().hhmm(), "2330");
        assert_eq!(ZuluTime::parse("07:31").unwrap().to_string(), "0730Z");
    }

    #[test]
    fn test_zulu_time_parse_rejects_garbage() {
        for texto in ["", "25:00", "1260", "12", "ab:cd", "12345"] {
            assert!(ZuluTime::parse(texto).is_err(), "Expected {:?} to fail", texto);
        }
    }

    #[test]
    fn test_parse_archive_date_formats() {
        let esperado = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        assert_eq!(parse_archive_date("2025-12-10").unwrap(), esperado);
        assert_eq!(parse_archive_date("12/10/2025").unwrap(), esperado);
        assert_eq!(parse_archive_date("Dec-10-2025").unwrap(), esperado);
        assert!(parse_archive_date("10.12.2025").is_err());
    }
}
