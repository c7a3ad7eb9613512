use crate::domain::models::SegmentRequest;
use crate::domain::services::{default_rules, TokenRule};
use crate::domain::value_objects::StationId;
use crate::infrastructure::InfrastructureError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const OUTPUT_FOLDER: &str = "atc_rec";
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const MAX_JOBS: usize = 100;

/// Direcciones del servicio externo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Raiz del buscador; la consulta es `{search_base_url}/search/?icao=XXXX`.
    pub search_base_url: String,
    /// Plantilla de la pagina de estacion con `{station}`.
    pub station_page_url: String,
    /// Raiz de los archivos de audio.
    pub archive_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.liveatc.net".to_string(),
            station_page_url: "https://www.liveatc.net/archive.php?m={station}".to_string(),
            archive_base_url: "https://archive.liveatc.net".to_string(),
        }
    }
}

/// Parametros del cliente HTTP y de la politica de reintentos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    pub user_agent: String,
    /// Timeout para segmentos de audio.
    pub timeout_secs: u64,
    /// Timeout para paginas HTML.
    pub page_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Permite un reintento sin verificar el certificado.
    pub tls_fallback: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            page_timeout_secs: 10,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 8000,
            tls_fallback: true,
        }
    }
}

/// Concurrencia y ritmo de las descargas por rango.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSettings {
    pub jobs: usize,
    /// Pausa total entre envios; cada envio espera `stagger_ms / jobs`.
    pub stagger_ms: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            jobs: 3,
            stagger_ms: 2000,
        }
    }
}

/// Reglas de resolucion del token de archivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSettings {
    pub rules: Vec<TokenRule>,
    /// Deriva el token del identificador cuando la pagina no trae ninguno.
    pub derive_when_missing: bool,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            derive_when_missing: false,
        }
    }
}

/// Configuracion de salida, red y reglas de nombrado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_root: PathBuf,
    pub min_file_size: u64,
    pub naming_template: String,
    pub endpoints: Endpoints,
    pub http: HttpSettings,
    pub download: DownloadSettings,
    pub tokens: TokenSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let output_root = if let Some(dirs) = UserDirs::new() {
            dirs.download_dir()
                .map(PathBuf::from)
                .unwrap_or_else(|| dirs.home_dir().to_path_buf())
        } else {
            PathBuf::from(".")
        };
        Self {
            output_root,
            min_file_size: 1024,
            naming_template: "{token}-{date}-{time}.mp3".to_string(),
            endpoints: Endpoints::default(),
            http: HttpSettings::default(),
            download: DownloadSettings::default(),
            tokens: TokenSettings::default(),
        }
    }
}

impl AppConfig {
    /// Carga la configuracion desde `config/default.toml` si existe.
    /// # Notas
    /// - Si el archivo no existe o no se puede leer, usa valores por defecto.
    pub fn load() -> Self {
        let ruta_config = Path::new(DEFAULT_CONFIG_PATH);
        match fs::read_to_string(ruta_config) {
            Ok(contenido) => match Self::from_toml(&contenido) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("Ignoring {}: {}", ruta_config.display(), err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Carga la configuracion desde una ruta explicita.
    /// # Errors
    /// - `InfrastructureError::Io` si el archivo no se puede leer.
    /// - `InfrastructureError::Config` si el TOML es invalido.
    pub fn load_from(ruta: &Path) -> Result<Self, InfrastructureError> {
        let contenido = fs::read_to_string(ruta)?;
        Self::from_toml(&contenido)
    }

    /// Aplica un documento TOML sobre los valores por defecto.
    /// # Errors
    /// - `InfrastructureError::Config` si el TOML es invalido.
    pub fn from_toml(contenido: &str) -> Result<Self, InfrastructureError> {
        let file_config: FileConfig = toml::from_str(contenido)
            .map_err(|e| InfrastructureError::Config(format!("Invalid TOML: {}", e)))?;
        let mut config = Self::default();

        if let Some(general) = file_config.general {
            if let Some(output_root) = general.output_root {
                config.output_root = expandir_tilde(&output_root);
            }
            if let Some(min_file_size) = general.min_file_size {
                config.min_file_size = min_file_size;
            }
        }
        if let Some(naming) = file_config.naming {
            if let Some(template) = naming.template {
                config.naming_template = template;
            }
        }
        if let Some(endpoints) = file_config.endpoints {
            if let Some(url) = endpoints.search_base_url {
                config.endpoints.search_base_url = url;
            }
            if let Some(url) = endpoints.station_page_url {
                config.endpoints.station_page_url = url;
            }
            if let Some(url) = endpoints.archive_base_url {
                config.endpoints.archive_base_url = url;
            }
        }
        if let Some(http) = file_config.http {
            let destino = &mut config.http;
            if let Some(v) = http.user_agent {
                destino.user_agent = v;
            }
            if let Some(v) = http.timeout_secs {
                destino.timeout_secs = v;
            }
            if let Some(v) = http.page_timeout_secs {
                destino.page_timeout_secs = v;
            }
            if let Some(v) = http.max_attempts {
                destino.max_attempts = v;
            }
            if let Some(v) = http.backoff_base_ms {
                destino.backoff_base_ms = v;
            }
            if let Some(v) = http.backoff_max_ms {
                destino.backoff_max_ms = v;
            }
            if let Some(v) = http.tls_fallback {
                destino.tls_fallback = v;
            }
        }
        if let Some(download) = file_config.download {
            if let Some(jobs) = download.jobs {
                config.download.jobs = jobs;
            }
            if let Some(stagger_ms) = download.stagger_ms {
                config.download.stagger_ms = stagger_ms;
            }
        }
        if let Some(tokens) = file_config.tokens {
            if let Some(rules) = tokens.rules {
                config.tokens.rules = rules;
            }
            if let Some(derive) = tokens.derive_when_missing {
                config.tokens.derive_when_missing = derive;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Verifica limites antes de empezar a descargar.
    /// # Errors
    /// - `InfrastructureError::Config` con el primer valor fuera de rango.
    pub fn validate(&self) -> Result<(), InfrastructureError> {
        if self.download.jobs == 0 || self.download.jobs > MAX_JOBS {
            return Err(InfrastructureError::Config(format!(
                "jobs must be between 1 and {}, got {}",
                MAX_JOBS, self.download.jobs
            )));
        }
        if self.http.max_attempts == 0 {
            return Err(InfrastructureError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        for url in [
            &self.endpoints.search_base_url,
            &self.endpoints.station_page_url,
            &self.endpoints.archive_base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(InfrastructureError::Config(format!(
                    "Endpoint must start with http:// or https://: {}",
                    url
                )));
            }
        }
        if !self.endpoints.station_page_url.contains("{station}") {
            return Err(InfrastructureError::Config(
                "station_page_url must contain {station}".to_string(),
            ));
        }
        Ok(())
    }

    /// Construye la ruta de salida `atc_rec/<estacion>/<archivo>`.
    /// # Arguments
    /// - `station`: estacion descargada.
    /// - `request`: segmento, para el nombre de archivo.
    /// - `output_root_override`: raiz opcional de salida.
    pub fn get_output_path(
        &self,
        station: &StationId,
        request: &SegmentRequest,
        output_root_override: Option<&Path>,
    ) -> PathBuf {
        let filename = self
            .naming_template
            .replace("{token}", request.archive_token.as_str())
            .replace("{date}", &request.date_label())
            .replace("{time}", &request.time_of_day.to_string())
            .replace("{station}", station.as_str());

        let output_root = output_root_override.unwrap_or(self.output_root.as_path());
        let base_dir = if output_root.ends_with(OUTPUT_FOLDER) {
            output_root.to_path_buf()
        } else {
            output_root.join(OUTPUT_FOLDER)
        };

        base_dir.join(station.as_str()).join(filename)
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    general: Option<GeneralConfig>,
    naming: Option<NamingConfig>,
    endpoints: Option<EndpointsConfig>,
    http: Option<HttpConfig>,
    download: Option<DownloadConfig>,
    tokens: Option<TokensConfig>,
}

#[derive(Debug, Deserialize)]
struct GeneralConfig {
    output_root: Option<String>,
    min_file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NamingConfig {
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointsConfig {
    search_base_url: Option<String>,
    station_page_url: Option<String>,
    archive_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HttpConfig {
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    page_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    backoff_base_ms: Option<u64>,
    backoff_max_ms: Option<u64>,
    tls_fallback: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DownloadConfig {
    jobs: Option<usize>,
    stagger_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokensConfig {
    rules: Option<Vec<TokenRule>>,
    derive_when_missing: Option<bool>,
}

/// Expande `~/` al directorio personal.
pub fn expandir_tilde(ruta: &str) -> PathBuf {
    let ruta_normalizada = ruta.trim();
    if let Some(resto) = ruta_normalizada.strip_prefix("~/") {
        if let Some(home) = obtener_home_dir() {
            return home.join(resto);
        }
    }
    if let Some(resto) = ruta_normalizada.strip_prefix("~\\") {
        if let Some(home) = obtener_home_dir() {
            return home.join(resto);
        }
    }

    PathBuf::from(ruta_normalizada)
}

fn obtener_home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
