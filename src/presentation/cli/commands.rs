use clap::{Parser, Subcommand};

/// Parametros de linea de comandos.
#[derive(Parser)]
#[command(name = "atcrec")]
#[command(author, version, about = "Descarga grabaciones archivadas de LiveATC")]
pub struct Cli {
    /// Directorio base de salida (se crea `atc_rec/<estacion>`).
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Descargas simultaneas.
    #[arg(short = 'j', long, global = true)]
    pub jobs: Option<usize>,

    /// Pausa total entre envios de segmentos, en milisegundos (se reparte entre los jobs).
    #[arg(short = 'd', long = "delay", value_name = "MS", global = true)]
    pub delay: Option<u64>,

    /// Archivo de configuracion TOML.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcomandos disponibles.
#[derive(Subcommand)]
pub enum Commands {
    /// Lista las estaciones de un aeropuerto.
    Search {
        /// Codigo ICAO del aeropuerto.
        #[arg(value_name = "ICAO")]
        airport: String,
    },

    /// Descarga un segmento de 30 minutos.
    Get {
        /// Identificador de la estacion (ej. kpdx_app).
        station: String,
        /// Fecha UTC (YYYY-MM-DD, MM/DD/YYYY o Mon-DD-YYYY).
        #[arg(long)]
        date: String,
        /// Hora UTC (HHMM, HHMMZ o HH:MM); se alinea a la media hora anterior.
        #[arg(long)]
        time: String,
    },

    /// Descarga todos los segmentos entre dos instantes.
    Range {
        /// Identificador de la estacion.
        station: String,
        /// Inicio: fecha y hora UTC.
        #[arg(long, num_args = 2, value_names = ["DATE", "HHMM"], required = true)]
        start: Vec<String>,
        /// Fin (exclusivo): fecha y hora UTC.
        #[arg(long, num_args = 2, value_names = ["DATE", "HHMM"], required = true)]
        end: Vec<String>,
        /// Reintenta una vez los segmentos fallidos.
        #[arg(long)]
        retry_failed: bool,
    },
}
