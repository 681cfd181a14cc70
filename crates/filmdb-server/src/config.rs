use std::path::PathBuf;

use crate::error::Result;
pub use clap::Parser;
use filmdb_app::state::AppConfig;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Movie catalog REST service")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "FILMDB_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "FILMDB_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "FILMDB_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/filmdb.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "FILMDB_DATA_DIR",
        help = "Data directory for database, default is system default like ~/.local/share/filmdb",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(long, env = "FILMDB_CORS", help = "Enable permissive CORS")]
    pub cors: bool,

    #[arg(
        long,
        env = "FILMDB_STRICT_REFERENCES",
        help = "Refuse to delete director or genre, which is still referenced by some movie"
    )]
    pub strict_references: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("filmdb"))
        .unwrap_or_else(|| PathBuf::from("filmdb"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/filmdb.db", self.data_dir))
    }

    /// Base URL under which server is reachable, when listening on given address
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&format!("http://{}:{}/", self.listen_address, self.port))?;
        Ok(url)
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            strict_references: config.strict_references,
        }
    }
}
