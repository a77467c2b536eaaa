use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bookshop.db";

#[derive(Debug, Parser)]
#[command(name = "bookshop", version, about = "Minimal bookshop REST service")]
pub struct Cli {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    #[arg(long, value_name = "COUNT")]
    pub max_connections: Option<u32>,

    /// Keep users in process memory instead of SQLite; nothing is persisted.
    #[arg(long)]
    pub in_memory: bool,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub in_memory: bool,
    pub secret_token_key: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .field("in_memory", &self.in_memory)
            .field("secret_token_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: String,
        source: dotenvy::Error,
    },
    #[error("invalid value for env var {key}: {value}")]
    InvalidEnv { key: String, value: String },
    #[error("SECRET_TOKEN_KEY must be set to a non-empty value")]
    MissingSecret,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    secret_token_key: Option<String>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        Self::resolve(cli, from_file, |key| std::env::var(key).ok())
    }

    /// CLI flag, then environment, then config file, then default.
    fn resolve<F>(cli: Cli, from_file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_bind = match env("BOOKSHOP_BIND") {
            Some(raw) => Some(raw.trim().parse::<SocketAddr>().map_err(|_| {
                ConfigError::InvalidEnv {
                    key: String::from("BOOKSHOP_BIND"),
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        let bind = cli
            .bind
            .or(env_bind)
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));
        let database_url = cli
            .database_url
            .or_else(|| env("DATABASE_URL"))
            .or(from_file.database_url)
            .unwrap_or_else(|| String::from(DEFAULT_DATABASE_URL));
        let max_connections = cli
            .max_connections
            .or(from_file.max_connections)
            .unwrap_or(5)
            .max(1);
        let secret_token_key = env("SECRET_TOKEN_KEY")
            .or(from_file.secret_token_key)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        Ok(Self {
            bind,
            database_url,
            max_connections,
            in_memory: cli.in_memory,
            secret_token_key,
        })
    }
}

/// Loads `${ENVIRONMENT}.env` when `ENVIRONMENT` is set (it must exist),
/// otherwise `.env` if present. Variables already in the process win.
pub fn load_environment_file() -> Result<Option<PathBuf>, ConfigError> {
    match std::env::var("ENVIRONMENT") {
        Ok(environment) if !environment.trim().is_empty() => {
            let filename = format!("{}.env", environment.trim());
            match dotenvy::from_filename(&filename) {
                Ok(path) => Ok(Some(path)),
                Err(source) => Err(ConfigError::EnvFile {
                    path: filename,
                    source,
                }),
            }
        }
        _ => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(err) if err.not_found() => Ok(None),
            Err(source) => Err(ConfigError::EnvFile {
                path: String::from(".env"),
                source,
            }),
        },
    }
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
