use clap::{Parser, ValueEnum};
use detour_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "DETOUR_GATEWAY_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "DETOUR_GATEWAY_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "DETOUR_GATEWAY_MYSQL_DSN";
pub const LOG_FORMAT_ENV: &str = "DETOUR_GATEWAY_LOG_FORMAT";
pub const CONTENT_TYPES_ENV: &str = "DETOUR_GATEWAY_CONTENT_TYPES";
pub const SLUG_CACHE_CAPACITY_ENV: &str = "DETOUR_GATEWAY_SLUG_CACHE_CAPACITY";
pub const SLUG_CACHE_TTL_ENV: &str = "DETOUR_GATEWAY_SLUG_CACHE_TTL_SECS";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SLUG_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_SLUG_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "detour-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// JSON array of content-type schemas. A built-in set is used when absent.
    #[arg(long, env = CONTENT_TYPES_ENV)]
    pub content_types: Option<PathBuf>,

    #[arg(long, env = SLUG_CACHE_CAPACITY_ENV, default_value_t = DEFAULT_SLUG_CACHE_CAPACITY)]
    pub slug_cache_capacity: u64,

    #[arg(long, env = SLUG_CACHE_TTL_ENV, default_value_t = DEFAULT_SLUG_CACHE_TTL_SECS)]
    pub slug_cache_ttl_secs: u64,
}
