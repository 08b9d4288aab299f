//! Command line & configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::domain::error::StoreError;
use crate::domain::store::BookStore;
use crate::infra::http_store::HttpBookStore;
use crate::infra::json_store::JsonFileStore;

pub const DEFAULT_STORE_URL: &str = "http://localhost:5000";

#[derive(Debug, Parser)]
#[command(
    name = "book-manager-mcp",
    version,
    about = "Book catalog form & list over a REST book store, served as MCP tools on stdio"
)]
pub struct Cli {
    /// Base URL of the book store (`{url}/books` is the collection)
    #[arg(
        long,
        env = "BOOK_STORE_URL",
        default_value = DEFAULT_STORE_URL,
        conflicts_with = "db"
    )]
    pub store_url: String,

    /// Use a local json-server db.json file instead of HTTP
    #[arg(long, env = "BOOK_STORE_DB")]
    pub db: Option<PathBuf>,

    /// HTTP request timeout in seconds (default: none)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// ストアの接続先設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Http {
        base_url: String,
        timeout: Option<Duration>,
    },
    File {
        path: PathBuf,
    },
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        match &self.db {
            Some(path) => StoreConfig::File { path: path.clone() },
            None => StoreConfig::Http {
                base_url: self.store_url.clone(),
                timeout: self.timeout_secs.map(Duration::from_secs),
            },
        }
    }

    /// `-v` の回数に対応するデフォルトのログレベル
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl StoreConfig {
    pub fn build(&self) -> Result<Box<dyn BookStore>, StoreError> {
        Ok(match self {
            Self::Http {
                base_url,
                timeout: Some(timeout),
            } => Box::new(HttpBookStore::with_timeout(base_url, *timeout)?),
            Self::Http {
                base_url,
                timeout: None,
            } => Box::new(HttpBookStore::new(base_url)?),
            Self::File { path } => Box::new(JsonFileStore::new(path)),
        })
    }
}

/// ログはstderrへ（stdoutはMCPの通信路）。
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
