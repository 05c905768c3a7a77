//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, and `.env` is loaded before
//! parsing, so `MONGODB_URL=... roster` and `roster --mongodb-url ...` are equivalent.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use roster_core::{
    backend::StoreBackendBuilder,
    error::DocumentStoreResult,
    store::DocumentStore,
};
use roster_memory::InMemoryStore;

/// Store URL selecting the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

#[derive(Parser, Debug, Clone)]
#[command(name = "roster")]
#[command(author, version, about = "Employee records service", long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// MongoDB connection string, or memory:// for a throwaway in-memory store
    #[arg(long, global = true, env = "MONGODB_URL", default_value = "mongodb://localhost:27017")]
    pub mongodb_url: String,

    /// Database holding the employees collection
    #[arg(long, global = true, env = "ROSTER_DATABASE", default_value = "assessment_db")]
    pub database: String,

    /// Address the HTTP server listens on
    #[arg(long, global = true, env = "ROSTER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Serve the HTTP API (default)
    #[default]
    Serve,

    /// Replace the employees collection with sample data
    Seed,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }

    /// Opens the document store named by `--mongodb-url`.
    pub async fn open_store(&self) -> DocumentStoreResult<DocumentStore> {
        if self.mongodb_url == MEMORY_URL {
            return Ok(DocumentStore::new(InMemoryStore::builder().build().await?));
        }

        self.open_mongodb().await
    }

    #[cfg(feature = "mongodb")]
    async fn open_mongodb(&self) -> DocumentStoreResult<DocumentStore> {
        let backend = roster_mongodb::MongoDbStore::builder(&self.mongodb_url, &self.database)
            .build()
            .await?;

        Ok(DocumentStore::new(backend))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn open_mongodb(&self) -> DocumentStoreResult<DocumentStore> {
        Err(roster_core::error::DocumentStoreError::Initialization(format!(
            "{} requires the `mongodb` feature; use {MEMORY_URL} instead",
            self.mongodb_url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = Cli::try_parse_from(["roster"]).unwrap();

        assert_eq!(cli.command(), Command::Serve);
        assert_eq!(cli.database, "assessment_db");
        assert_eq!(cli.bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert!(!cli.verbose);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["roster", "seed", "--mongodb-url", "memory://", "-v"]).unwrap();

        assert_eq!(cli.command(), Command::Seed);
        assert_eq!(cli.mongodb_url, MEMORY_URL);
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_malformed_bind_address() {
        assert!(Cli::try_parse_from(["roster", "--bind", "localhost"]).is_err());
    }

    #[tokio::test]
    async fn memory_url_opens_a_working_store() {
        let cli = Cli::try_parse_from(["roster", "--mongodb-url", "memory://"]).unwrap();
        let store = cli.open_store().await.unwrap();

        store.ping().await.unwrap();
    }
}
