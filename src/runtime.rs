//! Runtime services and shared state for the support desk.

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::{
    api,
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{db::DbClient, llm::LlmClient, mail::MailClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the database client, LLM client, mail client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// (for example as `axum` state) without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The mail client instance.
    pub mail: MailClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the mail client.
        let mail = MailClient::smtp(&config)?;

        Ok(Self { config, db, llm, mail })
    }

    /// Serve the HTTP API until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.server_bind).await?;

        info!("Listening on {} ...", listener.local_addr()?);

        axum::serve(listener, api::router(self.clone())).with_graceful_shutdown(shutdown_signal()).await?;

        info!("Server stopped.");

        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested ...");
    }
}
