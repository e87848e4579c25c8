//! Library root for `support-desk`.
//!
//! Support-desk is a customer-support ticketing backend where an AI triage
//! assistant converses with a customer, classifies the issue, and opens a ticket:
//! - Persist tickets and their transcripts
//! - Route email notifications to the team owning the ticket's category
//! - Escalate, prioritize, and resolve tickets with a customer review
//!
//! The service integrates with SurrealDB for storage, OpenAI for triage, and
//! SMTP for notifications, behind traits that allow for different
//! implementations of each service. A terminal chat client drives the HTTP API.

pub mod api;
pub mod base;
pub mod client;
pub mod interaction;
pub mod runtime;
pub mod service;

use anyhow::anyhow;
use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the `serve` command.
///
/// Installs the crypto provider, creates the runtime context with database,
/// LLM, and mail clients, and serves the HTTP API until shutdown.
pub async fn start(config: Config) -> Void {
    info!("Starting support-desk ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("A crypto provider is already installed."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
