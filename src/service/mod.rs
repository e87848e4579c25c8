//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the support desk:
//! - Database services (e.g., SurrealDB) for tickets and transcripts
//! - LLM services (e.g., OpenAI) for triage replies
//! - Mail services (e.g., SMTP) for team notifications
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod db;
pub mod llm;
pub mod mail;
