//! Core components, types, and utilities for the support desk.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - System prompts and directives for LLM interactions.
//! - Common types, the ticket lifecycle, and the error taxonomy.

pub mod config;
pub mod error;
pub mod prompts;
pub mod types;
