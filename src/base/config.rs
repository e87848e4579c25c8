//! Load configuration via `config` crate with env-override support.

use std::{collections::HashMap, net::SocketAddr, ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::{prompts, types::Category};

use super::types::Res;

/// Default OpenAI triage agent model to use
fn default_openai_triage_agent_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature for OpenAI triage agent
fn default_openai_triage_agent_temperature() -> f32 {
    0.7
}

/// Default max output tokens for OpenAI model
fn default_openai_max_tokens() -> u32 {
    1024
}

/// Default system directive for the triage agent.
fn default_triage_agent_system_directive() -> String {
    prompts::TRIAGE_AGENT_SYSTEM_DIRECTIVE.to_string()
}

fn default_db_endpoint() -> String {
    "surrealkv://tickets.db".to_string()
}

fn default_db_namespace() -> String {
    "support".to_string()
}

fn default_db_database() -> String {
    "tickets".to_string()
}

fn default_server_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_cors_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_ticket_link_base_url() -> String {
    "http://localhost:5173/support".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_sender_name() -> String {
    "Support System".to_string()
}

/// Configuration for the support desk.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// Optional OpenAI-compatible API base URL (`OPENAI_API_BASE`).
    #[serde(default)]
    pub openai_api_base: Option<String>,
    /// OpenAI triage agent model to use (`OPENAI_TRIAGE_AGENT_MODEL`).
    #[serde(default = "default_openai_triage_agent_model")]
    pub openai_triage_agent_model: String,
    /// Sampling temperature to use for the triage agent model (`OPENAI_TRIAGE_AGENT_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_triage_agent_temperature")]
    pub openai_triage_agent_temperature: f32,
    /// Max output tokens for OpenAI model (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Optional custom system directive to override the default (`TRIAGE_AGENT_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_triage_agent_system_directive")]
    pub triage_agent_system_directive: String,
    /// Database endpoint (`DB_ENDPOINT`), e.g. `surrealkv://tickets.db`, `mem://`, or `ws://host:8000`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database root username (`DB_USERNAME`), only used for remote endpoints.
    #[serde(default)]
    pub db_username: Option<String>,
    /// Database root password (`DB_PASSWORD`).
    #[serde(default)]
    pub db_password: Option<String>,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Address the HTTP server binds to (`SERVER_BIND`).
    #[serde(default = "default_server_bind")]
    pub server_bind: String,
    /// Origin of the chat UI allowed by CORS (`CORS_ALLOWED_ORIGIN`).
    #[serde(default = "default_cors_allowed_origin")]
    pub cors_allowed_origin: String,
    /// Base URL of the ticket view linked from new-ticket emails (`TICKET_LINK_BASE_URL`).
    #[serde(default = "default_ticket_link_base_url")]
    pub ticket_link_base_url: String,
    /// SMTP relay host (`SMTP_HOST`).
    pub smtp_host: String,
    /// SMTP port (`SMTP_PORT`); 465 uses implicit TLS.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use STARTTLS on non-465 ports (`SMTP_STARTTLS`).
    #[serde(default = "default_true")]
    pub smtp_starttls: bool,
    /// SMTP username (`SMTP_USERNAME`).
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password (`SMTP_PASSWORD`).
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address for notifications (`SENDER_EMAIL`).
    pub sender_email: String,
    /// Sender display name (`SENDER_NAME`).
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    /// Whether resolved tickets still accept chat turns (`ACCEPT_MESSAGES_AFTER_RESOLUTION`).
    #[serde(default = "default_true")]
    pub accept_messages_after_resolution: bool,
    /// Notification recipients.
    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Where notifications go.
///
/// Set under `[routing]` in the config file:
///
/// ```toml
/// [routing]
/// default_recipient = "support-leads@example.com"
/// escalation_recipient = "escalations@example.com"
/// resolution_recipient = "reviews@example.com"
///
/// [routing.teams]
/// Website = "web-team@example.com"
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Team inbox per category.
    #[serde(default)]
    pub teams: HashMap<Category, String>,
    /// Recipient for categories without a team (including `Unclassified`).
    pub default_recipient: String,
    /// Recipient of escalation hand-offs.
    pub escalation_recipient: String,
    /// Recipient of resolution reviews.
    pub resolution_recipient: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let teams = HashMap::from([
            (Category::Website, "web-team@example.com".to_string()),
            (Category::Email, "email-team@example.com".to_string()),
            (Category::Social, "social-team@example.com".to_string()),
            (Category::Admin, "admin-team@example.com".to_string()),
        ]);

        Self {
            teams,
            default_recipient: "support-leads@example.com".to_string(),
            escalation_recipient: "escalations@example.com".to_string(),
            resolution_recipient: "reviews@example.com".to_string(),
        }
    }
}

impl RoutingConfig {
    /// Resolve the new-ticket recipient for a category.
    pub fn recipient_for(&self, category: Category) -> &str {
        self.teams.get(&category).map(String::as_str).unwrap_or(&self.default_recipient)
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("SUPPORT_DESK"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_triage_agent_temperature < 0.0 || self.openai_triage_agent_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI triage agent temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.server_bind.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("Server bind address `{}` is not a valid socket address.", self.server_bind));
        }

        if self.routing.default_recipient.trim().is_empty() {
            return Err(anyhow::anyhow!("A default notification recipient is required."));
        }

        Ok(())
    }
}

// Tests.
