//! Integration with Large Language Model services.
//!
//! This module provides a thin wrapper around the OpenAI chat completions API
//! for the triage agent: the system directive goes first, the earlier turns
//! follow as context, and the last turn is sent as the new user message.

use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{GenericLlmClient, LlmClient, extract_category};
use crate::base::{
    config::Config,
    types::{ChatTurn, Res, Role, TriageReply},
};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let mut cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        if let Some(api_base) = &config.openai_api_base {
            cfg = cfg.with_api_base(api_base.clone());
        }

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    /// Build the chat completion messages for a history.
    #[instrument(name = "OpenAiLlmClient::build_triage_messages", skip_all)]
    fn build_triage_messages(&self, history: &[ChatTurn]) -> Res<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.config.triage_agent_system_directive.clone())
                .build()?
                .into(),
        );

        let Some((last, context)) = history.split_last() else {
            return Err(anyhow::anyhow!("Cannot triage an empty history."));
        };

        for turn in context {
            let message = match turn.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default().content(turn.content.clone()).build()?.into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default().content(turn.content.clone()).build()?.into(),
            };

            messages.push(message);
        }

        // The last entry is always sent as the new user turn.
        messages.push(ChatCompletionRequestUserMessageArgs::default().content(last.content.clone()).build()?.into());

        Ok(messages)
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::triage", skip_all, fields(turns = history.len()))]
    async fn triage(&self, history: &[ChatTurn]) -> Res<TriageReply> {
        let messages = self.build_triage_messages(history)?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.config.openai_triage_agent_model)
            .max_completion_tokens(self.config.openai_max_tokens)
            .messages(messages);

        // Add the temperature for the non-reasoning models.
        if self.config.openai_triage_agent_model.starts_with("gpt") {
            request.temperature(self.config.openai_triage_agent_temperature);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let reply = response.choices.first().and_then(|choice| choice.message.content.clone()).unwrap_or_default();

        if reply.trim().is_empty() {
            warn!("LLM returned an empty reply.");
            return Err(anyhow::anyhow!("The triage agent returned an empty reply."));
        }

        let category = extract_category(&reply);

        info!("LLM replied ({} chars, category: {:?}).", reply.len(), category);

        Ok(TriageReply { reply, category })
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{config::ConfigInner, prompts};

    fn create_test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "test_key".to_string()),
                openai_triage_agent_model: "gpt-4.1-mini".to_string(),
                openai_triage_agent_temperature: 0.0,
                openai_max_tokens: 200u32, // Small for tests
                triage_agent_system_directive: prompts::TRIAGE_AGENT_SYSTEM_DIRECTIVE.to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_build_triage_messages_shape() {
        let client = OpenAiLlmClient::new(&create_test_config());
        let history = vec![ChatTurn::user("My site is down"), ChatTurn::assistant("[Website] Which site?"), ChatTurn::user("example.com")];

        let messages = client.build_triage_messages(&history).unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_triage_messages_rejects_empty_history() {
        let client = OpenAiLlmClient::new(&create_test_config());

        assert!(client.build_triage_messages(&[]).is_err());
    }

    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY"]
    async fn test_llm_client_triage_live() {
        let client = LlmClient::openai(&create_test_config());

        let reply = client.triage(&[ChatTurn::user("My website shows a 502 error since this morning.")]).await.unwrap();

        assert!(!reply.reply.is_empty(), "Reply should not be empty");
    }

    #[tokio::test]
    async fn test_llm_client_error_handling_invalid_endpoint() {
        let mut config = create_test_config();
        let config_inner = Arc::make_mut(&mut config.inner);
        config_inner.openai_api_key = "sk-invalid-key-for-testing".to_string();
        config_inner.openai_api_base = Some("http://127.0.0.1:9/v1".to_string());

        let client = LlmClient::openai(&config);

        let result = client.triage(&[ChatTurn::user("test")]).await;
        assert!(result.is_err(), "Should fail against an unreachable endpoint");
    }
}
