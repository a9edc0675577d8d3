use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Chat;
use rig::providers::openrouter;

/// System prompt sent with every generation call.
pub const SYSTEM_PROMPT: &str = "You are a helpful and insightful movie assistant.";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u64 = 600;

/// Boundary to the external text-generation collaborator. The core treats a
/// call as a single blocking operation that either returns generated text or
/// fails; there are no partial results.
#[async_trait]
pub trait SynopsisGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// OpenRouter-backed generator.
pub struct OpenRouterGenerator {
    agent: rig::agent::Agent<openrouter::CompletionModel>,
}

impl OpenRouterGenerator {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = openrouter::Client::new(api_key);
        let agent = client
            .agent(model)
            .preamble(SYSTEM_PROMPT)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build();
        Self { agent }
    }
}

#[async_trait]
impl SynopsisGenerator for OpenRouterGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let answer = self
            .agent
            .chat(prompt, vec![])
            .await
            .map_err(|e| anyhow::anyhow!("LLM chat failed: {e}"))?;
        Ok(answer.trim().to_string())
    }
}
