use anyhow::Result;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub catalog_path: String,
    pub similarity_path: String,
    pub openrouter_api_key: String,
    pub generation_model: String,
    pub interaction_log_path: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            catalog_path: require("CATALOG_PATH")?,
            similarity_path: require("SIMILARITY_PATH")?,
            openrouter_api_key: require("OPENROUTER_API_KEY")?,
            generation_model: std::env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o".to_string()),
            interaction_log_path: std::env::var("INTERACTION_LOG_PATH")
                .unwrap_or_else(|_| "interaction_logs.jsonl".to_string()),
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{name} not set"))
}
