use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Ollama
    pub ollama_url: String,
    pub ollama_model: String,

    // Scheduling cadence
    pub feed_fetch_interval_secs: u64,
    pub article_batch_interval_secs: u64,
    pub claim_batch_interval_secs: u64,

    // Worker pool
    pub max_concurrent_tasks: usize,
    pub task_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            ollama_url: env::var("OLLAMA_API_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama2".to_string()),
            feed_fetch_interval_secs: env_u64("FEED_FETCH_INTERVAL_SECS", 30 * 60),
            article_batch_interval_secs: env_u64("ARTICLE_BATCH_INTERVAL_SECS", 5 * 60),
            claim_batch_interval_secs: env_u64("CLAIM_BATCH_INTERVAL_SECS", 10 * 60),
            max_concurrent_tasks: env_u64("MAX_CONCURRENT_TASKS", 8) as usize,
            task_timeout_secs: env_u64("TASK_TIMEOUT_SECS", 5 * 60),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
