use anyhow::Result;

/// Application configuration loaded from environment variables.
/// Passed explicitly into component constructors; there is no global
/// settings object, which keeps the taggers and chunker pure.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // AI / LLM
    pub openai_api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,

    // Fetching
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_inflight_per_host: usize,
    pub max_inflight_global: usize,

    // Ingestion
    pub ingest_interval_minutes: u64,
    pub article_workers: usize,

    // HTTP API
    pub api_host: String,
    pub api_port: u16,

    // Source reliability tiers for top-story ranking.
    // Declared as configuration data so deployments can override them.
    pub tier1_domains: Vec<String>,
    pub tier2_domains: Vec<String>,

    /// Countries whose briefs are refreshed after each triggered run.
    pub brief_countries: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")?,
            openai_api_key: std::env::var("OPENAI_API_KEY")?,
            chat_model: env_or("CHAT_MODEL", "gpt-4o-mini"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dim: env_parse("EMBEDDING_DIM", 1536),
            user_agent: env_or(
                "FETCH_USER_AGENT",
                "fluxwire/0.1 (+https://github.com/fluxwire/fluxwire)",
            ),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECONDS", 30),
            max_inflight_per_host: env_parse("MAX_INFLIGHT_PER_HOST", 4),
            max_inflight_global: env_parse("MAX_INFLIGHT_GLOBAL", 32),
            ingest_interval_minutes: env_parse("INGEST_INTERVAL_MINUTES", 30),
            article_workers: env_parse("ARTICLE_WORKERS", 8),
            api_host: env_or("API_HOST", "0.0.0.0"),
            api_port: env_parse("API_PORT", 8000),
            tier1_domains: env_list(
                "TIER1_DOMAINS",
                &["reuters.com", "bloomberg.com", "ft.com", "wsj.com"],
            ),
            tier2_domains: env_list("TIER2_DOMAINS", &["theguardian.com", "bbc.com", "cnn.com"]),
            brief_countries: env_list("BRIEF_COUNTRIES", &["US", "GB", "DE", "CN", "IN", "AU"]),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  CHAT_MODEL: {}", self.chat_model);
        tracing::info!("  EMBEDDING_MODEL: {} (dim {})", self.embedding_model, self.embedding_dim);
        tracing::info!("  INGEST_INTERVAL_MINUTES: {}", self.ingest_interval_minutes);
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, defaults: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => defaults.iter().map(|s| s.to_string()).collect(),
    }
}
