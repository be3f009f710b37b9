use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database user
    pub db_user: String,

    /// Database password
    pub db_password: String,

    /// Database host
    pub db_host: String,

    /// Database port (default: 5432)
    pub db_port: u16,

    /// Database name
    pub db_name: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Messaging gateway commands endpoint (directory lookups)
    pub gateway_commands_url: String,

    /// Messaging gateway messages endpoint (template sends)
    pub gateway_messages_url: String,

    /// Messaging gateway API key, sent as the Authorization header
    pub gateway_api_key: String,

    /// Pre-approved template name
    pub template_name: String,

    /// Template namespace registered with the gateway
    pub template_namespace: String,

    /// HTTP listening port (default: 5000)
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            db_user: require("DB_USER")?,
            db_password: require("DB_PASSWORD")?,
            db_host: require("DB_HOST")?,
            db_port: std::env::var("DB_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_PORT must be a valid u16"))?,
            db_name: require("DB_NAME")?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            gateway_commands_url: require("GATEWAY_COMMANDS_URL")?,
            gateway_messages_url: require("GATEWAY_MESSAGES_URL")?,
            gateway_api_key: require("GATEWAY_API_KEY")?,
            template_name: require("TEMPLATE_NAME")?,
            template_namespace: require("TEMPLATE_NAMESPACE")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
        })
    }

    /// PostgreSQL connection string assembled from the DB_* variables.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

/// Scheduler configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Dispatch trigger endpoint invoked on every cycle
    pub trigger_url: String,
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            trigger_url: std::env::var("TRIGGER_URL")
                .unwrap_or_else(|_| "http://localhost:5000/send_notification".to_string()),
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))
}
