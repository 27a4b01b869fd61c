use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse the `APP_ENV` spelling. `test` is accepted for development.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "production" | "prod" => Some(Environment::Production),
            "staging" | "stage" => Some(Environment::Staging),
            "development" | "dev" | "test" => Some(Environment::Development),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base connection URL; its path is replaced by `name`.
    pub url: Option<String>,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_hours: i64,
    pub refresh_token_hours: i64,
    pub min_password_length: usize,
    pub activation_token_length: usize,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(skip_serializing)]
    pub sendgrid_api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
    /// Base URL of the web client that serves the activation and reset pages
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = env::var("APP_ENV")
            .ok()
            .and_then(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        Self::for_environment(environment)
    }

    /// Defaults for `environment`, then overridden by specific env vars
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("STASH_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_BIND_ADDRESS") {
            self.server.bind_address = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_ACCESS_TOKEN_HOURS") {
            self.security.access_token_hours = v.parse().unwrap_or(self.security.access_token_hours);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_TOKEN_HOURS") {
            self.security.refresh_token_hours = v.parse().unwrap_or(self.security.refresh_token_hours);
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }
        if let Ok(v) = env::var("SECURITY_ACTIVATION_TOKEN_LENGTH") {
            self.security.activation_token_length = v.parse().unwrap_or(self.security.activation_token_length);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        // Mail overrides
        if let Ok(v) = env::var("SENDGRID_API_KEY") {
            self.mail.sendgrid_api_key = Some(v).filter(|k| !k.trim().is_empty());
        }
        if let Ok(v) = env::var("MAIL_SENDER_EMAIL") {
            self.mail.sender_email = v;
        }
        if let Ok(v) = env::var("MAIL_SENDER_NAME") {
            self.mail.sender_name = v;
        }
        if let Ok(v) = env::var("MAIL_FRONTEND_URL") {
            self.mail.frontend_url = v.trim_end_matches('/').to_string();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                name: "stash_test".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "secret".to_string(),
                jwt_issuer: "stash-api".to_string(),
                access_token_hours: 24,
                refresh_token_hours: 48,
                min_password_length: 6,
                activation_token_length: 50,
                enable_cors: true,
            },
            mail: MailConfig {
                sendgrid_api_key: None,
                sender_email: "no-reply@localhost".to_string(),
                sender_name: "Stash".to_string(),
                frontend_url: "http://localhost:3000".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                name: "stash_staging".to_string(),
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "stash-api".to_string(),
                access_token_hours: 24,
                refresh_token_hours: 48,
                min_password_length: 6,
                activation_token_length: 50,
                enable_cors: true,
            },
            mail: MailConfig {
                sendgrid_api_key: None,
                sender_email: "no-reply@staging.example.com".to_string(),
                sender_name: "Stash".to_string(),
                frontend_url: "https://staging.example.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                name: "stash".to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "stash-api".to_string(),
                access_token_hours: 24,
                refresh_token_hours: 48,
                min_password_length: 6,
                activation_token_length: 50,
                enable_cors: true,
            },
            mail: MailConfig {
                sendgrid_api_key: None,
                sender_email: "no-reply@example.com".to_string(),
                sender_name: "Stash".to_string(),
                frontend_url: "https://app.example.com".to_string(),
            },
        }
    }
}

// Global config - set once at startup by the binary
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Store the startup configuration. Later calls keep the first value.
pub fn init(config: AppConfig) -> &'static AppConfig {
    CONFIG.get_or_init(|| config)
}
