//! Configuration management

use chemequip_ingest::csv_parser::{DEFAULT_MAX_ROWS, DEFAULT_MAX_UPLOAD_BYTES};
use chemequip_ingest::{ParserConfig, RowErrorPolicy};
use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://chemequip.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Number of datasets kept per user; older ones are evicted on upload.
pub const DEFAULT_RETENTION_LIMIT: i64 = 5;

/// Lifetime of an issued session token (one week).
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub ingest: IngestConfig,
    pub auth: AuthConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Upload limits and the dataset retention cap
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IngestConfig {
    pub max_upload_bytes: usize,
    pub max_rows: usize,
    pub row_error_policy: RowErrorPolicy,
    pub retention_limit: i64,
}

impl IngestConfig {
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            max_upload_bytes: self.max_upload_bytes,
            max_rows: self.max_rows,
            row_error_policy: self.row_error_policy,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
            row_error_policy: RowErrorPolicy::default(),
            retention_limit: DEFAULT_RETENTION_LIMIT,
        }
    }
}

/// Session token settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let row_error_policy = match std::env::var("CHEMEQUIP_ROW_ERROR_POLICY") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("CHEMEQUIP_ROW_ERROR_POLICY: {}", e))?,
            Err(_) => RowErrorPolicy::default(),
        };

        let config = Config {
            server: ServerConfig {
                host: std::env::var("CHEMEQUIP_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("CHEMEQUIP_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "CHEMEQUIP_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
            ingest: IngestConfig {
                max_upload_bytes: env_or("CHEMEQUIP_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
                max_rows: env_or("CHEMEQUIP_MAX_ROWS", DEFAULT_MAX_ROWS),
                row_error_policy,
                retention_limit: env_or("CHEMEQUIP_RETENTION_LIMIT", DEFAULT_RETENTION_LIMIT),
            },
            auth: AuthConfig {
                token_ttl_hours: env_or("CHEMEQUIP_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.ingest.max_upload_bytes == 0 {
            anyhow::bail!("Upload size limit must be greater than 0");
        }

        if self.ingest.max_rows == 0 {
            anyhow::bail!("Row limit must be greater than 0");
        }

        if self.ingest.retention_limit < 1 {
            anyhow::bail!(
                "Retention limit must be at least 1, got {}",
                self.ingest.retention_limit
            );
        }

        if self.auth.token_ttl_hours < 1 {
            anyhow::bail!("Token TTL must be at least one hour");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
            ingest: IngestConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}
