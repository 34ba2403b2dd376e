//! Server configuration

use jsonwebtoken::Algorithm;

use crate::storage::S3Settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Bootstrap account created at startup when missing
#[derive(Debug, Clone)]
pub struct DefaultAccount {
    pub email: String,
    pub password: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    pub http_port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub s3: S3Settings,
    pub avatar_bucket: String,
    pub monitoring_host: String,
    pub monitoring_port: u16,
    pub health_check_interval_secs: u64,
    /// Upload ceiling in bytes
    pub max_upload_size: usize,
    pub admin: DefaultAccount,
    pub hr: DefaultAccount,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// `DATABASE_URL`, or assembled from the `POSTGRES_*` components
    fn database_url() -> Result<String, BoxError> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return Ok(url);
        }
        let user = std::env::var("POSTGRES_USER")
            .map_err(|_| "DATABASE_URL or POSTGRES_USER must be set")?;
        let password = env_or("POSTGRES_PASSWORD", "");
        let host = env_or("POSTGRES_HOST", "localhost");
        let port = env_or("POSTGRES_PORT", "5432");
        let db = env_or("POSTGRES_DB", "staffbook");
        Ok(format!("postgres://{user}:{password}@{host}:{port}/{db}"))
    }

    fn jwt_algorithm() -> Result<Algorithm, BoxError> {
        match env_or("JWT_ALGORITHM", "HS256").as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(format!("unsupported JWT_ALGORITHM: {other}").into()),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = env_or("ENVIRONMENT", "development");

        Ok(Self {
            http_port: env_parse("HTTP_PORT", 8000),
            database_url: Self::database_url()?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_algorithm: Self::jwt_algorithm()?,
            access_token_expire_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
            refresh_token_expire_days: env_parse("REFRESH_TOKEN_EXPIRE_DAYS", 7),
            s3: S3Settings {
                endpoint: env_or("S3_ENDPOINT", "http://localhost:9000"),
                access_key: env_or("S3_ACCESS_KEY", "minioadmin"),
                secret_key: Self::require_secret("S3_SECRET_KEY", &environment)?,
                region: env_or("S3_REGION", "us-east-1"),
                public_read: env_parse("S3_PUBLIC_READ", true),
            },
            avatar_bucket: env_or("S3_AVATAR_BUCKET", "avatars"),
            monitoring_host: env_or("MONITORING_HOST", "localhost"),
            monitoring_port: env_parse("MONITORING_PORT", 9090),
            health_check_interval_secs: env_parse("HEALTH_CHECK_INTERVAL_SECS", 30),
            max_upload_size: env_parse("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE),
            admin: DefaultAccount {
                email: env_or("ADMIN_DEFAULT_EMAIL", "admin@staffbook.local"),
                password: Self::require_secret("ADMIN_DEFAULT_PASSWORD", &environment)?,
            },
            hr: DefaultAccount {
                email: env_or("HR_DEFAULT_EMAIL", "hr@staffbook.local"),
                password: Self::require_secret("HR_DEFAULT_PASSWORD", &environment)?,
            },
            environment,
        })
    }

    /// Development settings with fixed secrets, used by tests
    pub fn for_tests() -> Self {
        Self {
            environment: "development".into(),
            http_port: 0,
            database_url: String::new(),
            db_max_connections: 1,
            jwt_secret: "test-secret-with-enough-length-for-hmac".into(),
            jwt_algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            s3: S3Settings {
                endpoint: "http://localhost:9000".into(),
                access_key: "test".into(),
                secret_key: "test".into(),
                region: "us-east-1".into(),
                public_read: false,
            },
            avatar_bucket: "avatars".into(),
            monitoring_host: "localhost".into(),
            monitoring_port: 9090,
            health_check_interval_secs: 30,
            max_upload_size: 1024 * 1024,
            admin: DefaultAccount {
                email: "admin@staffbook.local".into(),
                password: "admin-password".into(),
            },
            hr: DefaultAccount {
                email: "hr@staffbook.local".into(),
                password: "hr-password".into(),
            },
        }
    }
}
