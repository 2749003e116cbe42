use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub confirm_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub contacts_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL used in confirmation links sent by email.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            access_ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            confirm_ttl_seconds: std::env::var("JWT_CONFIRM_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(3600),
        };
        let mail = MailConfig {
            smtp_host: std::env::var("MAIL_SERVER")?,
            smtp_port: std::env::var("MAIL_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(465),
            username: std::env::var("MAIL_USERNAME")?,
            password: std::env::var("MAIL_PASSWORD")?,
            from_address: std::env::var("MAIL_FROM")?,
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Contactly".into()),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET")?,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        let rate_limit = RateLimitConfig {
            contacts_per_minute: std::env::var("CONTACTS_RATE_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            public_base_url,
            jwt,
            mail,
            storage,
            rate_limit,
        })
    }
}
