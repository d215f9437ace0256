use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub database_idle_timeout: u64,
    pub server_host: String,
    pub server_port: u16,
    pub rust_log: String,
    pub app_env: String,
    pub jwt_secret: String,
    /// Admin distribution list, injected into the notification dispatcher
    /// at construction.
    pub admin_emails: Vec<String>,
    pub mail_from: String,
    pub smtp_relay: String,
    pub smtp_user: String,
    pub smtp_password: String,
    pub document_store_dir: String,
}

impl Config {
    pub fn init() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .expect("SERVER_PORT must be a valid number");
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        // Comma-separated list; empty means nobody gets admin notifications.
        let admin_emails = env::var("ADMIN_EMAILS")
            .unwrap_or_else(|_| "".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@coursehub.dev".to_string());
        let smtp_relay = env::var("SMTP_RELAY").unwrap_or_else(|_| "".to_string());
        let smtp_user = env::var("SMTP_USER").unwrap_or_else(|_| "".to_string());
        let smtp_password = env::var("SMTP_PASSWORD").unwrap_or_else(|_| "".to_string());

        let document_store_dir =
            env::var("DOCUMENT_STORE_DIR").unwrap_or_else(|_| "./uploads".to_string());

        Self {
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<u32>()
                .expect("DATABASE_MAX_CONNECTIONS must be a valid number"),
            database_min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u32>()
                .expect("DATABASE_MIN_CONNECTIONS must be a valid number"),
            database_connect_timeout: env::var("DATABASE_CONNECT_TIMEOUT")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u64>()
                .expect("DATABASE_CONNECT_TIMEOUT must be a valid number"),
            database_idle_timeout: env::var("DATABASE_IDLE_TIMEOUT")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u64>()
                .expect("DATABASE_IDLE_TIMEOUT must be a valid number"),
            server_host,
            server_port,
            rust_log,
            app_env,
            jwt_secret,
            admin_emails,
            mail_from,
            smtp_relay,
            smtp_user,
            smtp_password,
            document_store_dir,
        }
    }
}
