use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub file_store_path: PathBuf,
    pub server_port: u16,
    pub jwt: JwtConfig,
}

const DEFAULT_EXPIRY_HOURS: i64 = 24;

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required; everything else has a default suitable for
    /// local development.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty, or if a numeric variable
    /// fails to parse. Called once at startup.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let issuer =
            std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tasklocker".to_string());

        let expiry_hours: i64 = std::env::var("JWT_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_HOURS.to_string())
            .parse()
            .expect("JWT_EXPIRY_HOURS must be a valid i64");

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://tasklocker.db".to_string());

        let file_store_path = std::env::var("FILE_STORE_PATH")
            .unwrap_or_else(|_| "file-store".to_string())
            .into();

        let server_port: u16 = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .expect("SERVER_PORT must be a valid port number");

        Self {
            database_url,
            file_store_path,
            server_port,
            jwt: JwtConfig {
                secret,
                issuer,
                expiry_hours,
            },
        }
    }
}
