use dotenvy::dotenv;
use std::env;

pub struct Config {
    pub database_url: String,
    pub cookie_secret: String,
    pub http_port: u16,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = match env::var("DATABASE_URL") {
            Ok(val) => val,
            Err(_) => "postgres://localhost/minute_empire".to_string(),
        };

        // Must be at least 64 bytes: it keys the signed session cookie.
        let cookie_secret = match env::var("MINUTE_EMPIRE_COOKIE_SECRET") {
            Ok(val) => val,
            Err(_) => panic!("You need to set env MINUTE_EMPIRE_COOKIE_SECRET"),
        };

        let http_port = match env::var("MINUTE_EMPIRE_HTTP_PORT") {
            Ok(val) => val.parse::<u16>().unwrap_or(8000),
            Err(_) => 8000,
        };

        let cors_origins = match env::var("MINUTE_EMPIRE_CORS_ORIGINS") {
            Ok(val) => val.split(',').map(|s| s.trim().to_string()).collect(),
            Err(_) => vec![
                "http://localhost:8080".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        };

        Self {
            database_url,
            cookie_secret,
            http_port,
            cors_origins,
        }
    }
}
