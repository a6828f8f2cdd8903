use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub search_base_url: String,
    pub data_dir: PathBuf,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("APP_PORT must be a number"),
            environment: env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            ai_base_url: env::var("YEYSAI_BASE_URL")
                .unwrap_or_else(|_| "https://yeysai.com/v1".to_string()),
            ai_api_key: env::var("YEYSAI_API_KEY").ok(),
            ai_model: env::var("YEYSAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            search_base_url: env::var("SEARXNG_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8888".to_string()),
            data_dir: env::var("DQ_REPORT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "open-report-backend".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}
