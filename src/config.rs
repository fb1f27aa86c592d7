use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Demo account auto-provisioned on first login when enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub enabled: bool,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub demo: DemoConfig,
    pub enable_csv_export: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let demo = DemoConfig {
            enabled: std::env::var("DEMO_MODE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            email: std::env::var("DEMO_EMAIL").unwrap_or_else(|_| "demo@fintrack.local".into()),
            password: std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "demo1234".into()),
        };
        let enable_csv_export = std::env::var("ENABLE_CSV_EXPORT")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        Ok(Self {
            database_url,
            jwt,
            demo,
            enable_csv_export,
        })
    }
}
