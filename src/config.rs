use serde::Deserialize;

/// Deployment environment. Decides the cookie `Secure` flag and whether raw
/// error detail is returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" | "test" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// `None` when `JWT_SECRET` is unset or empty; login then fails with a
    /// configuration error instead of refusing to start.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub env: AppEnv,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let env = std::env::var("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "quillpost".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "quillpost-users".into()),
        };
        let endpoint = std::env::var("MINIO_ENDPOINT")?;
        let storage = StorageConfig {
            public_url: std::env::var("MINIO_PUBLIC_URL").unwrap_or_else(|_| endpoint.clone()),
            endpoint,
            bucket: std::env::var("MINIO_BUCKET")?,
            access_key: std::env::var("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        Ok(Self {
            database_url,
            env,
            jwt,
            storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AppEnv;

    #[test]
    fn local_names_map_to_development() {
        for v in ["development", "dev", "local", "test", " Dev "] {
            assert_eq!(AppEnv::parse(v), AppEnv::Development, "{v}");
        }
    }

    #[test]
    fn anything_else_is_production() {
        for v in ["production", "prod", "staging", ""] {
            assert!(AppEnv::parse(v).is_production(), "{v}");
        }
    }
}
