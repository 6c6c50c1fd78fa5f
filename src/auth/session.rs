use std::time::Duration;

use axum::http::{header::InvalidHeaderValue, HeaderValue};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::{AppEnv, JwtConfig};
use crate::error::{ApiError, LOGIN_FAILED};

pub const SESSION_COOKIE_NAME: &str = "token";

/// Validity of a session token and its cookie.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Mints and checks session tokens, and builds the cookies that carry them.
#[derive(Clone)]
pub struct SessionIssuer {
    keys: Option<Keys>,
    issuer: String,
    audience: String,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionIssuer {
    pub fn new(cfg: &JwtConfig, env: AppEnv) -> Self {
        let keys = cfg.secret.as_ref().map(|secret| Keys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        });
        Self {
            keys,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: SESSION_TTL,
            secure_cookie: env.is_production(),
        }
    }

    fn keys(&self) -> Result<&Keys, ApiError> {
        self.keys
            .as_ref()
            .ok_or(ApiError::Configuration("JWT_SECRET is not set"))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
        let keys = self.keys()?;
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| ApiError::upstream(LOGIN_FAILED, e))?;
        debug!(user_id = %user_id, exp = claims.exp, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let keys = self.keys()?;
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
            debug!(error = %e, "session token rejected");
            ApiError::Unauthorized
        })?;
        Ok(data.claims)
    }

    /// `HttpOnly` cookie carrying the token for the whole validity window.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.as_secs()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Empty, already expired cookie that overwrites the session on the client.
    pub fn clear_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}
