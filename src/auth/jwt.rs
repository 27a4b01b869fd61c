use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::SecurityConfig;

/// HMAC algorithms accepted on incoming tokens
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Source of "now" for issuing and expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Claims carried by an access token.
///
/// The address is serialized under `name`, so an access token never decodes into a
/// usable [`RefreshClaims`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: i64,
    #[serde(rename = "name")]
    pub email: String,
    #[serde(rename = "isActivated")]
    pub is_activated: bool,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(default)]
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Expiry accessor shared by both claim sets
pub trait Expiring {
    fn expires_at(&self) -> i64;
}

impl Expiring for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl Expiring for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("the jwt token was not provided")]
    NoTokenProvided,

    #[error("unsupported signing method: {0}")]
    InvalidSigningMethod(String),

    #[error("the jwt token has expired")]
    TokenExpired,

    #[error("invalid jwt token: {0}")]
    Invalid(String),

    #[error("jwt generation error: {0}")]
    TokenGeneration(String),

    #[error("invalid jwt secret")]
    InvalidSecret,

    #[error("invalid token lifetime: {0}")]
    InvalidLifetime(String),
}

/// Lifetimes and identity of the issuer
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "stash-api".to_string(),
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::hours(48),
        }
    }

    /// Fails on a non-positive or out-of-range lifetime
    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Ok(Self {
            secret: security.jwt_secret.clone(),
            issuer: security.jwt_issuer.clone(),
            access_ttl: lifetime("SECURITY_ACCESS_TOKEN_HOURS", security.access_token_hours)?,
            refresh_ttl: lifetime("SECURITY_REFRESH_TOKEN_HOURS", security.refresh_token_hours)?,
        })
    }
}

fn lifetime(key: &str, hours: i64) -> Result<Duration, JwtError> {
    if hours <= 0 {
        return Err(JwtError::InvalidLifetime(format!("{} must be positive, got {}", key, hours)));
    }
    Duration::try_hours(hours)
        .ok_or_else(|| JwtError::InvalidLifetime(format!("{} is out of range: {}", key, hours)))
}

/// Issues and validates HMAC-signed access/refresh tokens with one shared secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(settings: JwtSettings) -> Result<Self, JwtError> {
        if settings.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer,
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sign a fresh access (24h) and refresh (48h) token for the user
    pub fn issue_token_pair(
        &self,
        user_id: i64,
        email: &str,
        is_activated: bool,
    ) -> Result<TokenPair, JwtError> {
        let now = self.clock.now();

        let access = AccessClaims {
            id: user_id,
            email: email.to_string(),
            is_activated,
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        let refresh = RefreshClaims {
            email: email.to_string(),
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Validate an access token and return its claims
    pub fn validate(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.decode_claims(token)
    }

    /// Validate a refresh token. Only signature, algorithm and expiry are checked here;
    /// the caller decides what an empty email means.
    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.decode_claims(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    fn decode_claims<T>(&self, token: &str) -> Result<T, JwtError>
    where
        T: DeserializeOwned + Expiring,
    {
        let token = token.trim();
        if token.is_empty() {
            return Err(JwtError::NoTokenProvided);
        }

        let header = decode_header(token).map_err(|e| JwtError::Invalid(e.to_string()))?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(JwtError::InvalidSigningMethod(format!("{:?}", header.alg)));
        }

        // Expiry is checked below against the injected clock
        let mut validation = Validation::new(header.alg);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = decode::<T>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidAlgorithm => JwtError::InvalidSigningMethod(format!("{:?}", header.alg)),
            _ => JwtError::Invalid(e.to_string()),
        })?;

        if data.claims.expires_at() < self.clock.now().timestamp() {
            return Err(JwtError::TokenExpired);
        }

        Ok(data.claims)
    }
}
