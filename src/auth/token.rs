use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Separator between the user id and the raw token in the composite form
pub const SEPARATOR: char = '_';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: expected 2 parts separated by '_', found {0}")]
    WrongPartCount(usize),

    #[error("malformed token: user id '{0}' is not an integer")]
    InvalidUserId(String),
}

/// Generates the single-use activation / password-reset tokens stored on a user row.
///
/// The random source is owned by the generator so callers (and tests) decide how it is
/// seeded.
pub struct TokenGenerator {
    length: usize,
    rng: Mutex<StdRng>,
}

impl TokenGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for reproducible tests
    pub fn seeded(length: usize, seed: u64) -> Self {
        Self {
            length,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Fixed-length string drawn uniformly from `[A-Za-z0-9]`
    pub fn generate_raw_token(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

impl fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGenerator").field("length", &self.length).finish()
    }
}

/// `<user id>_<raw token>`, the form sent to clients in activation and reset links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeToken {
    pub user_id: i64,
    pub raw: String,
}

impl CompositeToken {
    pub fn new(user_id: i64, raw: impl Into<String>) -> Self {
        Self {
            user_id,
            raw: raw.into(),
        }
    }
}

impl fmt::Display for CompositeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.user_id, SEPARATOR, self.raw)
    }
}

impl FromStr for CompositeToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(TokenError::WrongPartCount(parts.len()));
        }

        let user_id = parts[0]
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidUserId(parts[0].to_string()))?;

        Ok(Self::new(user_id, parts[1]))
    }
}

pub fn compose_token(user_id: i64, raw_token: &str) -> String {
    CompositeToken::new(user_id, raw_token).to_string()
}

pub fn decompose_token(composite: &str) -> Result<(i64, String), TokenError> {
    let token: CompositeToken = composite.parse()?;
    Ok((token.user_id, token.raw))
}
