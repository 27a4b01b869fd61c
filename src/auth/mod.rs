//! Credential hashing, activation/reset tokens and JWT issuing.

pub mod hasher;
pub mod jwt;
pub mod token;

pub use hasher::{PasswordHasher, Sha256Hasher};
pub use jwt::{
    AccessClaims, Clock, JwtError, JwtService, JwtSettings, RefreshClaims, SystemClock, TokenPair,
};
pub use token::{compose_token, decompose_token, CompositeToken, TokenError, TokenGenerator};
