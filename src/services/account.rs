use email_address::EmailAddress;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::{compose_token, decompose_token, JwtError, JwtService, PasswordHasher, TokenError, TokenGenerator, TokenPair};
use crate::config::{MailConfig, SecurityConfig};
use crate::database::{DatabaseError, NewUser, UserStore};
use crate::mail::{MailError, Mailer};

const ACTIVATION_SUBJECT: &str = "Activate your account";
const RESET_SUBJECT: &str = "Reset your password";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("the email is not valid")]
    InvalidEmail,

    #[error("the password is too short, it needs at least {0} characters")]
    PasswordTooShort(usize),

    #[error("the email already exists in the database")]
    UserAlreadyExists,

    #[error("no user with email {0}")]
    UserNotFound(String),

    #[error("account is not activated")]
    AccountNotActivated,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    MalformedToken(#[from] TokenError),

    #[error("invalid activation token")]
    InvalidActivationToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("could not send email: {0}")]
    Mail(#[from] MailError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Knobs of the account workflow
#[derive(Debug, Clone)]
pub struct AccountPolicy {
    pub min_password_length: usize,
    /// Base URL the activation and reset links point at
    pub frontend_url: String,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AccountPolicy {
    pub fn from_config(security: &SecurityConfig, mail: &MailConfig) -> Self {
        Self {
            min_password_length: security.min_password_length,
            frontend_url: mail.frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: i64,
    pub is_admin: bool,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub user_id: i64,
    pub tokens: TokenPair,
}

/// Registration, activation, login, password reset and token refresh.
///
/// Every collaborator is injected, so the same workflow runs against Postgres and SendGrid
/// in the binary and against in-memory doubles in tests.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtService>,
    tokens: TokenGenerator,
    policy: AccountPolicy,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtService>,
        tokens: TokenGenerator,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            users,
            mailer,
            hasher,
            jwt,
            tokens,
            policy,
        }
    }

    /// Create a pending account and mail its activation link. Returns the new user id.
    ///
    /// The account only survives if the mailer accepted the activation email; otherwise
    /// the row is deleted again and the mail error is returned.
    pub async fn register(&self, email: &str, password: &str) -> Result<i64, AccountError> {
        validate_email(email)?;
        self.validate_password(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AccountError::UserAlreadyExists);
        }

        let raw_token = self.tokens.generate_raw_token();
        let user = self
            .users
            .create(NewUser {
                email: email.to_string(),
                pass_hash: self.hasher.hash(password),
                activation_token: raw_token.clone(),
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => AccountError::UserAlreadyExists,
                other => AccountError::Database(other),
            })?;

        let composite = compose_token(user.id, &raw_token);
        let link = format!("{}/activate/{}", self.policy.frontend_url, composite);
        let html = format!(
            "<p>Open the link below to activate your account:</p><p><a href=\"{link}\">{link}</a></p>"
        );

        if let Err(e) = self
            .mailer
            .send_email(&[user.email.clone()], ACTIVATION_SUBJECT, &composite, &html)
            .await
        {
            error!(user_id = user.id, "Activation email for {} failed: {}", user.email, e);
            if let Err(del) = self.users.delete_by_email(&user.email).await {
                error!(user_id = user.id, "Could not remove user {} after the activation email failed: {}", user.email, del);
            }
            return Err(AccountError::Mail(e));
        }

        info!(user_id = user.id, "Registered {}, activation pending", user.email);
        Ok(user.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AccountError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !user.is_activated {
            return Err(AccountError::AccountNotActivated);
        }

        if !self.hasher.verify(password, &user.pass_hash) {
            warn!(user_id = user.id, "Failed login for {}", user.email);
            return Err(AccountError::InvalidCredentials);
        }

        let tokens = self.jwt.issue_token_pair(user.id, &user.email, user.is_activated)?;
        info!(user_id = user.id, "User {} logged in", user.email);

        Ok(LoginOutcome {
            user_id: user.id,
            is_admin: user.is_admin,
            tokens,
        })
    }

    /// Consume an activation token. The stored token is rotated in the same update, so a
    /// second attempt with the same link fails.
    pub async fn activate(&self, composite: &str) -> Result<i64, AccountError> {
        let (user_id, raw_token) = decompose_token(composite)?;

        let next_token = self.tokens.generate_raw_token();
        if !self.users.activate(user_id, &raw_token, &next_token).await? {
            warn!(user_id, "Rejected activation with a stale or unknown token");
            return Err(AccountError::InvalidActivationToken);
        }

        info!(user_id, "Activated account");
        Ok(user_id)
    }

    /// Issue a new token for the account and mail a reset link.
    ///
    /// The new token replaces whatever was stored, including a pending activation token.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(email.to_string()))?;

        let raw_token = self.tokens.generate_raw_token();
        self.users.replace_token(user.id, &raw_token).await?;

        let composite = compose_token(user.id, &raw_token);
        let link = format!("{}/renew-password/{}", self.policy.frontend_url, composite);
        let html = format!(
            "<p>Open the link below to choose a new password:</p><p><a href=\"{link}\">{link}</a></p>"
        );

        self.mailer
            .send_email(&[user.email.clone()], RESET_SUBJECT, &composite, &html)
            .await
            .map_err(|e| {
                error!(user_id = user.id, "Password reset email failed: {}", e);
                AccountError::Mail(e)
            })?;

        info!(user_id = user.id, "Password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, composite: &str, new_password: &str) -> Result<i64, AccountError> {
        let (user_id, raw_token) = decompose_token(composite)?;
        self.validate_password(new_password)?;

        let pass_hash = self.hasher.hash(new_password);
        let next_token = self.tokens.generate_raw_token();
        if !self
            .users
            .reset_password(user_id, &raw_token, &pass_hash, &next_token)
            .await?
        {
            warn!(user_id, "Rejected password reset with a stale or unknown token");
            return Err(AccountError::InvalidToken);
        }

        info!(user_id, "Password was changed");
        Ok(user_id)
    }

    /// Mint a new pair from a refresh token. Refresh tokens are not tracked, so any
    /// unexpired one for an activated account works.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshOutcome, AccountError> {
        let claims = self
            .jwt
            .validate_refresh(refresh_token)
            .map_err(|e| AccountError::InvalidRefreshToken(e.to_string()))?;

        if claims.email.is_empty() {
            return Err(AccountError::InvalidRefreshToken("no email claim".to_string()));
        }

        let user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| AccountError::UserNotFound(claims.email.clone()))?;

        if !user.is_activated {
            return Err(AccountError::AccountNotActivated);
        }

        let tokens = self.jwt.issue_token_pair(user.id, &user.email, user.is_activated)?;
        info!(user_id = user.id, "Refreshed tokens");

        Ok(RefreshOutcome {
            user_id: user.id,
            tokens,
        })
    }

    fn validate_password(&self, password: &str) -> Result<(), AccountError> {
        if password.chars().count() < self.policy.min_password_length {
            return Err(AccountError::PasswordTooShort(self.policy.min_password_length));
        }
        Ok(())
    }
}

/// Syntactic check of an addr-spec. A dot in the domain is not required; display names
/// (`Bob <bob@example.com>`) are rejected.
pub fn validate_email(email: &str) -> Result<(), AccountError> {
    match email.parse::<EmailAddress>() {
        Ok(address) if address.email() == email => Ok(()),
        _ => Err(AccountError::InvalidEmail),
    }
}
