//! Authentication service
//!
//! Provides:
//! - User signup and signin
//! - Password hashing with bcrypt
//! - JWT access/refresh token issuance and validation
//! - The auth gate every protected operation resolves through
//!
//! Sign-out clears the stored refresh token but keeps no revocation list:
//! already-issued access tokens stay valid until their own expiry.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::db::{CreateUser, Database, UserRecord};
use crate::error::{is_unique_violation, ApiError, ApiResult};

/// Scope marker carried inside access tokens
pub const SCOPE_ACCESS: &str = "access";
/// Scope marker carried inside refresh tokens
pub const SCOPE_REFRESH: &str = "refresh";

const CREDENTIALS_ERROR: &str = "Could not validate credentials";

/// Claims shared by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's normalized email
    pub sub: String,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Intended use: "access" or "refresh"
    pub scope: String,
}

/// Token verification failures, distinguished so callers can report expiry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// Token pair returned after successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "bearer"
    pub token_type: String,
}

/// Fresh access token obtained through the refresh flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub token_type: String,
}

/// Signup input
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Result of a successful signup
#[derive(Debug, Clone, Serialize)]
pub struct SignupOutcome {
    pub user_id: i64,
    pub email: String,
    pub username: String,
}

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_lifetime: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_lifetime: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            access_token_lifetime: 15 * 60,
            refresh_token_lifetime: 7 * 24 * 60 * 60,
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self { db, config }
    }

    // ========================================================================
    // Signup / Signin / Signout
    // ========================================================================

    /// Register a new user; the email is normalized and must be unique
    pub async fn signup(&self, input: SignupInput) -> ApiResult<SignupOutcome> {
        let email = input.email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::Validation("Invalid email address".into()));
        }
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(ApiError::Validation("username is required".into()));
        }
        if input.password.is_empty() {
            return Err(ApiError::Validation("password is required".into()));
        }

        let users = self.db.users();
        if users.get_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("Email already registered".into()));
        }

        let password_hash = self.hash_password(&input.password)?;

        // The pre-check above races against concurrent signups; the UNIQUE
        // constraint on email is the actual arbiter
        let user_id = match users
            .create(CreateUser {
                email: email.clone(),
                username: username.clone(),
                password_hash,
            })
            .await
        {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err) => {
                return Err(ApiError::Conflict("Email already registered".into()));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id, "user registered");

        Ok(SignupOutcome {
            user_id,
            email,
            username,
        })
    }

    /// Look up a user by email and verify the password.
    ///
    /// Returns `None` both for an unknown email and for a wrong password, so
    /// the caller cannot distinguish the two cases.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<Option<UserRecord>> {
        let user = match self.db.users().get_by_email(email.trim()).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if self.verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Sign in: verify credentials, issue a token pair, and store the new
    /// refresh token on the user row (overwriting any prior one)
    pub async fn signin(&self, email: &str, password: &str) -> ApiResult<AuthTokens> {
        let user = self.authenticate(email, password).await?.ok_or_else(|| {
            tracing::debug!("signin rejected");
            ApiError::Unauthorized("Incorrect email or password".into())
        })?;

        let access_token = self.issue_access_token(&user.email)?;
        let refresh_token = self.issue_refresh_token(&user.email)?;

        self.db
            .users()
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Sign out: clear the stored refresh token
    pub async fn signout(&self, user: &UserRecord) -> ApiResult<()> {
        self.db.users().set_refresh_token(user.id, None).await?;
        Ok(())
    }

    // ========================================================================
    // Auth Gate
    // ========================================================================

    /// Resolve a bearer token to the authenticated user.
    ///
    /// Only access tokens pass; refresh tokens, tampered or expired tokens,
    /// and tokens for unknown users are all rejected as unauthorized.
    pub async fn resolve(&self, token: &str) -> ApiResult<UserRecord> {
        let claims = self
            .decode_token(token)
            .map_err(|err| ApiError::Unauthorized(err.to_string()))?;

        if claims.scope != SCOPE_ACCESS {
            return Err(ApiError::Unauthorized(CREDENTIALS_ERROR.into()));
        }

        self.db
            .users()
            .get_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_ERROR.into()))
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// The presented token must match the one stored on the user row; an
    /// overwritten or cleared token is no longer accepted.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshedToken> {
        let claims = self
            .decode_token(refresh_token)
            .map_err(|err| ApiError::Unauthorized(err.to_string()))?;

        if claims.scope != SCOPE_REFRESH {
            return Err(ApiError::Unauthorized(TokenError::Invalid.to_string()));
        }

        let user = self
            .db
            .users()
            .get_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(TokenError::Invalid.to_string()))?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(ApiError::Unauthorized(TokenError::Invalid.to_string()));
        }

        let access_token = self.issue_access_token(&user.email)?;
        Ok(RefreshedToken {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    // ========================================================================
    // Password Hashing
    // ========================================================================

    /// Hash a password with bcrypt
    pub fn hash_password(&self, password: &str) -> ApiResult<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, password_hash: &str) -> ApiResult<bool> {
        verify(password, password_hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to verify password: {e}")))
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Issue a short-lived access token for a subject
    pub fn issue_access_token(&self, subject: &str) -> ApiResult<String> {
        self.issue_token(subject, SCOPE_ACCESS, self.config.access_token_lifetime)
    }

    /// Issue a long-lived refresh token for a subject
    pub fn issue_refresh_token(&self, subject: &str) -> ApiResult<String> {
        self.issue_token(subject, SCOPE_REFRESH, self.config.refresh_token_lifetime)
    }

    fn issue_token(&self, subject: &str, scope: &str, lifetime: i64) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime)).timestamp(),
            scope: scope.to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))
    }

    /// Decode and validate a token's signature and expiry
    pub fn decode_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }
}
