use crate::{
    auth::db::{
        revoked_token_exists, revoked_token_insert, revoked_token_purge, user_insert,
        user_select, user_select_by_email, user_update_password,
    },
    util::{unprocessable, MessageResponse},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, DecodingKey, EncodingKey, Header, Validation,
};
use poem::{error::InternalServerError, http::StatusCode, Request};
use poem_openapi::{auth::Bearer, Object, SecurityScheme};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;
use validator::Validate;

const ISSUER: &str = "api_backend";
const THIRTY_MINUTES: u64 = 60 * 30;
const ONE_WEEK: u64 = 60 * 60 * 24 * 7;

// Tests only need a cheap hash.
const HASH_COST: u32 = if cfg!(test) { 4 } else { DEFAULT_COST };

/// User as stored in the database
#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub is_active: bool,
}

/// Schema for user registration
#[derive(Debug, Deserialize, Object, Serialize, Validate)]
pub struct UserCreate {
    /// User's email address
    #[validate(email)]
    pub email: String,
    /// Unique username for the account
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Password (minimum 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

/// Schema for user login, sent as form data
#[derive(Debug, Deserialize, Object, Serialize)]
pub struct UserLogin {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// Schema for user information in responses
#[derive(Debug, Object, PartialEq)]
pub struct UserResponse {
    /// Unique user identifier
    pub id: i64,
    /// User's email address
    pub email: String,
    /// Username
    pub username: String,
    /// Whether the user account is active
    pub is_active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
        }
    }
}

/// Schema for authentication token response
#[derive(Debug, Object)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,
    /// JWT refresh token for obtaining new access tokens
    pub refresh_token: String,
    /// Token type (always 'bearer')
    pub token_type: String,
}

/// Schema for refreshing access token
#[derive(Debug, Deserialize, Object, Serialize)]
pub struct TokenRefresh {
    /// The refresh token obtained from login
    pub refresh_token: String,
}

/// Schema for changing user password
#[derive(Debug, Deserialize, Object, Serialize, Validate)]
pub struct PasswordChange {
    /// Current password for verification
    pub current_password: String,
    /// New password (minimum 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

/// Token lifetimes in seconds
#[derive(Clone, Debug, PartialEq)]
pub struct TokenConfig {
    pub access_ttl: u64,
    pub refresh_ttl: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        TokenConfig {
            access_ttl: THIRTY_MINUTES,
            refresh_ttl: ONE_WEEK,
        }
    }
}

/// What a token may be used for
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claim for JWT
#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
    pub jti: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, HASH_COST)
}

/// Check a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

/// Create a new JWT
pub fn make_jwt(
    username: &str,
    kind: TokenKind,
    ttl: u64,
    encoding_key: &EncodingKey,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = get_current_timestamp();

    // Claims for the JWT
    let claim = Claim {
        sub: username.to_string(),
        iat: now,
        exp: now.saturating_add(ttl),
        iss: ISSUER.to_string(),
        jti: Uuid::new_v4().to_string(),
        kind,
    };

    // Generate the JWT
    encode(&Header::default(), &claim, encoding_key)
}

/// Pull the claim out of a JWT, if it is signed by us and still fresh
pub fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Option<Claim> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    decode::<Claim>(token, decoding_key, &validation)
        .ok()
        .map(|token_data| token_data.claims)
}

/// Mint a fresh access and refresh token for a user
pub fn make_token_pair(
    username: &str,
    encoding_key: &EncodingKey,
    token_config: &TokenConfig,
) -> Result<TokenResponse, poem::Error> {
    let access_token = make_jwt(
        username,
        TokenKind::Access,
        token_config.access_ttl,
        encoding_key,
    )
    .map_err(InternalServerError)?;

    let refresh_token = make_jwt(
        username,
        TokenKind::Refresh,
        token_config.refresh_ttl,
        encoding_key,
    )
    .map_err(InternalServerError)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
    })
}

/// Map a failed user insert. A unique clash means someone else took the name or email first.
fn user_conflict(err: sqlx::Error) -> poem::Error {
    match err {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            let detail = if err.message().contains("app_user.email") {
                "Email already registered"
            } else {
                "Username already registered"
            };

            poem::Error::from_string(detail, StatusCode::BAD_REQUEST)
        }
        err => InternalServerError(err),
    }
}

/// Map a failed revocation insert. A unique clash means a concurrent refresh spent the token first.
fn spent_token_conflict(err: sqlx::Error) -> poem::Error {
    match err {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            poem::Error::from_string("Invalid refresh token", StatusCode::UNAUTHORIZED)
        }
        err => InternalServerError(err),
    }
}

/// Register a new user
pub async fn user_register(
    tx: &mut Transaction<'_, Sqlite>,
    user_param: &UserCreate,
) -> Result<UserResponse, poem::Error> {
    // Make sure the payload we got is good (check with Validate package).
    user_param.validate().map_err(unprocessable)?;

    // Username has to be free
    match user_select(tx, &user_param.username).await {
        Ok(_) => Err(poem::Error::from_string(
            "Username already registered",
            StatusCode::BAD_REQUEST,
        )),
        Err(sqlx::Error::RowNotFound) => Ok(()),
        Err(err) => Err(InternalServerError(err)),
    }?;

    // Email has to be free
    match user_select_by_email(tx, &user_param.email).await {
        Ok(_) => Err(poem::Error::from_string(
            "Email already registered",
            StatusCode::BAD_REQUEST,
        )),
        Err(sqlx::Error::RowNotFound) => Ok(()),
        Err(err) => Err(InternalServerError(err)),
    }?;

    let hashed_password = hash_password(&user_param.password).map_err(InternalServerError)?;

    // Add new user
    let user = user_insert(
        tx,
        &user_param.email,
        &user_param.username,
        &hashed_password,
    )
    .await
    .map_err(user_conflict)?;

    tracing::info!(username = %user.username, "registered user");

    Ok(UserResponse::from(&user))
}

/// Check credentials and hand out tokens
pub async fn user_login(
    tx: &mut Transaction<'_, Sqlite>,
    login_param: &UserLogin,
    encoding_key: &EncodingKey,
    token_config: &TokenConfig,
) -> Result<TokenResponse, poem::Error> {
    let bad_credentials = || {
        poem::Error::from_string("Incorrect username or password", StatusCode::UNAUTHORIZED)
    };

    // Pull user
    let user = match user_select(tx, &login_param.username).await {
        Ok(user) => Ok(user),
        Err(sqlx::Error::RowNotFound) => Err(bad_credentials()),
        Err(err) => Err(InternalServerError(err)),
    }?;

    // Verify password to hash
    if !verify_password(&login_param.password, &user.hashed_password) {
        tracing::warn!(username = %login_param.username, "failed login");
        return Err(bad_credentials());
    }

    if !user.is_active {
        return Err(poem::Error::from_string(
            "Inactive user",
            StatusCode::BAD_REQUEST,
        ));
    }

    make_token_pair(&user.username, encoding_key, token_config)
}

/// Trade a refresh token for a new token pair. The presented refresh token is spent.
pub async fn token_refresh(
    tx: &mut Transaction<'_, Sqlite>,
    token_param: &TokenRefresh,
    encoding_key: &EncodingKey,
    decoding_key: &DecodingKey,
    token_config: &TokenConfig,
) -> Result<TokenResponse, poem::Error> {
    let invalid_token =
        || poem::Error::from_string("Invalid refresh token", StatusCode::UNAUTHORIZED);

    // Pull jwt data
    let claim = decode_jwt(&token_param.refresh_token, decoding_key)
        .filter(|claim| claim.kind == TokenKind::Refresh)
        .ok_or_else(invalid_token)?;

    // Spent refresh tokens may not be replayed
    let revoked = revoked_token_exists(tx, &claim.jti)
        .await
        .map_err(InternalServerError)?;

    if revoked {
        return Err(invalid_token());
    }

    // Make sure the user in the token is still valid.
    let user = match user_select(tx, &claim.sub).await {
        Ok(user) => Ok(user),
        Err(sqlx::Error::RowNotFound) => Err(poem::Error::from_string(
            "User not found",
            StatusCode::UNAUTHORIZED,
        )),
        Err(err) => Err(InternalServerError(err)),
    }?;

    // Spend the old refresh token
    let now = i64::try_from(get_current_timestamp()).map_err(InternalServerError)?;
    let expires_at = i64::try_from(claim.exp).map_err(InternalServerError)?;

    revoked_token_purge(tx, now)
        .await
        .map_err(InternalServerError)?;

    revoked_token_insert(tx, &claim.jti, expires_at)
        .await
        .map_err(spent_token_conflict)?;

    make_token_pair(&user.username, encoding_key, token_config)
}

/// Change the password of a signed in user
pub async fn password_change(
    tx: &mut Transaction<'_, Sqlite>,
    user: &User,
    password_param: &PasswordChange,
) -> Result<MessageResponse, poem::Error> {
    // Make sure the payload we got is good (check with Validate package).
    password_param.validate().map_err(unprocessable)?;

    if !verify_password(&password_param.current_password, &user.hashed_password) {
        return Err(poem::Error::from_string(
            "Incorrect current password",
            StatusCode::BAD_REQUEST,
        ));
    }

    let hashed_password =
        hash_password(&password_param.new_password).map_err(InternalServerError)?;

    user_update_password(tx, &user.username, &hashed_password)
        .await
        .map_err(InternalServerError)?;

    Ok(MessageResponse::new("Password updated successfully"))
}

/// Trait for our auth methods
pub trait Auth {
    /// All auth methods need to be able to return the signed in user
    fn user(&self) -> &User;
}

/// Bearer Authentication with an access token
#[derive(SecurityScheme)]
#[oai(ty = "bearer", bearer_format = "JWT", checker = "access_token_checker")]
pub struct BearerAuth(User);

impl Auth for BearerAuth {
    /// Return user in BearerAuth
    fn user(&self) -> &User {
        &self.0
    }
}

/// How BearerAuth validates a token
async fn access_token_checker(req: &Request, bearer: Bearer) -> Option<User> {
    // Pull decoding key
    let decoding_key = req.data::<DecodingKey>()?;

    // Pull jwt data, refresh tokens do not grant access
    let claim = decode_jwt(&bearer.token, decoding_key)?;
    if claim.kind != TokenKind::Access {
        return None;
    }

    // Make sure the user in the token still exists.
    let pool = req.data::<SqlitePool>()?;
    let mut tx = pool.begin().await.ok()?;

    user_select(&mut tx, &claim.sub).await.ok()
}
